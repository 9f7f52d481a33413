//! Import and export
//!
//! Three file formats leave or enter the store:
//!
//! - CSV export (UTF-8 with BOM so spreadsheet apps detect the encoding)
//! - JSON backup (the whole collection, pretty-printed)
//! - restore from a backup, after a shape check

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

use crate::models::{DayRecord, EntryField, DATE_FORMAT};

/// Byte order mark prepended to CSV exports
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header of the date column
const DATE_HEADER: &str = "面談日";

/// Errors from export and restore
#[derive(Error, Debug)]
pub enum TransferError {
    /// Nothing in the store
    #[error("There are no records to export")]
    NothingToExport,

    /// Backup text is not JSON
    #[error("Backup file could not be read as JSON: {0}")]
    Unparsable(#[from] serde_json::Error),

    /// Backup JSON does not have the expected shape
    #[error("Invalid backup file: {0}")]
    InvalidBackup(String),

    /// Backup file could not be opened
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type TransferResult<T> = Result<T, TransferError>;

/// Render the collection as CSV bytes
///
/// One row per entry, rows joined by `\n` with no trailing newline.
pub fn export_csv(days: &[DayRecord]) -> TransferResult<Vec<u8>> {
    if days.is_empty() {
        return Err(TransferError::NothingToExport);
    }

    let mut rows = Vec::with_capacity(1 + days.len());

    let header: Vec<&str> = std::iter::once(DATE_HEADER)
        .chain(EntryField::ALL.iter().map(|f| f.label()))
        .collect();
    rows.push(header.join(","));

    for day in days {
        for entry in &day.records {
            let cells: Vec<String> = std::iter::once(day.date.as_str())
                .chain(EntryField::ALL.iter().map(|f| entry.field(*f)))
                .map(escape_cell)
                .collect();
            rows.push(cells.join(","));
        }
    }

    let mut bytes = UTF8_BOM.to_vec();
    bytes.extend_from_slice(rows.join("\n").as_bytes());
    Ok(bytes)
}

/// Quote a cell if it contains a separator, quote or newline
fn escape_cell(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Serialize the whole collection as a pretty-printed backup
pub fn export_backup(days: &[DayRecord]) -> TransferResult<String> {
    if days.is_empty() {
        return Err(TransferError::NothingToExport);
    }
    Ok(serde_json::to_string_pretty(days)?)
}

/// Parse and shape-check backup text
///
/// The top level must be an array; every element must be an object with a
/// `date` member and an array-valued `records` member.
pub fn parse_backup(text: &str) -> TransferResult<Vec<DayRecord>> {
    let value: Value = serde_json::from_str(text)?;

    let Value::Array(items) = &value else {
        return Err(TransferError::InvalidBackup(
            "top level must be an array".to_string(),
        ));
    };

    for (index, item) in items.iter().enumerate() {
        let Value::Object(map) = item else {
            return Err(TransferError::InvalidBackup(format!(
                "element {} is not an object",
                index
            )));
        };
        if !map.contains_key("date") {
            return Err(TransferError::InvalidBackup(format!(
                "element {} has no date",
                index
            )));
        }
        if !map.get("records").is_some_and(Value::is_array) {
            return Err(TransferError::InvalidBackup(format!(
                "element {} has no records array",
                index
            )));
        }
    }

    serde_json::from_value(value).map_err(|e| TransferError::InvalidBackup(e.to_string()))
}

/// A validated backup awaiting confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct RestorePlan {
    pub days: Vec<DayRecord>,
}

impl RestorePlan {
    /// Parse backup text into a plan
    pub fn from_text(text: &str) -> TransferResult<Self> {
        Ok(Self {
            days: parse_backup(text)?,
        })
    }

    /// Read and parse a backup file
    pub fn from_file(path: &Path) -> TransferResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| TransferError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text)
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn entry_count(&self) -> usize {
        self.days.iter().map(|d| d.records.len()).sum()
    }

    /// Days that carry no entries; they are restored as-is
    pub fn empty_day_count(&self) -> usize {
        self.days.iter().filter(|d| d.records.is_empty()).count()
    }

    /// Consume the plan, yielding the collection to install
    pub fn into_days(self) -> Vec<DayRecord> {
        self.days
    }
}

/// File name for a CSV export made on `today`
pub fn csv_file_name(prefix: &str, today: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, today.format(DATE_FORMAT))
}

/// File name for a backup made on `today`
pub fn backup_file_name(prefix: &str, today: NaiveDate) -> String {
    format!("{}_{}.txt", prefix, today.format(DATE_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entry, EntryOptions};

    fn entry(name: &str, content: &str) -> Entry {
        Entry::with_fields(&EntryOptions::default(), name, content)
    }

    fn csv_text(bytes: &[u8]) -> &str {
        std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap()
    }

    #[test]
    fn test_export_csv_empty() {
        assert!(matches!(export_csv(&[]), Err(TransferError::NothingToExport)));
    }

    #[test]
    fn test_export_csv_layout() {
        let mut alice = entry("Alice", "hello");
        alice.student_grade = "2".to_string();
        alice.student_department = "工学部".to_string();
        alice.category = "学生生活".to_string();
        let days = vec![DayRecord::new("2025-06-15", vec![alice])];

        let bytes = export_csv(&days).unwrap();

        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(
            csv_text(&bytes),
            "面談日,氏名,学年,学生所属,面談カテゴリー,本文\n\
             2025-06-15,Alice,2,工学部,学生生活,hello"
        );
    }

    #[test]
    fn test_export_csv_escapes_cells() {
        let days = vec![DayRecord::new(
            "2025-06-15",
            vec![entry("Alice", "He said \"hi\", then left\nsecond line")],
        )];

        let bytes = export_csv(&days).unwrap();
        let text = csv_text(&bytes);

        assert!(text.ends_with("\"He said \"\"hi\"\", then left\nsecond line\""));
    }

    #[test]
    fn test_export_csv_one_row_per_entry() {
        let days = vec![
            DayRecord::new("2025-06-14", vec![entry("A", "a"), entry("B", "b")]),
            DayRecord::new("2025-06-15", vec![entry("C", "c")]),
        ];

        let bytes = export_csv(&days).unwrap();
        let text = csv_text(&bytes);

        assert_eq!(text.lines().count(), 4);
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_export_csv_parses_back() {
        let tricky = "line one\nline \"two\", with comma";
        let days = vec![
            DayRecord::new("2025-06-14", vec![entry("Alice, Jr.", tricky)]),
            DayRecord::new("2025-06-15", vec![entry("Bob", "plain")]),
        ];

        let bytes = export_csv(&days).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(&bytes[UTF8_BOM.len()..]);

        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 6);
        assert_eq!(&headers[0], "面談日");
        assert_eq!(&headers[5], "本文");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "2025-06-14");
        assert_eq!(&rows[0][1], "Alice, Jr.");
        assert_eq!(&rows[0][5], tricky);
        assert_eq!(&rows[1][1], "Bob");
    }

    #[test]
    fn test_export_backup_round_trip() {
        let days = vec![
            DayRecord::new("2025-06-14", vec![entry("Alice", "a")]),
            DayRecord::new("2025-06-15", vec![entry("Bob", "b"), entry("Carol", "c")]),
        ];

        let text = export_backup(&days).unwrap();

        assert!(text.contains("\n  {"));
        assert_eq!(parse_backup(&text).unwrap(), days);
    }

    #[test]
    fn test_export_backup_empty() {
        assert!(matches!(
            export_backup(&[]),
            Err(TransferError::NothingToExport)
        ));
    }

    #[test]
    fn test_parse_backup_rejects_non_json() {
        assert!(matches!(
            parse_backup("definitely not json"),
            Err(TransferError::Unparsable(_))
        ));
    }

    #[test]
    fn test_parse_backup_rejects_bad_shapes() {
        for bad in [
            r#"{"date": "2025-01-01", "records": []}"#,
            r#"[{"date": "2025-01-01"}]"#,
            r#"[{"records": []}]"#,
            r#"[{"date": "2025-01-01", "records": "none"}]"#,
            r#"[42]"#,
        ] {
            assert!(
                matches!(parse_backup(bad), Err(TransferError::InvalidBackup(_))),
                "input: {}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_backup_accepts_empty_array() {
        assert!(parse_backup("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_backup_accepts_loosely_typed_fields() {
        let days = parse_backup(
            r#"[{"date": 20250101, "records": [
                {"id": "a", "studentName": "Alice", "studentGrade": 2, "category": null, "content": "x"}
            ]}]"#,
        )
        .unwrap();

        assert_eq!(days[0].date, "20250101");
        assert_eq!(days[0].records[0].student_grade, "2");
        assert!(days[0].records[0].category.is_empty());
    }

    #[test]
    fn test_restore_keeps_days_without_entries() {
        let plan = RestorePlan::from_text(r#"[{"date":"2025-01-01","records":[]}]"#).unwrap();

        assert_eq!(plan.day_count(), 1);
        assert_eq!(plan.entry_count(), 0);
        assert_eq!(plan.empty_day_count(), 1);
        assert_eq!(plan.into_days()[0].date, "2025-01-01");
    }

    #[test]
    fn test_restore_plan_counts() {
        let text = export_backup(&[
            DayRecord::new("2025-06-14", vec![entry("Alice", "a")]),
            DayRecord::new("2025-06-15", vec![entry("Bob", "b"), entry("Carol", "c")]),
        ])
        .unwrap();

        let plan = RestorePlan::from_text(&text).unwrap();
        assert_eq!(plan.day_count(), 2);
        assert_eq!(plan.entry_count(), 3);
        assert_eq!(plan.empty_day_count(), 0);
    }

    #[test]
    fn test_restore_plan_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("backup.txt");
        std::fs::write(&path, r#"[{"date":"2025-06-15","records":[{"studentName":"A"}]}]"#)
            .unwrap();

        let plan = RestorePlan::from_file(&path).unwrap();
        assert_eq!(plan.days[0].records[0].student_name, "A");

        let missing = RestorePlan::from_file(&temp_dir.path().join("missing.txt"));
        assert!(matches!(missing, Err(TransferError::Io { .. })));
    }

    #[test]
    fn test_file_names() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
        assert_eq!(
            csv_file_name("mendan_kiroku", today),
            "mendan_kiroku_2025-06-05.csv"
        );
        assert_eq!(
            backup_file_name("面談記録バックアップ", today),
            "面談記録バックアップ_2025-06-05.txt"
        );
    }
}
