//! Data models for mendan
//!
//! Defines the core data structures: `Entry` (one interview record) and
//! `DayRecord` (all entries attached to one calendar date).
//!
//! The serialized shape uses camelCase keys so backup files stay readable
//! by every version of the application:
//!
//! ```text
//! [{"date": "2025-06-15", "records": [{"id": "...", "studentName": "...", ...}]}]
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Date key format used throughout the store (`yyyy-MM-dd`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Grades offered by the editor
pub const GRADE_OPTIONS: [&str; 7] = ["1", "2", "3", "4", "5", "6", "7"];

/// Default department choices
pub const DEFAULT_DEPARTMENTS: &[&str] = &[
    "文学部",
    "教育学部",
    "法学部",
    "経済学部",
    "理学部",
    "工学部",
    "医学部",
    "大学院",
    "その他",
];

/// Default interview categories
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "履修・学修",
    "進路・就職",
    "学生生活",
    "心身の健康",
    "経済的問題",
    "その他",
];

/// Format a date as a store key
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a store key back into a date
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_FORMAT).ok()
}

/// Editable text fields of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryField {
    StudentName,
    StudentGrade,
    StudentDepartment,
    Category,
    Content,
}

impl EntryField {
    /// All fields in display (and CSV) order
    pub const ALL: [EntryField; 5] = [
        EntryField::StudentName,
        EntryField::StudentGrade,
        EntryField::StudentDepartment,
        EntryField::Category,
        EntryField::Content,
    ];

    /// Label shown in the UI and used as the CSV header
    pub fn label(self) -> &'static str {
        match self {
            EntryField::StudentName => "氏名",
            EntryField::StudentGrade => "学年",
            EntryField::StudentDepartment => "学生所属",
            EntryField::Category => "面談カテゴリー",
            EntryField::Content => "本文",
        }
    }

    /// Whether the field must be non-empty at save time
    pub fn is_required(self) -> bool {
        matches!(self, EntryField::StudentName | EntryField::Content)
    }
}

/// Choices for the enumerated entry fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOptions {
    pub departments: Vec<String>,
    pub categories: Vec<String>,
}

impl EntryOptions {
    /// Choices offered for a field, or `None` for free-text fields
    pub fn choices(&self, field: EntryField) -> Option<Vec<String>> {
        match field {
            EntryField::StudentGrade => Some(GRADE_OPTIONS.iter().map(|g| g.to_string()).collect()),
            EntryField::StudentDepartment => Some(self.departments.clone()),
            EntryField::Category => Some(self.categories.clone()),
            EntryField::StudentName | EntryField::Content => None,
        }
    }

    fn first_department(&self) -> String {
        self.departments
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_DEPARTMENTS[0].to_string())
    }

    fn first_category(&self) -> String {
        self.categories
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_CATEGORIES[0].to_string())
    }
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            departments: DEFAULT_DEPARTMENTS.iter().map(|s| s.to_string()).collect(),
            categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<&crate::config::Config> for EntryOptions {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            departments: config.departments.clone(),
            categories: config.categories.clone(),
        }
    }
}

/// One interview record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Opaque unique identifier, never changed after creation
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub student_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub student_grade: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub student_department: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
}

impl Entry {
    /// Create a blank entry with default choices
    pub fn new(options: &EntryOptions) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            student_name: String::new(),
            student_grade: GRADE_OPTIONS[0].to_string(),
            student_department: options.first_department(),
            category: options.first_category(),
            content: String::new(),
        }
    }

    /// Create an entry with the required fields filled in
    pub fn with_fields(
        options: &EntryOptions,
        student_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut entry = Self::new(options);
        entry.student_name = student_name.into();
        entry.content = content.into();
        entry
    }

    /// Read a field
    pub fn field(&self, field: EntryField) -> &str {
        match field {
            EntryField::StudentName => &self.student_name,
            EntryField::StudentGrade => &self.student_grade,
            EntryField::StudentDepartment => &self.student_department,
            EntryField::Category => &self.category,
            EntryField::Content => &self.content,
        }
    }

    /// Overwrite a field
    pub fn set_field(&mut self, field: EntryField, value: impl Into<String>) {
        let value = value.into();
        match field {
            EntryField::StudentName => self.student_name = value,
            EntryField::StudentGrade => self.student_grade = value,
            EntryField::StudentDepartment => self.student_department = value,
            EntryField::Category => self.category = value,
            EntryField::Content => self.content = value,
        }
    }

    /// Whether both required fields are blank
    pub fn is_blank(&self) -> bool {
        self.student_name.trim().is_empty() && self.content.trim().is_empty()
    }
}

/// Read a text field written by any version of the app
///
/// Older data may hold numbers (`"studentGrade": 2`) or `null`; numbers and
/// booleans keep their JSON text and `null` becomes empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// All entries attached to one date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayRecord {
    /// Date key (`yyyy-MM-dd`)
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    /// Entries in insertion/edit order
    pub records: Vec<Entry>,
}

impl DayRecord {
    pub fn new(date: impl Into<String>, records: Vec<Entry>) -> Self {
        Self {
            date: date.into(),
            records,
        }
    }

    /// One-line summary: entry names joined with commas
    pub fn summary(&self) -> String {
        self.records
            .iter()
            .map(|r| r.student_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_new_defaults() {
        let options = EntryOptions::default();
        let entry = Entry::new(&options);
        assert!(!entry.id.is_empty());
        assert_eq!(entry.student_grade, "1");
        assert_eq!(entry.student_department, options.departments[0]);
        assert_eq!(entry.category, options.categories[0]);
        assert!(entry.student_name.is_empty());
        assert!(entry.content.is_empty());
        assert!(entry.is_blank());
    }

    #[test]
    fn test_entry_ids_are_unique() {
        let options = EntryOptions::default();
        assert_ne!(Entry::new(&options).id, Entry::new(&options).id);
    }

    #[test]
    fn test_entry_defaults_follow_configured_options() {
        let options = EntryOptions {
            departments: vec!["看護学部".to_string()],
            categories: vec!["相談".to_string(), "報告".to_string()],
        };
        let entry = Entry::new(&options);
        assert_eq!(entry.student_department, "看護学部");
        assert_eq!(entry.category, "相談");
    }

    #[test]
    fn test_field_access() {
        let mut entry = Entry::new(&EntryOptions::default());
        for field in EntryField::ALL {
            entry.set_field(field, format!("value-{:?}", field));
        }
        assert_eq!(entry.field(EntryField::StudentName), "value-StudentName");
        assert_eq!(entry.field(EntryField::Content), "value-Content");
        assert_eq!(entry.category, "value-Category");
    }

    #[test]
    fn test_required_fields() {
        let required: Vec<_> = EntryField::ALL
            .into_iter()
            .filter(|f| f.is_required())
            .collect();
        assert_eq!(required, vec![EntryField::StudentName, EntryField::Content]);
    }

    #[test]
    fn test_choices() {
        let options = EntryOptions::default();
        assert_eq!(options.choices(EntryField::StudentGrade).unwrap().len(), 7);
        assert!(options.choices(EntryField::StudentName).is_none());
        assert_eq!(
            options.choices(EntryField::Category).unwrap(),
            options.categories
        );
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let entry = Entry::with_fields(&EntryOptions::default(), "山田", "面談内容");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["studentName"], "山田");
        assert_eq!(json["studentGrade"], "1");
        assert!(json.get("studentDepartment").is_some());
        assert_eq!(json["content"], "面談内容");
    }

    #[test]
    fn test_missing_fields_deserialize_empty() {
        let entry: Entry = serde_json::from_str(r#"{"id": "abc", "studentName": "Alice"}"#).unwrap();
        assert_eq!(entry.id, "abc");
        assert_eq!(entry.student_name, "Alice");
        assert!(entry.content.is_empty());
        assert!(entry.category.is_empty());
    }

    #[test]
    fn test_loose_field_types_become_text() {
        let day: DayRecord = serde_json::from_str(
            r#"{"date": 20250101, "records": [
                {"id": "a", "studentName": "Alice", "studentGrade": 2, "category": null, "content": "x"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(day.date, "20250101");
        assert_eq!(day.records[0].student_grade, "2");
        assert_eq!(day.records[0].category, "");
        assert_eq!(day.records[0].content, "x");
    }

    #[test]
    fn test_day_summary() {
        let options = EntryOptions::default();
        let day = DayRecord::new(
            "2025-06-15",
            vec![
                Entry::with_fields(&options, "Alice", "a"),
                Entry::with_fields(&options, "Bob", "b"),
            ],
        );
        assert_eq!(day.summary(), "Alice, Bob");
    }

    #[test]
    fn test_date_key_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(date_key(date), "2025-01-05");
        assert_eq!(parse_date_key("2025-01-05"), Some(date));
        assert_eq!(parse_date_key("2025/01/05"), None);
    }
}
