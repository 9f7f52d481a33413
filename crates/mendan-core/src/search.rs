//! Case-insensitive record search

use crate::models::{DayRecord, Entry, EntryField};

/// Characters shown in a result preview before truncation
pub const PREVIEW_CHARS: usize = 100;

/// One matching entry and the date it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub date: String,
    pub entry: Entry,
}

/// Whether any text field of the entry contains the (lowercased) needle
fn entry_matches(entry: &Entry, needle: &str) -> bool {
    EntryField::ALL
        .iter()
        .any(|f| entry.field(*f).to_lowercase().contains(needle))
}

/// Keep only matching entries, dropping days left empty
///
/// An empty query returns the collection unchanged.
pub fn filter_days(days: &[DayRecord], query: &str) -> Vec<DayRecord> {
    if query.is_empty() {
        return days.to_vec();
    }

    let needle = query.to_lowercase();
    days.iter()
        .filter_map(|day| {
            let records: Vec<Entry> = day
                .records
                .iter()
                .filter(|e| entry_matches(e, &needle))
                .cloned()
                .collect();
            (!records.is_empty()).then(|| DayRecord::new(day.date.clone(), records))
        })
        .collect()
}

/// Flattened list of matches; empty when there is no query
pub fn matching_entries(days: &[DayRecord], query: &str) -> Vec<SearchHit> {
    if query.is_empty() {
        return Vec::new();
    }

    filter_days(days, query)
        .into_iter()
        .flat_map(|day| {
            let date = day.date;
            day.records.into_iter().map(move |entry| SearchHit {
                date: date.clone(),
                entry,
            })
        })
        .collect()
}

/// First `max_chars` characters of the content, with `...` when cut
pub fn preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let head: String = content.chars().take(max_chars).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryOptions;

    fn entry(name: &str, content: &str) -> Entry {
        Entry::with_fields(&EntryOptions::default(), name, content)
    }

    fn sample() -> Vec<DayRecord> {
        vec![
            DayRecord::new(
                "2025-06-14",
                vec![entry("Alice", "Career advice"), entry("Bob", "Course load")],
            ),
            DayRecord::new("2025-06-15", vec![entry("Carol", "Housing")]),
        ]
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let days = sample();
        assert_eq!(filter_days(&days, ""), days);
        assert!(matching_entries(&days, "").is_empty());
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let days = sample();

        let result = filter_days(&days, "CAREER");

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].date, "2025-06-14");
        assert_eq!(result[0].records.len(), 1);
        assert_eq!(result[0].records[0].student_name, "Alice");
    }

    #[test]
    fn test_filter_drops_empty_days() {
        let days = sample();
        let result = filter_days(&days, "housing");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].date, "2025-06-15");
    }

    #[test]
    fn test_filter_matches_every_text_field() {
        let mut e = entry("Dana", "notes");
        e.student_department = "看護学部".to_string();
        e.category = "Scholarship".to_string();
        e.student_grade = "5".to_string();
        let days = vec![DayRecord::new("2025-06-16", vec![e])];

        for query in ["dana", "NOTES", "看護", "scholar", "5"] {
            assert_eq!(filter_days(&days, query).len(), 1, "query: {}", query);
        }
        assert!(filter_days(&days, "absent").is_empty());
    }

    #[test]
    fn test_filtered_entries_are_subsequence() {
        let days = vec![DayRecord::new(
            "2025-06-14",
            vec![entry("Ann", "x"), entry("Ben", "y"), entry("Anna", "z")],
        )];

        let result = filter_days(&days, "an");
        let names: Vec<_> = result[0]
            .records
            .iter()
            .map(|e| e.student_name.as_str())
            .collect();
        assert_eq!(names, vec!["Ann", "Anna"]);
    }

    #[test]
    fn test_matching_entries_flatten() {
        let days = sample();
        let hits = matching_entries(&days, "o");

        let pairs: Vec<_> = hits
            .iter()
            .map(|h| (h.date.as_str(), h.entry.student_name.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("2025-06-14", "Bob"),
                ("2025-06-15", "Carol"),
            ]
        );
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", PREVIEW_CHARS), "short");

        let exact = "a".repeat(100);
        assert_eq!(preview(&exact, PREVIEW_CHARS), exact);

        let long = "面".repeat(150);
        let cut = preview(&long, PREVIEW_CHARS);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 103);
    }
}
