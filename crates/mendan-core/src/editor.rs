//! Entry editor
//!
//! Holds a working copy of one date's entries while the user edits them.
//! Nothing reaches the store until `save` returns a `SaveIntent` and the
//! caller applies it; dropping the editor discards every edit.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{Entry, EntryField, EntryOptions};

/// Message shown when the name is blank
pub const NAME_REQUIRED: &str = "氏名は必須です。";

/// Message shown when the content is blank
pub const CONTENT_REQUIRED: &str = "本文は必須です。";

/// Per-entry, per-field validation messages
pub type FieldErrors = BTreeMap<String, BTreeMap<EntryField, &'static str>>;

/// Save was blocked by missing required fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("必須項目が入力されていません。 ({} entries with missing fields)", .errors.len())]
pub struct ValidationFailed {
    pub errors: FieldErrors,
}

/// What the caller should do with the store after a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveIntent {
    /// Store these entries for the date
    Save { date: String, entries: Vec<Entry> },
    /// Remove the date
    Delete { date: String },
    /// Nothing to store
    None,
}

/// Working copy of one date's entries
#[derive(Debug, Clone)]
pub struct EntryEditor {
    date: String,
    entries: Vec<Entry>,
    errors: FieldErrors,
    had_existing: bool,
    options: EntryOptions,
}

impl EntryEditor {
    /// Start editing `date`, seeding one blank entry when there are none
    pub fn open(date: impl Into<String>, existing: &[Entry], options: EntryOptions) -> Self {
        let entries = if existing.is_empty() {
            vec![Entry::new(&options)]
        } else {
            existing.to_vec()
        };

        Self {
            date: date.into(),
            entries,
            errors: FieldErrors::new(),
            had_existing: !existing.is_empty(),
            options,
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn options(&self) -> &EntryOptions {
        &self.options
    }

    /// Whether the date had entries when the editor opened
    pub fn had_existing(&self) -> bool {
        self.had_existing
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Validation message for one field of one entry
    pub fn error_for(&self, id: &str, field: EntryField) -> Option<&'static str> {
        self.errors.get(id).and_then(|m| m.get(&field)).copied()
    }

    /// Append a blank entry, returning its id
    pub fn add_entry(&mut self) -> String {
        let entry = Entry::new(&self.options);
        let id = entry.id.clone();
        self.entries.push(entry);
        id
    }

    /// Drop an entry and its validation messages
    pub fn remove_entry(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.errors.remove(id);
        self.entries.len() != before
    }

    /// Change one field, clearing that field's validation message
    pub fn set_field(&mut self, id: &str, field: EntryField, value: impl Into<String>) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        entry.set_field(field, value);
        self.clear_error(id, field);
        true
    }

    /// Step an enumerated field through its choices
    ///
    /// Free-text fields are left alone. A value outside the choice list
    /// moves to the first (or last) choice.
    pub fn cycle_choice(&mut self, id: &str, field: EntryField, forward: bool) -> bool {
        let Some(choices) = self.options.choices(field).filter(|c| !c.is_empty()) else {
            return false;
        };
        let Some(current) = self.entry(id).map(|e| e.field(field).to_string()) else {
            return false;
        };

        let len = choices.len();
        let next = match choices.iter().position(|c| *c == current) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.set_field(id, field, choices[next].clone())
    }

    /// Append text (a template) to an entry's content
    pub fn append_content(&mut self, id: &str, text: &str) -> bool {
        let Some(current) = self.entry(id).map(|e| e.content.clone()) else {
            return false;
        };
        let content = if current.is_empty() {
            text.to_string()
        } else {
            format!("{}\n{}", current, text)
        };
        self.set_field(id, EntryField::Content, content)
    }

    fn clear_error(&mut self, id: &str, field: EntryField) {
        if let Some(fields) = self.errors.get_mut(id) {
            fields.remove(&field);
            if fields.is_empty() {
                self.errors.remove(id);
            }
        }
    }

    /// Validate and produce the store change
    ///
    /// On failure the messages are kept on the editor for display.
    pub fn save(&mut self) -> Result<SaveIntent, ValidationFailed> {
        let mut errors = FieldErrors::new();
        for entry in &self.entries {
            let mut fields = BTreeMap::new();
            if entry.student_name.trim().is_empty() {
                fields.insert(EntryField::StudentName, NAME_REQUIRED);
            }
            if entry.content.trim().is_empty() {
                fields.insert(EntryField::Content, CONTENT_REQUIRED);
            }
            if !fields.is_empty() {
                errors.insert(entry.id.clone(), fields);
            }
        }

        self.errors = errors;
        if !self.errors.is_empty() {
            return Err(ValidationFailed {
                errors: self.errors.clone(),
            });
        }

        let entries: Vec<Entry> = self
            .entries
            .iter()
            .filter(|e| !e.is_blank())
            .cloned()
            .collect();

        Ok(if !entries.is_empty() {
            SaveIntent::Save {
                date: self.date.clone(),
                entries,
            }
        } else if self.had_existing {
            SaveIntent::Delete {
                date: self.date.clone(),
            }
        } else {
            SaveIntent::None
        })
    }

    /// Request removal of the whole date
    pub fn delete_date(&self) -> SaveIntent {
        SaveIntent::Delete {
            date: self.date.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> EntryOptions {
        EntryOptions::default()
    }

    fn filled(name: &str, content: &str) -> Entry {
        Entry::with_fields(&options(), name, content)
    }

    #[test]
    fn test_open_empty_seeds_blank_entry() {
        let editor = EntryEditor::open("2025-06-15", &[], options());

        assert_eq!(editor.entries().len(), 1);
        let seed = &editor.entries()[0];
        assert!(seed.is_blank());
        assert_eq!(seed.student_grade, "1");
        assert_eq!(seed.student_department, options().departments[0]);
        assert_eq!(seed.category, options().categories[0]);
        assert!(!editor.had_existing());
    }

    #[test]
    fn test_open_copies_existing() {
        let existing = vec![filled("Alice", "a"), filled("Bob", "b")];
        let mut editor = EntryEditor::open("2025-06-15", &existing, options());

        assert_eq!(editor.entries(), existing.as_slice());
        assert!(editor.had_existing());

        let id = existing[0].id.clone();
        editor.set_field(&id, EntryField::StudentName, "Changed");
        assert_eq!(existing[0].student_name, "Alice");
    }

    #[test]
    fn test_save_reports_missing_fields() {
        let mut editor = EntryEditor::open("2025-06-15", &[], options());
        let id = editor.entries()[0].id.clone();
        editor.set_field(&id, EntryField::Content, "   ");

        let failed = editor.save().unwrap_err();

        let fields = &failed.errors[&id];
        assert_eq!(fields[&EntryField::StudentName], NAME_REQUIRED);
        assert_eq!(fields[&EntryField::Content], CONTENT_REQUIRED);
        assert_eq!(editor.error_for(&id, EntryField::StudentName), Some(NAME_REQUIRED));
    }

    #[test]
    fn test_editing_clears_only_that_field() {
        let mut editor = EntryEditor::open("2025-06-15", &[], options());
        let id = editor.entries()[0].id.clone();
        assert!(editor.save().is_err());

        editor.set_field(&id, EntryField::StudentName, "Alice");
        assert_eq!(editor.error_for(&id, EntryField::StudentName), None);
        assert_eq!(editor.error_for(&id, EntryField::Content), Some(CONTENT_REQUIRED));

        editor.set_field(&id, EntryField::Content, "notes");
        assert!(editor.errors().is_empty());
    }

    #[test]
    fn test_remove_entry_drops_errors() {
        let mut editor = EntryEditor::open("2025-06-15", &[filled("Alice", "a")], options());
        let blank = editor.add_entry();
        assert!(editor.save().is_err());
        assert!(editor.errors().contains_key(&blank));

        assert!(editor.remove_entry(&blank));
        assert!(editor.errors().is_empty());
        assert!(!editor.remove_entry(&blank));
    }

    #[test]
    fn test_save_valid_entries() {
        let mut editor = EntryEditor::open("2025-06-15", &[], options());
        let id = editor.entries()[0].id.clone();
        editor.set_field(&id, EntryField::StudentName, "Alice");
        editor.set_field(&id, EntryField::Content, "Career advice");

        match editor.save().unwrap() {
            SaveIntent::Save { date, entries } => {
                assert_eq!(date, "2025-06-15");
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].student_name, "Alice");
                assert_eq!(entries[0].id, id);
            }
            other => panic!("unexpected intent: {:?}", other),
        }
    }

    #[test]
    fn test_removing_every_entry_deletes_existing_date() {
        let existing = vec![filled("Alice", "a")];
        let mut editor = EntryEditor::open("2025-06-15", &existing, options());
        editor.remove_entry(&existing[0].id);

        assert_eq!(
            editor.save().unwrap(),
            SaveIntent::Delete {
                date: "2025-06-15".to_string()
            }
        );
    }

    #[test]
    fn test_removing_every_entry_on_new_date_does_nothing() {
        let mut editor = EntryEditor::open("2025-06-15", &[], options());
        let seed = editor.entries()[0].id.clone();
        editor.remove_entry(&seed);

        assert_eq!(editor.save().unwrap(), SaveIntent::None);
    }

    #[test]
    fn test_delete_date() {
        let editor = EntryEditor::open("2025-06-15", &[filled("Alice", "a")], options());
        assert_eq!(
            editor.delete_date(),
            SaveIntent::Delete {
                date: "2025-06-15".to_string()
            }
        );
    }

    #[test]
    fn test_cycle_choice() {
        let mut editor = EntryEditor::open("2025-06-15", &[], options());
        let id = editor.entries()[0].id.clone();

        assert!(editor.cycle_choice(&id, EntryField::StudentGrade, true));
        assert_eq!(editor.entry(&id).unwrap().student_grade, "2");

        editor.cycle_choice(&id, EntryField::StudentGrade, false);
        editor.cycle_choice(&id, EntryField::StudentGrade, false);
        assert_eq!(editor.entry(&id).unwrap().student_grade, "7");

        assert!(!editor.cycle_choice(&id, EntryField::StudentName, true));
    }

    #[test]
    fn test_append_content() {
        let mut editor = EntryEditor::open("2025-06-15", &[], options());
        let id = editor.entries()[0].id.clone();

        editor.append_content(&id, "template one");
        editor.append_content(&id, "template two");

        assert_eq!(
            editor.entry(&id).unwrap().content,
            "template one\ntemplate two"
        );
    }
}
