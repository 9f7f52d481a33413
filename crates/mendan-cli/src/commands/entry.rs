//! Record command handlers
//!
//! Records are grouped by date; an entry id (or a prefix of it) picks one
//! record within a date.

use anyhow::{anyhow, bail, Context, Result};

use mendan_core::models::{date_key, parse_date_key};
use mendan_core::{DayChange, EntryEditor, EntryField, EntryOptions, RecordStore, ValidationFailed};

use crate::editor::{confirm_unless, edit_text, strip_comments};
use crate::output::{short_id, Output};

/// Field values given on the command line for a new record
pub struct NewEntry {
    pub name: String,
    pub content: Option<String>,
    pub grade: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
}

/// Add a record to a date
pub fn add(
    store: &mut RecordStore,
    options: EntryOptions,
    date: String,
    fields: NewEntry,
    output: &Output,
) -> Result<()> {
    let date = normalize_date(&date)?;

    let content = match fields.content {
        Some(c) => c,
        None => {
            let initial = format!(
                "# 面談記録: {} / {}\n# Lines starting with # are ignored\n\n",
                date, fields.name
            );
            let edited = edit_text(&initial).context("Failed to edit record content")?;
            strip_comments(&edited)
        }
    };

    let mut editor = EntryEditor::open(date.as_str(), store.records_for(&date), options);
    let id = if editor.had_existing() {
        editor.add_entry()
    } else {
        editor
            .entries()
            .first()
            .map(|e| e.id.clone())
            .ok_or_else(|| anyhow!("Editor opened without an entry"))?
    };

    editor.set_field(&id, EntryField::StudentName, fields.name);
    editor.set_field(&id, EntryField::Content, content);

    let choices = [
        (EntryField::StudentGrade, fields.grade),
        (EntryField::StudentDepartment, fields.department),
        (EntryField::Category, fields.category),
    ];
    for (field, value) in choices {
        if let Some(value) = value {
            check_choice(editor.options(), field, &value)?;
            editor.set_field(&id, field, value);
        }
    }

    let intent = editor
        .save()
        .map_err(|failed| anyhow!(describe_failure(&editor, &failed)))?;
    let change = store.apply(intent);

    match change {
        DayChange::Added | DayChange::Updated => {
            output.success(&format!("Added record {} on {}", short_id(&id), date));
        }
        DayChange::Removed | DayChange::Unchanged => {
            output.message("Nothing to save.");
        }
    }

    Ok(())
}

/// List every date with records
pub fn list(store: &RecordStore, output: &Output) -> Result<()> {
    output.print_days(store.days());
    Ok(())
}

/// Show all records of one date
pub fn show(store: &RecordStore, date: String, output: &Output) -> Result<()> {
    let date = normalize_date(&date)?;
    let day = store
        .day(&date)
        .ok_or_else(|| anyhow!("No records on {}", date))?;
    output.print_day(day);
    Ok(())
}

/// Delete every record of one date
pub fn delete(store: &mut RecordStore, date: String, yes: bool, output: &Output) -> Result<()> {
    let date = normalize_date(&date)?;
    let count = store.records_for(&date).len();
    if !store.contains(&date) {
        bail!("No records on {}", date);
    }

    if !confirm_unless(
        yes,
        &format!("{} の記録 {} 件をすべて削除しますか？", date, count),
    )? {
        output.message("Cancelled.");
        return Ok(());
    }

    store.remove_for_date(&date);
    output.success(&format!("Deleted {} record(s) on {}", count, date));
    Ok(())
}

/// Remove one record from a date
pub fn remove(
    store: &mut RecordStore,
    date: String,
    id: String,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let date = normalize_date(&date)?;
    let entry_id = resolve_entry_id(store, &date, &id)?;

    let name = store
        .records_for(&date)
        .iter()
        .find(|e| e.id == entry_id)
        .map(|e| e.student_name.clone())
        .unwrap_or_default();

    if !confirm_unless(yes, &format!("{} の {} さんの記録を削除しますか？", date, name))? {
        output.message("Cancelled.");
        return Ok(());
    }

    store.remove_entry(&date, &entry_id);
    output.success(&format!("Deleted record {} on {}", short_id(&entry_id), date));
    Ok(())
}

/// Delete every record of every date
pub fn clear(store: &mut RecordStore, yes: bool, output: &Output) -> Result<()> {
    if store.is_empty() {
        output.message("There are no records.");
        return Ok(());
    }

    if !confirm_unless(
        yes,
        &format!(
            "すべての記録 ({} 日, {} 件) を削除しますか？この操作は元に戻せません。",
            store.date_count(),
            store.entry_count()
        ),
    )? {
        output.message("Cancelled.");
        return Ok(());
    }

    store.clear_all();
    output.success("Deleted all records");
    Ok(())
}

/// Accept `yyyy-MM-dd` (and single-digit month/day), returning the store key
pub fn normalize_date(input: &str) -> Result<String> {
    let date = parse_date_key(input.trim())
        .ok_or_else(|| anyhow!("Invalid date '{}'. Use YYYY-MM-DD.", input))?;
    Ok(date_key(date))
}

fn check_choice(options: &EntryOptions, field: EntryField, value: &str) -> Result<()> {
    if let Some(choices) = options.choices(field) {
        if !choices.iter().any(|c| c == value) {
            bail!(
                "Invalid {} '{}'. Choose one of: {}",
                field.label(),
                value,
                choices.join(", ")
            );
        }
    }
    Ok(())
}

fn describe_failure(editor: &EntryEditor, failed: &ValidationFailed) -> String {
    let mut lines = vec![failed.to_string()];
    for (id, fields) in &failed.errors {
        let name = editor
            .entry(id)
            .map(|e| e.student_name.as_str())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("(no name)");
        for message in fields.values() {
            lines.push(format!("  {}: {}", name, message));
        }
    }
    lines.join("\n")
}

/// Resolve a full id or unique prefix within one date
fn resolve_entry_id(store: &RecordStore, date: &str, id: &str) -> Result<String> {
    let records = store.records_for(date);
    if records.is_empty() {
        bail!("No records on {}", date);
    }

    if let Some(entry) = records.iter().find(|e| e.id == id) {
        return Ok(entry.id.clone());
    }

    let matches: Vec<_> = records.iter().filter(|e| e.id.starts_with(id)).collect();

    match matches.as_slice() {
        [] => bail!("No record on {} matching: {}", date, id),
        [entry] => Ok(entry.id.clone()),
        _ => {
            eprintln!("Multiple records match '{}':", id);
            for entry in &matches {
                eprintln!("  {} - {}", short_id(&entry.id), entry.student_name);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
