//! Restore command handler
//!
//! Restoring replaces every stored record with the backup's contents.

use std::path::PathBuf;

use anyhow::{Context, Result};

use mendan_core::{RecordStore, RestorePlan};

use crate::editor::confirm_unless;
use crate::output::Output;

/// Replace the collection with a backup file
pub fn run(store: &mut RecordStore, path: PathBuf, yes: bool, output: &Output) -> Result<()> {
    let plan = RestorePlan::from_file(&path)
        .with_context(|| format!("Failed to restore from {}", path.display()))?;

    let mut summary = format!(
        "{} 日分 ({} 件) の記録で現在のデータをすべて上書きします。",
        plan.day_count(),
        plan.entry_count()
    );
    if plan.empty_day_count() > 0 {
        summary.push_str(&format!(
            " うち {} 日は記録が空です。",
            plan.empty_day_count()
        ));
    }

    if !confirm_unless(yes, &format!("{} よろしいですか？", summary))? {
        output.message("Cancelled.");
        return Ok(());
    }

    let days = plan.day_count();
    store.replace_all(plan.into_days());
    output.success(&format!("Restored {} date(s) from {}", days, path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mendan_core::{Entry, EntryOptions, KeyValueStore, SqliteKv};
    use tempfile::TempDir;

    use crate::output::OutputFormat;

    async fn memory_store() -> RecordStore {
        let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKv::open_in_memory().unwrap());
        RecordStore::initialize(kv).await
    }

    #[tokio::test]
    async fn test_restore_replaces_everything() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backup.txt");
        std::fs::write(
            &path,
            r#"[{"date":"2024-01-01","records":[{"id":"x","studentName":"Bob","content":"b"}]}]"#,
        )
        .unwrap();

        let mut store = memory_store().await;
        store.add_for_date(
            "2025-06-15",
            vec![Entry::with_fields(&EntryOptions::default(), "Alice", "a")],
        );

        run(&mut store, path, true, &Output::new(OutputFormat::Quiet)).unwrap();

        assert_eq!(store.date_count(), 1);
        assert_eq!(store.records_for("2024-01-01")[0].student_name, "Bob");
        assert!(!store.contains("2025-06-15"));
    }

    #[tokio::test]
    async fn test_invalid_backup_leaves_store_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backup.txt");
        std::fs::write(&path, r#"{"date":"2024-01-01"}"#).unwrap();

        let mut store = memory_store().await;
        store.add_for_date(
            "2025-06-15",
            vec![Entry::with_fields(&EntryOptions::default(), "Alice", "a")],
        );
        let before = store.days().to_vec();

        assert!(run(&mut store, path, true, &Output::new(OutputFormat::Quiet)).is_err());
        assert_eq!(store.days(), before.as_slice());
    }
}
