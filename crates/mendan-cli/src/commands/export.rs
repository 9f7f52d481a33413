//! Export command handlers
//!
//! Files are named after the configured prefix and today's date unless
//! `--out` names a file. When `--out` is a directory the default name is
//! used inside it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use mendan_core::transfer::{backup_file_name, csv_file_name, export_backup, export_csv};
use mendan_core::{Config, RecordStore, TransferError};

use crate::output::Output;

/// Shown when the store is empty
const NOTHING_TO_EXPORT: &str = "出力するデータがありません。";

/// Write every record as CSV
pub fn csv(store: &RecordStore, config: &Config, out: Option<PathBuf>, output: &Output) -> Result<()> {
    match write_csv(store, config, out)? {
        Some(path) => output.success(&format!(
            "Exported {} record(s) to {}",
            store.entry_count(),
            path.display()
        )),
        None => output.message(NOTHING_TO_EXPORT),
    }
    Ok(())
}

/// Write the whole collection as a backup file
pub fn backup(
    store: &RecordStore,
    config: &Config,
    out: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    match write_backup(store, config, out)? {
        Some(path) => output.success(&format!(
            "Backed up {} date(s) to {}",
            store.date_count(),
            path.display()
        )),
        None => output.message(NOTHING_TO_EXPORT),
    }
    Ok(())
}

/// Write the CSV file; `None` when there is nothing to export
pub fn write_csv(store: &RecordStore, config: &Config, out: Option<PathBuf>) -> Result<Option<PathBuf>> {
    let bytes = match export_csv(store.days()) {
        Ok(bytes) => bytes,
        Err(TransferError::NothingToExport) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let name = csv_file_name(&config.export_prefix, Local::now().date_naive());
    let path = target_path(out, &name);
    write_file(&path, &bytes)?;
    Ok(Some(path))
}

/// Write the backup file; `None` when there is nothing to export
pub fn write_backup(
    store: &RecordStore,
    config: &Config,
    out: Option<PathBuf>,
) -> Result<Option<PathBuf>> {
    let text = match export_backup(store.days()) {
        Ok(text) => text,
        Err(TransferError::NothingToExport) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let name = backup_file_name(&config.backup_prefix, Local::now().date_naive());
    let path = target_path(out, &name);
    write_file(&path, text.as_bytes())?;
    Ok(Some(path))
}

fn target_path(out: Option<PathBuf>, default_name: &str) -> PathBuf {
    match out {
        None => PathBuf::from(default_name),
        Some(dir) if dir.is_dir() => dir.join(default_name),
        Some(path) => path,
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write file: {:?}", path))
}
