//! Status command handler

use anyhow::Result;

use mendan_core::{Config, RecordStore, TemplateStore};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(
    store: &RecordStore,
    templates: &TemplateStore,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let database = config.database_path();
    let database_size = std::fs::metadata(&database).map(|m| m.len()).unwrap_or(0);
    let filled_templates = templates.templates().iter().filter(|t| !t.is_empty()).count();

    let first = store.days().iter().map(|d| d.date.as_str()).min();
    let last = store.days().iter().map(|d| d.date.as_str()).max();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "storage": {
                        "data_dir": config.data_dir,
                        "database": database,
                        "database_size": database_size
                    },
                    "counts": {
                        "dates": store.date_count(),
                        "records": store.entry_count(),
                        "templates": filled_templates
                    },
                    "range": {
                        "first": first,
                        "last": last
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", store.entry_count());
        }
        OutputFormat::Human => {
            println!("mendan Status");
            println!("=============");
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Database: {} ({})", database.display(), human_size(database_size));
            println!();
            println!("Contents:");
            println!("  Dates:     {}", store.date_count());
            println!("  Records:   {}", store.entry_count());
            println!("  Templates: {}/{}", filled_templates, templates.templates().len());
            if let (Some(first), Some(last)) = (first, last) {
                println!("  Range:     {} .. {}", first, last);
            }
        }
    }

    Ok(())
}

/// Format a byte count for display
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
