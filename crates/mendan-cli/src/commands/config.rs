//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use mendan_core::Config;

use crate::output::{Output, OutputFormat};

/// Keys accepted by `config set`
const VALID_KEYS: &str = "data_dir, log_file, export_prefix, backup_prefix, departments, categories";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "log_file": config.log_file,
                    "export_prefix": config.export_prefix,
                    "backup_prefix": config.backup_prefix,
                    "departments": config.departments,
                    "categories": config.categories
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:      {}", config.data_dir.display());
            println!(
                "  log_file:      {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  export_prefix: {}", config.export_prefix);
            println!("  backup_prefix: {}", config.backup_prefix);
            println!("  departments:   {}", config.departments.join(", "));
            println!("  categories:    {}", config.categories.join(", "));
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        "export_prefix" | "backup_prefix" => {
            if value.trim().is_empty() {
                bail!("{} cannot be empty", key);
            }
            if key == "export_prefix" {
                config.export_prefix = value.to_string();
            } else {
                config.backup_prefix = value.to_string();
            }
        }
        "departments" | "categories" => {
            let list = split_list(value);
            if list.is_empty() {
                bail!("{} needs at least one value (comma separated)", key);
            }
            if key == "departments" {
                config.departments = list;
            } else {
                config.categories = list;
            }
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}

/// Split a comma separated list, dropping blanks
fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == '、')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "export_prefix", "records").unwrap();
        apply(&mut config, "categories", "相談, 報告、その他").unwrap();
        apply(&mut config, "log_file", "/tmp/mendan.log").unwrap();

        assert_eq!(config.export_prefix, "records");
        assert_eq!(config.categories, vec!["相談", "報告", "その他"]);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/mendan.log")));

        apply(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = Config::default();

        assert!(apply(&mut config, "sync_url", "x").is_err());
        assert!(apply(&mut config, "departments", " , ").is_err());
        assert!(apply(&mut config, "backup_prefix", "").is_err());
    }

    #[test]
    fn test_set_writes_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let data_dir = temp_dir.path().join("data");
        std::fs::write(&path, format!("data_dir = {:?}\n", data_dir.display().to_string())).unwrap();

        set(
            "data_dir".to_string(),
            data_dir.display().to_string(),
            Some(&path),
            &Output::new(OutputFormat::Quiet),
        )
        .unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("data_dir"));
        assert!(saved.contains("export_prefix"));
    }
}
