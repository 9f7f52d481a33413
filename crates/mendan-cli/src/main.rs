//! mendan CLI
//!
//! Command-line interface for mendan - a calendar of interview records.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mendan_core::{Config, EntryOptions, KeyValueStore, RecordStore, SqliteKv, TemplateStore};

mod commands;
mod editor;
mod output;
mod tui;

use commands::entry::NewEntry;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "mendan")]
#[command(about = "mendan - Local calendar of student interview records")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    yes: bool,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// Manage interview records
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },
    /// Search records (name, grade, department, category, content)
    Search {
        /// Search query
        query: String,
    },
    /// Print a month calendar
    #[command(alias = "cal")]
    Calendar {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
    },
    /// Export records
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Replace all records with a backup file
    Restore {
        /// Backup file (.txt)
        file: PathBuf,
    },
    /// Delete all records
    Clear,
    /// Manage the three text templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show storage location and record counts
    Status,
}

#[derive(Subcommand)]
enum EntryCommands {
    /// Add a record to a date
    #[command(alias = "create")]
    Add {
        /// Date (YYYY-MM-DD)
        date: String,
        /// Student name
        #[arg(short, long)]
        name: String,
        /// Record text (opens editor if not provided)
        #[arg(short, long)]
        content: Option<String>,
        /// Grade (1-7)
        #[arg(short, long)]
        grade: Option<String>,
        /// Department
        #[arg(short, long)]
        department: Option<String>,
        /// Interview category
        #[arg(short = 't', long)]
        category: Option<String>,
    },
    /// List dates with records
    #[command(alias = "ls")]
    List,
    /// Show all records of a date
    Show {
        /// Date (YYYY-MM-DD)
        date: String,
    },
    /// Delete all records of a date
    Delete {
        /// Date (YYYY-MM-DD)
        date: String,
    },
    /// Delete one record of a date
    #[command(alias = "rm")]
    Remove {
        /// Date (YYYY-MM-DD)
        date: String,
        /// Record ID (full or prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Export every record as CSV (UTF-8 with BOM)
    Csv {
        /// Output file or directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Write a full backup (JSON)
    Backup {
        /// Output file or directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List the template slots
    #[command(alias = "ls")]
    List,
    /// Print one template
    Show {
        /// Slot number (1-3)
        slot: usize,
    },
    /// Set a template (opens editor if no text is given)
    Set {
        /// Slot number (1-3)
        slot: usize,
        /// Template text
        text: Option<String>,
    },
    /// Empty a template
    Clear {
        /// Slot number (1-3)
        slot: usize,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file, export_prefix, backup_prefix,
        /// departments, categories)
        key: String,
        /// Configuration value (comma separated for lists)
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;

    // TUI is the default when no command is given
    let command = cli.command.unwrap_or(Commands::Tui);
    if matches!(command, Commands::Tui) {
        return tui::run(config).await;
    }

    init_cli_logging();

    let kv = open_storage(&config)?;
    let mut store = RecordStore::initialize(Arc::clone(&kv)).await;
    let yes = cli.yes;

    let result = match command {
        Commands::Tui | Commands::Config { .. } => Ok(()), // Handled above
        Commands::Entry { command } => {
            handle_entry_command(command, &mut store, &config, yes, &output)
        }
        Commands::Search { query } => commands::search::run(&store, query, &output),
        Commands::Calendar { year, month } => {
            commands::calendar::show(&store, year, month, &output)
        }
        Commands::Export { command } => match command {
            ExportCommands::Csv { out } => commands::export::csv(&store, &config, out, &output),
            ExportCommands::Backup { out } => {
                commands::export::backup(&store, &config, out, &output)
            }
        },
        Commands::Restore { file } => commands::restore::run(&mut store, file, yes, &output),
        Commands::Clear => commands::entry::clear(&mut store, yes, &output),
        Commands::Template { command } => {
            let mut templates = TemplateStore::load(kv);
            handle_template_command(command, &mut templates, yes, &output)
        }
        Commands::Status => {
            let templates = TemplateStore::load(kv);
            commands::status::show(&store, &templates, &config, &output)
        }
    };

    // Pending writes must land before the process exits
    store.flush().await;

    result
}

fn handle_entry_command(
    command: EntryCommands,
    store: &mut RecordStore,
    config: &Config,
    yes: bool,
    output: &Output,
) -> Result<()> {
    match command {
        EntryCommands::Add {
            date,
            name,
            content,
            grade,
            department,
            category,
        } => {
            let fields = NewEntry {
                name,
                content,
                grade,
                department,
                category,
            };
            commands::entry::add(store, EntryOptions::from(config), date, fields, output)
        }
        EntryCommands::List => commands::entry::list(store, output),
        EntryCommands::Show { date } => commands::entry::show(store, date, output),
        EntryCommands::Delete { date } => commands::entry::delete(store, date, yes, output),
        EntryCommands::Remove { date, id } => {
            commands::entry::remove(store, date, id, yes, output)
        }
    }
}

fn handle_template_command(
    command: TemplateCommands,
    templates: &mut TemplateStore,
    yes: bool,
    output: &Output,
) -> Result<()> {
    match command {
        TemplateCommands::List => commands::template::list(templates, output),
        TemplateCommands::Show { slot } => commands::template::show(templates, slot, output),
        TemplateCommands::Set { slot, text } => {
            commands::template::set(templates, slot, text, output)
        }
        TemplateCommands::Clear { slot } => commands::template::clear(templates, slot, yes, output),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Open the key-value database shared by the record and template stores
pub fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let path = config.database_path();
    let kv = SqliteKv::open(config).map_err(|e| {
        let message = match e.recovery_suggestion() {
            Some(hint) => format!("Failed to open database at {}. {}", path.display(), hint),
            None => format!("Failed to open database at {}", path.display()),
        };
        anyhow::Error::new(e).context(message)
    })?;
    Ok(Arc::new(kv))
}

/// Log to stderr when MENDAN_LOG is set (e.g. MENDAN_LOG=debug)
fn init_cli_logging() {
    let Ok(log_level) = std::env::var("MENDAN_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "mendan_core={},mendan_cli={}",
        log_level, log_level
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_entry_add() {
        let cli = Cli::try_parse_from([
            "mendan", "--yes", "entry", "add", "2025-06-15", "--name", "山田", "--content", "相談",
            "--grade", "2",
        ])
        .unwrap();

        assert!(cli.yes);
        match cli.command {
            Some(Commands::Entry {
                command: EntryCommands::Add { name, grade, .. },
            }) => {
                assert_eq!(name, "山田");
                assert_eq!(grade.as_deref(), Some("2"));
            }
            _ => panic!("expected entry add"),
        }
    }

    #[test]
    fn test_no_command_defaults_to_tui() {
        let cli = Cli::try_parse_from(["mendan"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_open_storage_creates_database() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        };

        open_storage(&config).unwrap();
        assert!(config.database_path().exists());
    }

    #[test]
    fn test_open_storage_failure_includes_suggestion() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let config = Config {
            data_dir: blocker.join("data"),
            ..Config::default()
        };

        let err = match open_storage(&config) {
            Ok(_) => panic!("opening beneath a regular file should fail"),
            Err(e) => e,
        };
        let message = err.to_string();
        assert!(message.contains("Failed to open database"));
        assert!(message.contains("write permissions"));
    }
}
