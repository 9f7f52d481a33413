//! Mendan Core Library
//!
//! This crate provides the core functionality for mendan, a local-first
//! calendar of student interview records.
//!
//! # Architecture
//!
//! - **RecordStore**: the in-memory collection is the source of truth;
//!   every change is written behind to SQLite by a background task
//! - **TemplateStore**: three reusable text snippets, written through
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKv::open(&config)?);
//! let mut store = RecordStore::initialize(kv).await;
//!
//! let mut editor = EntryEditor::open("2025-06-15", store.records_for("2025-06-15"), options);
//! // ... edit ...
//! store.apply(editor.save()?);
//! store.flush().await;
//! ```
//!
//! # Modules
//!
//! - `store`: record collection (main entry point)
//! - `templates`: template slots
//! - `models`: entries and day records
//! - `editor`: working copy and validation for one date
//! - `calendar`: month grid
//! - `search`: case-insensitive filtering
//! - `transfer`: CSV export, backup and restore
//! - `storage`: SQLite key-value persistence
//! - `config`: application configuration

pub mod calendar;
pub mod config;
pub mod editor;
pub mod models;
pub mod search;
pub mod storage;
pub mod store;
pub mod templates;
pub mod transfer;

pub use calendar::{CalendarCell, MonthCursor, MonthGrid};
pub use config::Config;
pub use editor::{EntryEditor, SaveIntent, ValidationFailed};
pub use models::{DayRecord, Entry, EntryField, EntryOptions};
pub use search::SearchHit;
pub use storage::{KeyValueStore, SqliteKv, StorageError};
pub use store::{DayChange, RecordStore};
pub use templates::TemplateStore;
pub use transfer::{RestorePlan, TransferError};
