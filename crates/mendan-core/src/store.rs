//! Record store
//!
//! `RecordStore` owns the authoritative, in-memory collection of
//! `DayRecord`s. Every mutation:
//!
//! 1. updates memory synchronously, then
//! 2. hands a snapshot of the *entire* collection to a background writer.
//!
//! The writer processes snapshots in the order they were issued and writes
//! each one under a single key. A failed write is logged and dropped; memory
//! stays authoritative for the session. Callers that need durability (the
//! CLI before exiting, tests) await `flush()`.
//!
//! ## Usage
//!
//! ```ignore
//! let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKv::open(&config)?);
//! let mut store = RecordStore::initialize(kv).await;
//!
//! store.add_for_date("2025-06-15", vec![entry]);
//! store.flush().await;
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::editor::SaveIntent;
use crate::models::{DayRecord, Entry};
use crate::storage::{KeyValueStore, StorageError, StorageResult, RECORDS_KEY, RECORDS_NAMESPACE};

/// Commands sent to the writer task
#[derive(Debug)]
enum WriteCommand {
    /// Persist this snapshot of the whole collection
    Save(Vec<DayRecord>),
    /// Acknowledge once every earlier command has been processed
    Flush(oneshot::Sender<()>),
}

/// What `save_day` did to the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayChange {
    Added,
    Updated,
    Removed,
    Unchanged,
}

/// In-memory record collection with write-behind persistence
pub struct RecordStore {
    days: Vec<DayRecord>,
    writer: mpsc::UnboundedSender<WriteCommand>,
    revision: watch::Sender<u64>,
}

impl RecordStore {
    /// Load the collection from storage and start the writer task
    ///
    /// Never fails: a missing, unreadable or corrupt value yields an empty
    /// collection and a logged error. Must be called inside a tokio runtime.
    pub async fn initialize(kv: Arc<dyn KeyValueStore>) -> Self {
        let days = load_collection(Arc::clone(&kv)).await;

        let (writer, rx) = mpsc::unbounded_channel();
        tokio::spawn(writer_loop(kv, rx));

        let (revision, _) = watch::channel(0);

        Self {
            days,
            writer,
            revision,
        }
    }

    // ==================== Queries ====================

    /// All day records in collection order
    pub fn days(&self) -> &[DayRecord] {
        &self.days
    }

    /// Look up the record for a date key
    pub fn day(&self, date: &str) -> Option<&DayRecord> {
        self.days.iter().find(|d| d.date == date)
    }

    /// Entries for a date; empty when the date has no record
    pub fn records_for(&self, date: &str) -> &[Entry] {
        self.day(date).map(|d| d.records.as_slice()).unwrap_or(&[])
    }

    /// Whether the date has a record
    pub fn contains(&self, date: &str) -> bool {
        self.day(date).is_some()
    }

    /// Number of dates in the collection
    pub fn date_count(&self) -> usize {
        self.days.len()
    }

    /// Number of entries across all dates
    pub fn entry_count(&self) -> usize {
        self.days.iter().map(|d| d.records.len()).sum()
    }

    /// Whether the collection has no dates
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Receive the revision counter, bumped after every mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    // ==================== Mutations ====================

    /// Append a record for a new date
    ///
    /// Returns `false` without changing anything if the date already exists.
    pub fn add_for_date(&mut self, date: impl Into<String>, entries: Vec<Entry>) -> bool {
        let date = date.into();
        if self.contains(&date) {
            debug!("Date {} already has a record, add ignored", date);
            return false;
        }

        self.days.push(DayRecord::new(date, entries));
        self.commit();
        true
    }

    /// Replace the entries of a date, adding the date if it is absent
    pub fn replace_for_date(&mut self, date: impl Into<String>, entries: Vec<Entry>) {
        let date = date.into();
        match self.days.iter_mut().find(|d| d.date == date) {
            Some(day) => {
                day.records = entries;
                self.commit();
            }
            None => {
                self.add_for_date(date, entries);
            }
        }
    }

    /// Remove the record for a date
    ///
    /// Returns `false` if the date was not present.
    pub fn remove_for_date(&mut self, date: &str) -> bool {
        let before = self.days.len();
        self.days.retain(|d| d.date != date);
        if self.days.len() == before {
            return false;
        }

        self.commit();
        true
    }

    /// Remove a single entry; the date disappears with its last entry
    ///
    /// Returns `false` if no such entry exists.
    pub fn remove_entry(&mut self, date: &str, entry_id: &str) -> bool {
        let Some(day) = self.days.iter().find(|d| d.date == date) else {
            return false;
        };
        if !day.records.iter().any(|r| r.id == entry_id) {
            return false;
        }

        let remaining: Vec<Entry> = day
            .records
            .iter()
            .filter(|r| r.id != entry_id)
            .cloned()
            .collect();
        self.save_day(date, remaining);
        true
    }

    /// Empty the whole collection
    pub fn clear_all(&mut self) {
        self.days.clear();
        self.commit();
    }

    /// Replace the whole collection (restore from backup)
    ///
    /// The caller is responsible for validating the shape first.
    pub fn replace_all(&mut self, days: Vec<DayRecord>) {
        self.days = days;
        self.commit();
    }

    /// Store the result of editing one date
    ///
    /// An empty entry list deletes the date instead of saving an empty
    /// record.
    pub fn save_day(&mut self, date: &str, entries: Vec<Entry>) -> DayChange {
        let exists = self.contains(date);
        match (entries.is_empty(), exists) {
            (true, true) => {
                self.remove_for_date(date);
                DayChange::Removed
            }
            (true, false) => DayChange::Unchanged,
            (false, true) => {
                self.replace_for_date(date, entries);
                DayChange::Updated
            }
            (false, false) => {
                self.add_for_date(date, entries);
                DayChange::Added
            }
        }
    }

    /// Apply the outcome of an editor save
    pub fn apply(&mut self, intent: SaveIntent) -> DayChange {
        match intent {
            SaveIntent::Save { date, entries } => self.save_day(&date, entries),
            SaveIntent::Delete { date } => {
                if self.remove_for_date(&date) {
                    DayChange::Removed
                } else {
                    DayChange::Unchanged
                }
            }
            SaveIntent::None => DayChange::Unchanged,
        }
    }

    /// Wait until every write issued so far has completed
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.writer.send(WriteCommand::Flush(ack)).is_err() {
            warn!("Record writer is not running, nothing to flush");
            return;
        }
        let _ = done.await;
    }

    /// Bump the revision and schedule a full write
    fn commit(&mut self) {
        self.revision.send_modify(|r| *r += 1);

        if self
            .writer
            .send(WriteCommand::Save(self.days.clone()))
            .is_err()
        {
            error!("Record writer is not running, change kept in memory only");
        }
    }
}

/// Load the collection, falling back to empty on any failure
async fn load_collection(kv: Arc<dyn KeyValueStore>) -> Vec<DayRecord> {
    match tokio::task::spawn_blocking(move || read_collection(kv.as_ref())).await {
        Ok(Ok(days)) => {
            info!("Loaded {} day record(s)", days.len());
            days
        }
        Ok(Err(e)) => {
            error!("Failed to load records, starting empty: {}", e.with_suggestion());
            Vec::new()
        }
        Err(e) => {
            error!("Record load task failed, starting empty: {}", e);
            Vec::new()
        }
    }
}

/// Read and decode the stored collection
fn read_collection(kv: &dyn KeyValueStore) -> StorageResult<Vec<DayRecord>> {
    let Some(text) = kv.get(RECORDS_NAMESPACE, RECORDS_KEY)? else {
        return Ok(Vec::new());
    };

    serde_json::from_str(&text).map_err(|e| StorageError::InvalidValue {
        namespace: RECORDS_NAMESPACE.to_string(),
        key: RECORDS_KEY.to_string(),
        details: e.to_string(),
    })
}

/// Encode and store a snapshot
fn write_collection(kv: &dyn KeyValueStore, days: &[DayRecord]) -> StorageResult<()> {
    let text = serde_json::to_string(days)?;
    kv.put(RECORDS_NAMESPACE, RECORDS_KEY, &text)
}

/// Writer task: persists snapshots in issue order until the store is dropped
async fn writer_loop(kv: Arc<dyn KeyValueStore>, mut rx: mpsc::UnboundedReceiver<WriteCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Save(days) => {
                let kv = Arc::clone(&kv);
                let count = days.len();
                match tokio::task::spawn_blocking(move || write_collection(kv.as_ref(), &days))
                    .await
                {
                    Ok(Ok(())) => debug!("Persisted {} day record(s)", count),
                    Ok(Err(e)) => error!("Failed to persist records: {}", e.with_suggestion()),
                    Err(e) => error!("Record write task failed: {}", e),
                }
            }
            WriteCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!("Record writer stopped");
}
