//! Storage layer
//!
//! A local embedded database used as a namespaced key-value store.
//!
//! ## Layout
//!
//! - `interviews / all-interviews`: the entire record collection as JSON
//! - `local_storage / work-log-templates`: the three template slots
//!
//! Every write replaces the whole value; there are no partial updates.

pub mod error;
pub mod kv;
pub mod schema;

pub use error::{StorageError, StorageResult};
pub use kv::{
    KeyValueStore, SqliteKv, LOCAL_NAMESPACE, RECORDS_KEY, RECORDS_NAMESPACE, TEMPLATES_KEY,
};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
