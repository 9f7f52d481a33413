//! Template slots
//!
//! Three reusable text snippets that can be inserted into an entry's
//! content. Unlike records, template writes go straight through to storage.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::storage::{KeyValueStore, LOCAL_NAMESPACE, TEMPLATES_KEY};

/// Number of template slots
pub const TEMPLATE_SLOTS: usize = 3;

/// Persisted template slots
pub struct TemplateStore {
    kv: Arc<dyn KeyValueStore>,
    slots: [String; TEMPLATE_SLOTS],
}

impl TemplateStore {
    /// Load the slots, defaulting to three empty strings
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let slots = match kv.get(LOCAL_NAMESPACE, TEMPLATES_KEY) {
            Ok(Some(text)) => parse_slots(&text).unwrap_or_else(|| {
                warn!("Ignoring malformed template data: {:?}", text);
                empty_slots()
            }),
            Ok(None) => empty_slots(),
            Err(e) => {
                error!("Failed to read templates: {}", e.with_suggestion());
                empty_slots()
            }
        };

        Self { kv, slots }
    }

    /// All slots in order
    pub fn templates(&self) -> &[String; TEMPLATE_SLOTS] {
        &self.slots
    }

    /// One slot, `None` when out of range
    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(String::as_str)
    }

    /// Overwrite a slot
    ///
    /// Returns `false` without touching anything for an out-of-range index.
    pub fn save(&mut self, index: usize, content: impl Into<String>) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        *slot = content.into();
        self.persist();
        true
    }

    /// Empty a slot
    pub fn clear(&mut self, index: usize) -> bool {
        self.save(index, String::new())
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.slots)
            .map_err(crate::storage::StorageError::from)
            .and_then(|text| self.kv.put(LOCAL_NAMESPACE, TEMPLATES_KEY, &text));

        match result {
            Ok(()) => debug!("Saved templates"),
            Err(e) => error!("Failed to save templates: {}", e.with_suggestion()),
        }
    }
}

/// Accept only a JSON array of exactly three strings
fn parse_slots(text: &str) -> Option<[String; TEMPLATE_SLOTS]> {
    let values: Vec<String> = serde_json::from_str(text).ok()?;
    values.try_into().ok()
}

fn empty_slots() -> [String; TEMPLATE_SLOTS] {
    Default::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteKv, StorageError, StorageResult};

    fn memory_kv() -> Arc<dyn KeyValueStore> {
        Arc::new(SqliteKv::open_in_memory().unwrap())
    }

    struct ReadOnlyKv;

    impl KeyValueStore for ReadOnlyKv {
        fn get(&self, _namespace: &str, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn put(&self, _namespace: &str, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("read-only".to_string()))
        }
    }

    #[test]
    fn test_defaults_when_absent() {
        let store = TemplateStore::load(memory_kv());
        assert_eq!(store.templates(), &["", "", ""].map(String::from));
    }

    #[test]
    fn test_malformed_values_fall_back_to_defaults() {
        for bad in [
            "not json",
            r#"["a", "b"]"#,
            r#"["a", "b", "c", "d"]"#,
            r#"["a", 2, "c"]"#,
            r#"{"0": "a"}"#,
        ] {
            let kv = memory_kv();
            kv.put(LOCAL_NAMESPACE, TEMPLATES_KEY, bad).unwrap();

            let store = TemplateStore::load(kv);
            assert_eq!(store.templates(), &empty_slots(), "input: {}", bad);
        }
    }

    #[test]
    fn test_loads_valid_slots() {
        let kv = memory_kv();
        kv.put(LOCAL_NAMESPACE, TEMPLATES_KEY, r#"["朝", "", "夕"]"#)
            .unwrap();

        let store = TemplateStore::load(kv);
        assert_eq!(store.get(0), Some("朝"));
        assert_eq!(store.get(1), Some(""));
        assert_eq!(store.get(2), Some("夕"));
        assert_eq!(store.get(3), None);
    }

    #[test]
    fn test_save_writes_through() {
        let kv = memory_kv();
        let mut store = TemplateStore::load(Arc::clone(&kv));

        assert!(store.save(1, "hello"));
        assert_eq!(store.templates(), &["", "hello", ""].map(String::from));

        let reloaded = TemplateStore::load(kv);
        assert_eq!(reloaded.get(1), Some("hello"));
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let kv = memory_kv();
        let mut store = TemplateStore::load(Arc::clone(&kv));

        assert!(!store.save(3, "x"));
        assert!(!store.clear(7));
        assert_eq!(store.templates(), &empty_slots());
        assert!(kv.get(LOCAL_NAMESPACE, TEMPLATES_KEY).unwrap().is_none());
    }

    #[test]
    fn test_clear() {
        let kv = memory_kv();
        let mut store = TemplateStore::load(Arc::clone(&kv));
        store.save(0, "a");
        store.save(2, "c");

        assert!(store.clear(0));

        let reloaded = TemplateStore::load(kv);
        assert_eq!(reloaded.templates(), &["", "", "c"].map(String::from));
    }

    #[test]
    fn test_write_failure_keeps_memory() {
        let mut store = TemplateStore::load(Arc::new(ReadOnlyKv));
        assert!(store.save(0, "kept"));
        assert_eq!(store.get(0), Some("kept"));
    }
}
