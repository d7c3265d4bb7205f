use std::collections::HashMap;
use std::sync::RwLock;

use super::KeyValueStore;
use super::error::{LockPoisonedSnafu, StorageResult};

/// Process-local store, mostly useful for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| {
            LockPoisonedSnafu {
                stage: "memory-store-get",
            }
            .build()
        })?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| {
            LockPoisonedSnafu {
                stage: "memory-store-set",
            }
            .build()
        })?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("chatHistory").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn set_overwrites_previous_value() {
        let store = MemoryStore::new();
        store.set("chatHistory", "first").unwrap();
        store.set("chatHistory", "second").unwrap();

        assert_eq!(store.get("chatHistory").unwrap().as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }
}
