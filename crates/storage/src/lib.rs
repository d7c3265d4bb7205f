pub mod error;
pub mod file;
pub mod memory;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use error::{StorageError, StorageResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// String-keyed string store. Values are opaque blobs to the store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Json,
    Sqlite,
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Opens the configured backend. `path` is ignored for the memory backend.
pub fn open_store(backend: StorageBackend, path: &Path) -> StorageResult<Arc<dyn KeyValueStore>> {
    tracing::debug!(backend = backend.name(), path = %path.display(), "opening key-value store");

    let store: Arc<dyn KeyValueStore> = match backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Json => Arc::new(JsonFileStore::new(path.to_path_buf())),
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(&path.display().to_string())?),
    };

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_match_serialized_form() {
        for backend in [
            StorageBackend::Memory,
            StorageBackend::Json,
            StorageBackend::Sqlite,
        ] {
            let serialized = serde_json::to_string(&backend).unwrap();
            assert_eq!(serialized, format!("\"{}\"", backend.name()));
        }
    }

    #[test]
    fn open_store_dispatches_to_each_backend() {
        let dir = tempfile::tempdir().unwrap();

        let memory = open_store(StorageBackend::Memory, dir.path()).unwrap();
        memory.set("chatHistory", "[]").unwrap();
        assert_eq!(memory.get("chatHistory").unwrap().as_deref(), Some("[]"));

        let json_path = dir.path().join("store.json");
        let json = open_store(StorageBackend::Json, &json_path).unwrap();
        json.set("chatHistory", "[1]").unwrap();
        assert!(json_path.exists());

        let sqlite_path = dir.path().join("store.sqlite");
        let sqlite = open_store(StorageBackend::Sqlite, &sqlite_path).unwrap();
        sqlite.set("chatHistory", "[2]").unwrap();
        assert_eq!(sqlite.get("chatHistory").unwrap().as_deref(), Some("[2]"));
    }
}
