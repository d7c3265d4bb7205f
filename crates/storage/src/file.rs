use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use snafu::ResultExt;

use super::KeyValueStore;
use super::error::{
    CreateStoreDirectorySnafu, LockPoisonedSnafu, ParseStoreFileSnafu, ReadStoreFileSnafu,
    RenameStoreFileSnafu, SerializeStoreFileSnafu, StorageResult, WriteStoreFileSnafu,
};

/// Key-value store backed by a single JSON object file.
///
/// Every `set` rewrites the whole file through a temporary sibling and a rename, so a crash
/// mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> StorageResult<BTreeMap<String, String>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(source).context(ReadStoreFileSnafu {
                    stage: "json-store-read",
                    path: display_path(&self.path),
                });
            }
        };

        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&text).context(ParseStoreFileSnafu {
            stage: "json-store-parse",
            path: display_path(&self.path),
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context(CreateStoreDirectorySnafu {
                stage: "json-store-create-directory",
                path: display_path(parent),
            })?;
        }

        let content = serde_json::to_string_pretty(entries).context(SerializeStoreFileSnafu {
            stage: "json-store-serialize",
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteStoreFileSnafu {
            stage: "json-store-write-temporary",
            path: display_path(&temp_path),
        })?;

        std::fs::rename(&temp_path, &self.path).context(RenameStoreFileSnafu {
            stage: "json-store-rename-temporary",
            from: display_path(&temp_path),
            to: display_path(&self.path),
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| {
            LockPoisonedSnafu {
                stage: "json-store-set",
            }
            .build()
        })?;

        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)?;

        tracing::trace!(path = %self.path.display(), key, bytes = value.len(), "wrote key-value file");
        Ok(())
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
