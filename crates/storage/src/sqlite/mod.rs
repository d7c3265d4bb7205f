use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use snafu::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Connection, SqliteConnection};

use super::KeyValueStore;
use super::error::{
    CreateStoreDirectorySnafu, SqliteConnectOptionsSnafu, SqliteConnectSnafu, SqlitePragmaSnafu,
    SqliteQuerySnafu, SqliteRuntimeInitSnafu, SqliteThreadSpawnSnafu, SqliteWorkerSnafu,
    StorageResult,
};

const CREATE_KV_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv_entries (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
)";

/// Key-value store persisted in a SQLite database file.
///
/// Each call opens its own connection on a worker thread, so an in-memory
/// database would not survive between calls; pass a file path or `sqlite:` URL.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    database_url: String,
}

impl SqliteStore {
    pub fn open(database_location: &str) -> StorageResult<Self> {
        ensure_database_directory(database_location)?;

        let store = Self {
            database_url: normalize_database_url(database_location),
        };
        let database_url = store.database_url.clone();
        store.run_db_call("sqlite-open-schema", async move {
            let mut connection = connect_store_connection(&database_url, "sqlite-open-connect").await?;

            // Explicit PRAGMA write keeps the journal mode stable across reopen.
            let _: String = sqlx::query_scalar("PRAGMA journal_mode = WAL;")
                .fetch_one(&mut connection)
                .await
                .context(SqlitePragmaSnafu {
                    stage: "sqlite-open-pragma-journal-mode",
                    pragma: "journal_mode",
                })?;

            sqlx::query(CREATE_KV_TABLE)
                .execute(&mut connection)
                .await
                .context(SqliteQuerySnafu {
                    stage: "sqlite-open-create-table",
                })?;
            Ok(())
        })?;

        tracing::debug!(database_url = %store.database_url, "sqlite key-value store ready");
        Ok(store)
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    fn run_db_call<T, F>(&self, stage: &'static str, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: Future<Output = StorageResult<T>> + Send + 'static,
    {
        // Store traits are sync, so each call executes on a dedicated worker thread
        // with its own current-thread runtime to avoid nested-runtime blocking panics.
        let worker = std::thread::Builder::new()
            .name(format!("sqlite-kv-{stage}"))
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context(SqliteRuntimeInitSnafu {
                        stage: "sqlite-kv-runtime-build",
                    })?;
                runtime.block_on(op)
            })
            .context(SqliteThreadSpawnSnafu {
                stage: "sqlite-kv-spawn-worker",
            })?;

        match worker.join() {
            Ok(result) => result,
            Err(_) => SqliteWorkerSnafu {
                stage,
                details: "sqlite storage worker thread panicked".to_string(),
            }
            .fail(),
        }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let database_url = self.database_url.clone();
        let key = key.to_string();
        self.run_db_call("kv-get", async move {
            let mut connection = connect_store_connection(&database_url, "kv-get-connect").await?;
            sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE key = ?")
                .bind(key)
                .fetch_optional(&mut connection)
                .await
                .context(SqliteQuerySnafu {
                    stage: "kv-get-select",
                })
        })
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let database_url = self.database_url.clone();
        let key = key.to_string();
        let value = value.to_string();
        self.run_db_call("kv-set", async move {
            let mut connection = connect_store_connection(&database_url, "kv-set-connect").await?;
            sqlx::query(
                "INSERT INTO kv_entries (key, value, updated_at) VALUES (?, ?, ?) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(unix_timestamp_seconds())
            .execute(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "kv-set-upsert",
            })?;
            Ok(())
        })
    }
}

async fn connect_store_connection(
    database_url: &str,
    stage: &'static str,
) -> StorageResult<SqliteConnection> {
    let connect_options = SqliteConnectOptions::from_str(database_url)
        .context(SqliteConnectOptionsSnafu {
            stage,
            database_url: database_url.to_string(),
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5_000));

    SqliteConnection::connect_with(&connect_options)
        .await
        .context(SqliteConnectSnafu {
            stage,
            database_url: database_url.to_string(),
        })
}

fn unix_timestamp_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs() as i64)
}

fn ensure_database_directory(database_location: &str) -> StorageResult<()> {
    if database_location.starts_with("sqlite:") {
        return Ok(());
    }

    let path = Path::new(database_location);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context(CreateStoreDirectorySnafu {
            stage: "sqlite-open-create-directory",
            path: parent.display().to_string(),
        })?;
    }

    Ok(())
}

fn normalize_database_url(database_location: &str) -> String {
    if database_location.starts_with("sqlite:") {
        return database_location.to_string();
    }

    format!("sqlite://{database_location}")
}
