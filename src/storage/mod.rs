use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::config::StorageOptions;

mod history;
mod schema;

pub use history::{
    merge_records, HistoryRepository, HistoryStore, ImportSummary, MemoryHistory, StorageError,
};

pub const DEFAULT_HISTORY_KEY: &str = "dreamHistory";

/// Local key-value storage backed by a single SQLite table.
#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            conn.query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("reading key `{key}`"))
        })
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .with_context(|| format!("writing key `{key}`"))?;
            Ok(())
        })
    }

    pub fn remove_item(&self, key: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let removed = conn
                .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .with_context(|| format!("removing key `{key}`"))?;
            Ok(removed > 0)
        })
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT key FROM kv_store ORDER BY key")
                .context("preparing key listing")?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("listing keys")?;
            Ok(keys)
        })
    }

    /// Record repository over the configured history key.
    pub fn history(&self) -> HistoryStore {
        HistoryStore::new(self.clone(), self.options.history_key.clone())
    }
}

pub fn init(storage: &StorageOptions) -> Result<StorageHandle> {
    let db_path = &storage.database_path;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, storage)?;
    schema::apply(&conn)?;
    tracing::debug!(path = %db_path.display(), "local storage ready");
    Ok(StorageHandle {
        db_path: Arc::new(db_path.clone()),
        options: Arc::new(storage.clone()),
    })
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ConfigPaths;
    use tempfile::TempDir;

    pub(crate) fn init_storage() -> anyhow::Result<(TempDir, StorageHandle)> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::under(temp.path());
        paths.ensure_directories()?;
        let mut options = StorageOptions::default();
        options.database_path = paths.database_path.clone();
        let storage = init(&options)?;
        Ok((temp, storage))
    }

    #[test]
    fn missing_key_reads_as_none() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        assert_eq!(storage.get_item("dreamHistory")?, None);
        assert!(storage.keys()?.is_empty());
        Ok(())
    }

    #[test]
    fn set_item_overwrites_wholesale() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        storage.set_item("dreamHistory", "[1,2,3]")?;
        storage.set_item("dreamHistory", "[]")?;
        assert_eq!(storage.get_item("dreamHistory")?.as_deref(), Some("[]"));
        assert_eq!(storage.keys()?, vec!["dreamHistory".to_string()]);
        Ok(())
    }

    #[test]
    fn remove_item_reports_whether_key_existed() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        storage.set_item("scratch", "x")?;
        assert!(storage.remove_item("scratch")?);
        assert!(!storage.remove_item("scratch")?);
        Ok(())
    }

    #[test]
    fn values_survive_reopening() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        storage.set_item("dreamHistory", "[]")?;
        let reopened = StorageHandle {
            db_path: Arc::new(storage.database_path().to_path_buf()),
            options: Arc::new(StorageOptions::default()),
        };
        assert_eq!(reopened.get_item("dreamHistory")?.as_deref(), Some("[]"));
        Ok(())
    }
}
