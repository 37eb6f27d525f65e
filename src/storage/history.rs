use std::io;

use indexmap::IndexMap;
use parking_lot::Mutex;
use thiserror::Error;

use super::StorageHandle;
use crate::dream::DreamRecord;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read `{key}` from local storage")]
    Read {
        key: String,
        #[source]
        source: BoxError,
    },
    #[error("`{key}` in local storage is not a record list")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode records for `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write `{key}` to local storage")]
    Write {
        key: String,
        #[source]
        source: BoxError,
    },
}

impl StorageError {
    pub fn is_read_failure(&self) -> bool {
        matches!(self, StorageError::Read { .. } | StorageError::Decode { .. })
    }

    pub fn is_write_failure(&self) -> bool {
        !self.is_read_failure()
    }
}

/// Source of truth for the history list. Reads and writes are always whole-list.
pub trait HistoryRepository {
    /// An absent key loads as an empty list.
    fn load(&self) -> Result<Vec<DreamRecord>, StorageError>;
    fn save(&self, records: &[DreamRecord]) -> Result<(), StorageError>;
}

/// History list serialized as JSON under one key of the local store.
#[derive(Clone)]
pub struct HistoryStore {
    storage: StorageHandle,
    key: String,
}

impl HistoryStore {
    pub fn new(storage: StorageHandle, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl HistoryRepository for HistoryStore {
    fn load(&self) -> Result<Vec<DreamRecord>, StorageError> {
        let raw = self
            .storage
            .get_item(&self.key)
            .map_err(|err| StorageError::Read {
                key: self.key.clone(),
                source: err.into(),
            })?;
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| StorageError::Decode {
            key: self.key.clone(),
            source,
        })
    }

    fn save(&self, records: &[DreamRecord]) -> Result<(), StorageError> {
        let json = serde_json::to_string(records).map_err(|source| StorageError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.storage
            .set_item(&self.key, &json)
            .map_err(|err| StorageError::Write {
                key: self.key.clone(),
                source: err.into(),
            })?;
        tracing::debug!(key = %self.key, count = records.len(), "history saved");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<DreamRecord>,
    fail_reads: bool,
    fail_writes: bool,
    saves: usize,
}

/// In-memory repository with switchable read/write failures.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    state: Mutex<MemoryState>,
}

impl MemoryHistory {
    pub fn new(records: Vec<DreamRecord>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                records,
                ..MemoryState::default()
            }),
        }
    }

    pub fn snapshot(&self) -> Vec<DreamRecord> {
        self.state.lock().records.clone()
    }

    /// Overwrites the stored list without counting as a save, like another writer would.
    pub fn replace(&self, records: Vec<DreamRecord>) {
        self.state.lock().records = records;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().saves
    }
}

impl HistoryRepository for MemoryHistory {
    fn load(&self) -> Result<Vec<DreamRecord>, StorageError> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(StorageError::Read {
                key: "memory".into(),
                source: io::Error::new(io::ErrorKind::Other, "simulated read failure").into(),
            });
        }
        Ok(state.records.clone())
    }

    fn save(&self, records: &[DreamRecord]) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(StorageError::Write {
                key: "memory".into(),
                source: io::Error::new(io::ErrorKind::Other, "simulated write failure").into(),
            });
        }
        state.records = records.to_vec();
        state.saves += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub replaced: usize,
}

/// Merges imported records into the history. An incoming record replaces, in place,
/// the first stored record carrying the same non-blank id; anything else is appended
/// in import order, with a fresh id when it had none. Stored records are never
/// collapsed into each other.
pub fn merge_records(
    existing: Vec<DreamRecord>,
    incoming: Vec<DreamRecord>,
) -> (Vec<DreamRecord>, ImportSummary) {
    let mut merged = existing;
    let mut positions: IndexMap<String, usize> = IndexMap::new();
    for (index, record) in merged.iter().enumerate() {
        if !record.id.is_blank() {
            positions.entry(record.id.to_string()).or_insert(index);
        }
    }

    let mut summary = ImportSummary::default();
    for mut record in incoming {
        if record.id.is_blank() {
            record.id = uuid::Uuid::new_v4().to_string().into();
        }
        match positions.get(record.id.as_str()) {
            Some(&index) => {
                merged[index] = record;
                summary.replaced += 1;
            }
            None => {
                positions.insert(record.id.to_string(), merged.len());
                merged.push(record);
                summary.added += 1;
            }
        }
    }
    (merged, summary)
}
