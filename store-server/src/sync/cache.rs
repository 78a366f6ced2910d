//! redb-backed local cache and sync outbox
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `snapshot` | `"laptop-store-data"` | `StoreDocument` | Local durable copy |
//! | `pending_sync` | remote name | `PendingSync` | Outbox, one row per remote |
//! | `sync_dead_letter` | remote name | `DeadLetterEntry` | Pushes that exhausted retries |
//!
//! The snapshot and its outbox rows are written in one transaction, so a
//! crash can never leave a newer snapshot without a pending push.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::StoreDocument;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Snapshot table: key = fixed document key, value = JSON-serialized StoreDocument
const SNAPSHOT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshot");

/// Outbox: key = remote name, value = JSON-serialized PendingSync
const PENDING_SYNC_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("pending_sync");

/// Dead letters: key = remote name, value = JSON-serialized DeadLetterEntry
const DEAD_LETTER_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sync_dead_letter");

/// Fixed key the whole document is stored under
pub const DOCUMENT_KEY: &str = "laptop-store-data";

/// Outbox entry: the remote still needs a push of at least `version`
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PendingSync {
    pub remote: String,
    pub version: u64,
    pub enqueued_at: i64,
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Dead letter entry (push permanently failed)
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeadLetterEntry {
    pub remote: String,
    pub version: u64,
    pub enqueued_at: i64,
    pub failed_at: i64,
    pub attempts: u32,
    pub last_error: String,
}

/// Local cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Local durable cache backed by redb
#[derive(Clone)]
pub struct LocalCache {
    db: Arc<Database>,
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache").finish_non_exhaustive()
    }
}

impl LocalCache {
    /// Open or create the cache database at the given path
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> CacheResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> CacheResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SNAPSHOT_TABLE)?;
            let _ = write_txn.open_table(PENDING_SYNC_TABLE)?;
            let _ = write_txn.open_table(DEAD_LETTER_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    // ========== Snapshot ==========

    /// Read the cached document (`None` when nothing was saved yet)
    pub fn load(&self) -> CacheResult<Option<StoreDocument>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOT_TABLE)?;
        match table.get(DOCUMENT_KEY)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Overwrite the cached document without touching the outbox
    pub fn save(&self, doc: &StoreDocument) -> CacheResult<()> {
        let value = serde_json::to_vec(doc)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SNAPSHOT_TABLE)?;
            table.insert(DOCUMENT_KEY, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Overwrite the cached document and enqueue a push for every remote
    ///
    /// An existing outbox row for a remote is replaced: only the newest
    /// version matters, the push always sends the latest cached document.
    pub fn save_and_enqueue(
        &self,
        doc: &StoreDocument,
        version: u64,
        remotes: &[String],
    ) -> CacheResult<()> {
        let value = serde_json::to_vec(doc)?;
        let now = shared::util::now_millis();
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SNAPSHOT_TABLE)?;
            table.insert(DOCUMENT_KEY, value.as_slice())?;

            let mut pending_table = txn.open_table(PENDING_SYNC_TABLE)?;
            for remote in remotes {
                let pending = PendingSync {
                    remote: remote.clone(),
                    version,
                    enqueued_at: now,
                    attempts: 0,
                    last_error: None,
                };
                let value = serde_json::to_vec(&pending)?;
                pending_table.insert(remote.as_str(), value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Outbox ==========

    /// All pending outbox rows
    pub fn pending(&self) -> CacheResult<Vec<PendingSync>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_SYNC_TABLE)?;

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let pending: PendingSync = serde_json::from_slice(value.value())?;
            entries.push(pending);
        }
        Ok(entries)
    }

    /// Remove the outbox row for `remote` if it still carries `version`.
    ///
    /// Returns false when a newer mutation re-enqueued the remote meanwhile;
    /// that row stays for the next push.
    pub fn clear_pending_if(&self, remote: &str, version: u64) -> CacheResult<bool> {
        let txn = self.db.begin_write()?;
        let cleared = {
            let mut table = txn.open_table(PENDING_SYNC_TABLE)?;
            let current = match table.get(remote)? {
                Some(value) => Some(serde_json::from_slice::<PendingSync>(value.value())?),
                None => None,
            };
            match current {
                Some(pending) if pending.version == version => {
                    table.remove(remote)?;
                    true
                }
                _ => false,
            }
        };
        txn.commit()?;
        Ok(cleared)
    }

    /// Record a failed attempt on the outbox row
    pub fn record_attempt(&self, remote: &str, error: &str) -> CacheResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PENDING_SYNC_TABLE)?;
            let current = match table.get(remote)? {
                Some(value) => Some(serde_json::from_slice::<PendingSync>(value.value())?),
                None => None,
            };
            if let Some(mut pending) = current {
                pending.attempts += 1;
                pending.last_error = Some(error.to_string());
                let value = serde_json::to_vec(&pending)?;
                table.insert(remote, value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Dead letters ==========

    /// Move the outbox row for `remote` to the dead letter table
    pub fn move_to_dead_letter(&self, remote: &str, error: &str) -> CacheResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut pending_table = txn.open_table(PENDING_SYNC_TABLE)?;
            let mut dead_letter_table = txn.open_table(DEAD_LETTER_TABLE)?;

            let pending_opt = match pending_table.get(remote)? {
                Some(value) => Some(serde_json::from_slice::<PendingSync>(value.value())?),
                None => None,
            };

            if let Some(pending) = pending_opt {
                let dead_letter = DeadLetterEntry {
                    remote: pending.remote,
                    version: pending.version,
                    enqueued_at: pending.enqueued_at,
                    failed_at: shared::util::now_millis(),
                    attempts: pending.attempts,
                    last_error: error.to_string(),
                };
                let value = serde_json::to_vec(&dead_letter)?;
                dead_letter_table.insert(remote, value.as_slice())?;
                pending_table.remove(remote)?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// All dead letter entries
    pub fn dead_letters(&self) -> CacheResult<Vec<DeadLetterEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DEAD_LETTER_TABLE)?;

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let entry: DeadLetterEntry = serde_json::from_slice(value.value())?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Move every dead letter back to the outbox with a fresh attempt count.
    ///
    /// A remote that already has a newer pending row keeps that row.
    pub fn recover_dead_letters(&self) -> CacheResult<usize> {
        let txn = self.db.begin_write()?;
        let count = {
            let mut pending_table = txn.open_table(PENDING_SYNC_TABLE)?;
            let mut dead_letter_table = txn.open_table(DEAD_LETTER_TABLE)?;

            let mut dead = Vec::new();
            for result in dead_letter_table.iter()? {
                let (_key, value) = result?;
                dead.push(serde_json::from_slice::<DeadLetterEntry>(value.value())?);
            }

            let now = shared::util::now_millis();
            for entry in &dead {
                if pending_table.get(entry.remote.as_str())?.is_none() {
                    let pending = PendingSync {
                        remote: entry.remote.clone(),
                        version: entry.version,
                        enqueued_at: now,
                        attempts: 0,
                        last_error: None,
                    };
                    let value = serde_json::to_vec(&pending)?;
                    pending_table.insert(entry.remote.as_str(), value.as_slice())?;
                }
                dead_letter_table.remove(entry.remote.as_str())?;
            }
            dead.len()
        };
        txn.commit()?;
        Ok(count)
    }
}
