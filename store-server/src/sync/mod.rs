//! Persistence synchronizer
//!
//! ```text
//! EntityStore mutation (write lock held)
//!   └─ SyncHandle::persist()
//!        ├─ redb: snapshot + pending_sync rows (one transaction)
//!        └─ watch::send(version) ──▶ SyncWorker
//!                                     ├─ push latest snapshot to each remote (retry/backoff)
//!                                     ├─ success → clear row (if version unchanged)
//!                                     └─ failure → sync_dead_letter + SyncStatus
//!
//! Startup
//!   ├─ hydrate_local()          local cache → memory (blocking)
//!   └─ spawn_remote_hydration() primary: overwrite / mirror: non-empty override
//! ```

pub mod cache;
pub mod hydrate;
pub mod remote;
pub mod status;
pub mod worker;

pub use cache::{CacheError, CacheResult, DeadLetterEntry, LocalCache, PendingSync};
pub use hydrate::Synchronizer;
pub use remote::{RemoteKind, RemoteStore, SyncError, SyncResult};
pub use status::{RemoteSyncState, SyncStatus};
pub use worker::SyncWorker;

use shared::StoreDocument;
use tokio::sync::watch;

/// Save path handed to the store
///
/// Writes are synchronous (redb); the network side is only signalled.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    cache: LocalCache,
    remotes: Vec<String>,
    notify: watch::Sender<u64>,
}

impl SyncHandle {
    pub fn new(cache: LocalCache, remotes: &[RemoteStore]) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            cache,
            remotes: remotes.iter().map(|r| r.name().to_string()).collect(),
            notify,
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Persist a mutation: snapshot + outbox, then wake the worker
    pub fn persist(&self, doc: &StoreDocument, version: u64) -> CacheResult<()> {
        self.cache.save_and_enqueue(doc, version, &self.remotes)?;
        if !self.remotes.is_empty() {
            self.notify.send_replace(version);
        }
        Ok(())
    }

    /// Persist to the local cache only (remote hydration results)
    pub fn persist_local(&self, doc: &StoreDocument) -> CacheResult<()> {
        self.cache.save(doc)
    }

    /// Change notifications for the worker
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }
}
