//! Per-remote sync health, exposed through `GET /api/sync/status`

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;

/// Last observed outcome for one remote
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemoteSyncState {
    pub remote: String,
    pub last_success_at: Option<i64>,
    pub last_pushed_version: Option<u64>,
    pub last_failure_at: Option<i64>,
    pub last_error: Option<String>,
    /// Pushes moved to the dead letter table since startup
    pub dead_letters: u64,
}

#[derive(Debug, Default)]
pub struct SyncStatus {
    remotes: RwLock<BTreeMap<String, RemoteSyncState>>,
}

impl SyncStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, remote: &str, version: u64) {
        let mut remotes = self.remotes.write();
        let entry = Self::entry(&mut remotes, remote);
        entry.last_success_at = Some(shared::util::now_millis());
        entry.last_pushed_version = Some(version);
    }

    pub fn record_failure(&self, remote: &str, error: &str) {
        let mut remotes = self.remotes.write();
        let entry = Self::entry(&mut remotes, remote);
        entry.last_failure_at = Some(shared::util::now_millis());
        entry.last_error = Some(error.to_string());
        entry.dead_letters += 1;
    }

    pub fn get(&self, remote: &str) -> Option<RemoteSyncState> {
        self.remotes.read().get(remote).cloned()
    }

    pub fn snapshot(&self) -> Vec<RemoteSyncState> {
        self.remotes.read().values().cloned().collect()
    }

    fn entry<'a>(
        remotes: &'a mut BTreeMap<String, RemoteSyncState>,
        remote: &str,
    ) -> &'a mut RemoteSyncState {
        remotes
            .entry(remote.to_string())
            .or_insert_with(|| RemoteSyncState {
                remote: remote.to_string(),
                ..Default::default()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_and_failure_are_tracked_per_remote() {
        let status = SyncStatus::new();
        status.record_success("primary", 4);
        status.record_failure("mirror", "connection refused");

        let primary = status.get("primary").unwrap();
        assert_eq!(primary.last_pushed_version, Some(4));
        assert!(primary.last_error.is_none());

        let mirror = status.get("mirror").unwrap();
        assert_eq!(mirror.dead_letters, 1);
        assert_eq!(mirror.last_error.as_deref(), Some("connection refused"));
        assert_eq!(status.snapshot().len(), 2);
    }
}
