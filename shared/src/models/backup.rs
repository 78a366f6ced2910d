//! Backup metadata Model

use serde::{Deserialize, Serialize};

use super::record::{Record, Table};
use super::AuditSnapshot;
use crate::document::StoreDocument;

/// Backup metadata (no byte artifact is kept by the store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub id: i64,
    /// `<prefix>-backup-<timestamp>.json`
    pub filename: String,
    pub created_at: i64,
    /// Serialized document size in bytes
    pub size: u64,
    pub records_count: u64,
    #[serde(default)]
    pub description: Option<String>,
}

impl Backup {
    pub fn filename_for(prefix: &str, timestamp_ms: i64) -> String {
        format!(
            "{}-backup-{}.json",
            prefix,
            crate::util::file_timestamp(timestamp_ms)
        )
    }
}

impl Record for Backup {
    const TABLE: Table = Table::Backups;

    fn id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> AuditSnapshot {
        AuditSnapshot::Backup(self.clone())
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.backups
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.backups
    }
}
