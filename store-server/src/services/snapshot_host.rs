//! 快照主机的文件存储
//!
//! 每个槽位一个 JSON 文件：`<dir>/primary.json`、`<dir>/mirror.json`。
//! 写入先落临时文件再 rename，读方不会看到半个文档。

use serde::Deserialize;
use shared::StoreDocument;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::utils::{AppError, AppResult};

/// 快照槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Primary,
    Mirror,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Primary => "primary",
            Slot::Mirror => "mirror",
        }
    }
}

impl FromStr for Slot {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Slot::Primary),
            "mirror" => Ok(Slot::Mirror),
            other => Err(AppError::not_found(format!("snapshot slot '{other}'"))),
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotHost {
    dir: PathBuf,
}

impl SnapshotHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, slot: Slot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.as_str()))
    }

    /// 原始文件内容；文件不存在返回 `None`
    pub async fn read_raw(&self, slot: Slot) -> AppResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(slot)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::internal(format!(
                "Failed to read snapshot {slot}: {e}"
            ))),
        }
    }

    /// 替换槽位文档，返回写入的字节数
    ///
    /// 每次写入使用独立的临时文件，并发写入同一槽位时最后一次 rename 生效。
    pub async fn write(&self, slot: Slot, doc: &StoreDocument) -> AppResult<u64> {
        let bytes = serde_json::to_vec(doc)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create snapshot dir: {e}")))?;

        let target = self.path(slot);
        let tmp = self
            .dir
            .join(format!(".{}.{}.json.tmp", slot.as_str(), uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::internal(format!(
                "Failed to write snapshot {slot}: {e}"
            )));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::internal(format!(
                "Failed to commit snapshot {slot}: {e}"
            )));
        }

        tracing::debug!(slot = %slot, bytes = bytes.len(), "Snapshot stored");
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_parsing() {
        assert_eq!("primary".parse::<Slot>().unwrap(), Slot::Primary);
        assert_eq!("mirror".parse::<Slot>().unwrap(), Slot::Mirror);
        assert!(matches!(
            "backup".parse::<Slot>().unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_slot_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let host = SnapshotHost::new(dir.path().join("snapshots"));
        assert!(host.read_raw(Slot::Primary).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let host = SnapshotHost::new(dir.path().join("snapshots"));
        let doc = StoreDocument::default();
        let written = host.write(Slot::Mirror, &doc).await.unwrap();
        assert!(written > 0);
        let bytes = host.read_raw(Slot::Mirror).await.unwrap().unwrap();
        assert_eq!(serde_json::from_slice::<StoreDocument>(&bytes).unwrap(), doc);
        assert!(host.read_raw(Slot::Primary).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_one_slot_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let host = SnapshotHost::new(dir.path().join("snapshots"));
        let doc = StoreDocument::default();

        for _ in 0..5 {
            let writes = (0..16).map(|_| {
                let host = host.clone();
                let doc = doc.clone();
                tokio::spawn(async move { host.write(Slot::Primary, &doc).await })
            });
            for result in futures::future::join_all(writes).await {
                assert!(result.unwrap().is_ok());
            }
        }

        let bytes = host.read_raw(Slot::Primary).await.unwrap().unwrap();
        assert_eq!(serde_json::from_slice::<StoreDocument>(&bytes).unwrap(), doc);

        // no temp files left behind
        let mut entries = tokio::fs::read_dir(host.dir()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["primary.json".to_string()]);
    }
}
