//! SyncWorker - 远程推送 outbox 处理
//!
//! 被 `watch` 通道唤醒（每次变更），另有定时扫描兜底。每个远程的推送
//! 都发送本地缓存中的最新文档，失败指数退避重试，耗尽后进入死信。
//!
//! redb 操作是同步的；网络请求不持有任何存储锁。

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::cache::{LocalCache, PendingSync};
use super::remote::RemoteStore;
use super::status::SyncStatus;

/// 定时扫描间隔（兜底，正常由变更通知驱动）
const QUEUE_SCAN_INTERVAL_SECS: u64 = 30;
const RETRY_MAX_DELAY_SECS: u64 = 60;

pub struct SyncWorker {
    cache: LocalCache,
    remotes: Vec<RemoteStore>,
    status: Arc<SyncStatus>,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl SyncWorker {
    pub fn new(
        cache: LocalCache,
        remotes: Vec<RemoteStore>,
        status: Arc<SyncStatus>,
        max_retries: u32,
        retry_base_delay: Duration,
    ) -> Self {
        Self {
            cache,
            remotes,
            status,
            max_retries: max_retries.max(1),
            retry_base_delay,
        }
    }

    /// 运行直到 shutdown
    ///
    /// 1. 死信重新入队
    /// 2. 处理启动前遗留的 outbox
    /// 3. 等待变更通知 / 定时扫描
    pub async fn run(self, mut changes: watch::Receiver<u64>, shutdown: CancellationToken) {
        tracing::info!(remotes = self.remotes.len(), "SyncWorker started");

        match self.cache.recover_dead_letters() {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "Recovered sync dead letters to pending queue"),
            Err(e) => tracing::error!(error = %e, "Failed to recover sync dead letters"),
        }

        self.drain().await;

        let mut scan = tokio::time::interval(Duration::from_secs(QUEUE_SCAN_INTERVAL_SECS));
        scan.tick().await; // skip immediate tick

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("SyncWorker shutting down");
                    break;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        tracing::info!("Change channel closed, SyncWorker stopping");
                        break;
                    }
                    self.drain().await;
                }
                _ = scan.tick() => {
                    self.drain().await;
                }
            }
        }

        tracing::info!("SyncWorker stopped");
    }

    /// 处理当前所有 pending 记录（各远程并发）
    pub async fn drain(&self) {
        let pending = match self.cache.pending() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read sync outbox");
                return;
            }
        };
        if pending.is_empty() {
            return;
        }

        let jobs = pending.into_iter().filter_map(|entry| {
            match self.remotes.iter().find(|r| r.name() == entry.remote) {
                Some(remote) => Some(self.process(remote, entry)),
                None => {
                    tracing::warn!(remote = %entry.remote, "Outbox entry for unconfigured remote, skipping");
                    None
                }
            }
        });
        join_all(jobs).await;
    }

    async fn process(&self, remote: &RemoteStore, entry: PendingSync) {
        let name = remote.name();
        match self.push_with_retry(remote).await {
            Ok(()) => {
                match self.cache.clear_pending_if(name, entry.version) {
                    Ok(true) => {}
                    Ok(false) => tracing::debug!(
                        remote = name,
                        version = entry.version,
                        "Newer version enqueued during push, keeping outbox entry"
                    ),
                    Err(e) => tracing::error!(remote = name, error = %e, "Failed to clear outbox entry"),
                }
                self.status.record_success(name, entry.version);
                tracing::debug!(remote = name, version = entry.version, "Snapshot pushed");
            }
            Err(error) => {
                tracing::error!(
                    remote = name,
                    version = entry.version,
                    max_retries = self.max_retries,
                    error = %error,
                    "Snapshot push failed permanently, moving to dead letter queue"
                );
                if let Err(e) = self.cache.move_to_dead_letter(name, &error) {
                    tracing::error!(remote = name, error = %e, "Failed to move outbox entry to dead letter");
                }
                self.status.record_failure(name, &error);
            }
        }
    }

    async fn push_with_retry(&self, remote: &RemoteStore) -> Result<(), String> {
        let mut delay = self.retry_base_delay;

        for attempt in 0..self.max_retries {
            // always the newest cached document
            let doc = match self.cache.load() {
                Ok(Some(doc)) => doc,
                Ok(None) => return Ok(()),
                Err(e) => return Err(format!("local cache read failed: {e}")),
            };
            match remote.push(&doc).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt + 1 < self.max_retries => {
                    let message = e.to_string();
                    tracing::warn!(
                        remote = remote.name(),
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Snapshot push failed, retrying: {message}"
                    );
                    if let Err(e) = self.cache.record_attempt(remote.name(), &message) {
                        tracing::error!(error = %e, "Failed to record push attempt");
                    }
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(RETRY_MAX_DELAY_SECS));
                }
                Err(e) => {
                    let message = e.to_string();
                    if let Err(e) = self.cache.record_attempt(remote.name(), &message) {
                        tracing::error!(error = %e, "Failed to record push attempt");
                    }
                    return Err(message);
                }
            }
        }

        Err("no push attempts were made".to_string())
    }
}
