use std::sync::Arc;
use std::time::Duration;

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::Config;
use crate::history::CommandHistory;
use crate::services::SnapshotHost;
use crate::store::EntityStore;
use crate::sync::{
    LocalCache, RemoteKind, RemoteStore, SyncHandle, SyncStatus, SyncWorker, Synchronizer,
};
use crate::utils::{AppError, AppResult};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，作为 axum `State` 传递。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | store | 实体存储 |
/// | history | 撤销/重做历史 |
/// | sync_status | 各远程推送状态 |
/// | snapshots | 快照主机文件存储 |
/// | synchronizer | 启动水合 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<EntityStore>,
    pub history: Arc<CommandHistory>,
    pub sync_status: Arc<SyncStatus>,
    pub snapshots: SnapshotHost,
    pub synchronizer: Synchronizer,
    sync_handle: SyncHandle,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

fn build_remotes(config: &Config) -> AppResult<Vec<RemoteStore>> {
    let timeout = Duration::from_millis(config.request_timeout_ms);
    let mut remotes = Vec::new();
    if let Some(url) = &config.primary_snapshot_url {
        remotes.push(RemoteStore::new(RemoteKind::Primary, url.clone(), timeout)?);
    }
    if let Some(url) = &config.mirror_snapshot_url {
        remotes.push(RemoteStore::new(RemoteKind::Mirror, url.clone(), timeout)?);
    }
    Ok(remotes)
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录
    /// 2. 打开 redb 本地缓存，构建远程客户端
    /// 3. 本地缓存水合（同步）
    ///
    /// 远程水合和同步 worker 在 [`start_background_tasks`](Self::start_background_tasks) 中启动。
    pub fn initialize(config: &Config) -> AppResult<Self> {
        std::fs::create_dir_all(&config.work_dir).map_err(|e| {
            AppError::internal(format!("Failed to create work dir {}: {e}", config.work_dir))
        })?;

        let cache = LocalCache::open(config.cache_path())?;
        Self::with_cache(config, cache)
    }

    /// 使用给定的本地缓存构建（测试可传入内存缓存）
    pub fn with_cache(config: &Config, cache: LocalCache) -> AppResult<Self> {
        let remotes = build_remotes(config)?;
        let sync_handle = SyncHandle::new(cache.clone(), &remotes);
        let store = Arc::new(EntityStore::with_persistence(sync_handle.clone()));
        let synchronizer = Synchronizer::new(store.clone(), Some(cache), remotes);

        match synchronizer.hydrate_local() {
            Ok(true) => tracing::info!(
                laptops = store.get_laptops().len(),
                audit_entries = store.audit_log_count(),
                "Local cache loaded"
            ),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Local cache unreadable, starting with an empty store"),
        }

        let history = Arc::new(CommandHistory::with_limit(
            store.clone(),
            config.history_limit,
        ));

        let snapshots = SnapshotHost::new(config.snapshots_dir());
        tracing::debug!(dir = %snapshots.dir().display(), "Snapshot host directory");

        Ok(Self {
            config: config.clone(),
            store,
            history,
            sync_status: Arc::new(SyncStatus::new()),
            snapshots,
            synchronizer,
            sync_handle,
        })
    }

    pub fn cache(&self) -> &LocalCache {
        self.sync_handle.cache()
    }

    /// 启动后台任务
    ///
    /// - 每个远程一个水合任务 (Warmup)
    /// - 同步 outbox worker (Worker)，仅在配置了远程时启动
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        self.synchronizer.spawn_remote_hydration(&mut tasks);

        let remotes = self.synchronizer.remotes().to_vec();
        if remotes.is_empty() {
            tracing::info!("No remote snapshot stores configured, running local-only");
        } else {
            let worker = SyncWorker::new(
                self.cache().clone(),
                remotes,
                self.sync_status.clone(),
                self.config.sync_max_retries,
                Duration::from_millis(self.config.sync_retry_base_ms),
            );
            let changes = self.sync_handle.subscribe();
            let shutdown = tasks.shutdown_token();
            tasks.spawn("sync_worker", TaskKind::Worker, worker.run(changes, shutdown));
        }

        tasks.log_summary();
        tasks
    }
}
