//! 启动水合
//!
//! 1. 本地缓存 → 内存（同步）
//! 2. 主远程 / 镜像 → 内存（各自独立的后台任务，后到者生效）
//!
//! 远程失败只记 warn，不影响启动。

use std::sync::Arc;

use super::cache::{CacheResult, LocalCache};
use super::remote::{RemoteKind, RemoteStore, SyncResult};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::store::EntityStore;

#[derive(Clone)]
pub struct Synchronizer {
    store: Arc<EntityStore>,
    cache: Option<LocalCache>,
    remotes: Vec<RemoteStore>,
}

impl Synchronizer {
    pub fn new(store: Arc<EntityStore>, cache: Option<LocalCache>, remotes: Vec<RemoteStore>) -> Self {
        Self {
            store,
            cache,
            remotes,
        }
    }

    pub fn remotes(&self) -> &[RemoteStore] {
        &self.remotes
    }

    /// 从本地缓存加载；返回是否找到缓存文档
    pub fn hydrate_local(&self) -> CacheResult<bool> {
        let Some(cache) = &self.cache else {
            return Ok(false);
        };
        match cache.load()? {
            Some(doc) => {
                self.store.load_document(doc);
                Ok(true)
            }
            None => {
                tracing::info!("Local cache is empty, starting with an empty store");
                Ok(false)
            }
        }
    }

    /// 拉取一个远程并按其规则应用
    pub async fn hydrate_from(&self, remote: &RemoteStore) -> SyncResult<()> {
        let doc = remote.fetch().await?;
        match remote.kind() {
            RemoteKind::Primary => self.store.apply_primary(doc),
            RemoteKind::Mirror => {
                self.store.apply_mirror(doc);
            }
        }
        Ok(())
    }

    /// 依次拉取所有远程（测试与工具使用；失败只记录）
    pub async fn hydrate_remotes(&self) {
        for remote in &self.remotes {
            self.hydrate_logged(remote).await;
        }
    }

    async fn hydrate_logged(&self, remote: &RemoteStore) {
        match self.hydrate_from(remote).await {
            Ok(()) => tracing::info!(remote = remote.name(), "Remote hydration applied"),
            Err(e) => tracing::warn!(
                remote = remote.name(),
                url = remote.url(),
                error = %e,
                "Remote hydration failed, keeping current data"
            ),
        }
    }

    /// 为每个远程启动一个独立的水合任务，不等待结果
    pub fn spawn_remote_hydration(&self, tasks: &mut BackgroundTasks) {
        for remote in self.remotes.iter().cloned() {
            let this = self.clone();
            let name = match remote.kind() {
                RemoteKind::Primary => "hydrate_primary",
                RemoteKind::Mirror => "hydrate_mirror",
            };
            tasks.spawn(name, TaskKind::Warmup, async move {
                this.hydrate_logged(&remote).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Editable, Laptop, LaptopCreate};
    use shared::StoreDocument;

    #[test]
    fn test_hydrate_local_loads_cached_document() {
        let cache = LocalCache::open_in_memory().unwrap();
        let doc = StoreDocument {
            laptops: vec![Laptop::from_create(
                4,
                LaptopCreate {
                    brand: "MSI".to_string(),
                    model: "Prestige".to_string(),
                    price: 999.0,
                    cost: 700.0,
                    quantity: 2,
                    ..Default::default()
                },
                0,
            )],
            ..Default::default()
        };
        cache.save(&doc).unwrap();

        let store = Arc::new(EntityStore::in_memory());
        let sync = Synchronizer::new(store.clone(), Some(cache), Vec::new());
        assert!(sync.hydrate_local().unwrap());
        assert_eq!(store.get_laptop(4).unwrap().brand, "MSI");
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn test_hydrate_local_without_cache() {
        let store = Arc::new(EntityStore::in_memory());
        let sync = Synchronizer::new(store, None, Vec::new());
        assert!(!sync.hydrate_local().unwrap());
    }
}
