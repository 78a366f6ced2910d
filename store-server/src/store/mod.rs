//! EntityStore - 进程内实体存储
//!
//! 持有全部领域集合，所有变更在同一把写锁内完成：
//!
//! ```text
//! mutate(|m| ...)
//!   ├─ 修改集合（先校验，后修改）
//!   ├─ m.audit(...) 追加审计条目
//!   └─ dirty → SyncHandle::persist()（redb 快照 + outbox）
//! ```
//!
//! 读取接口一律返回拷贝。整体替换（远程水合、恢复备份）会递增
//! `generation`，命令历史据此丢弃旧记录。

mod backups;
mod customers;
mod installments;
mod laptops;
mod repairs;
mod reports;
mod sales;
mod users;

pub use reports::{InventorySummary, PaymentMethodTotal, ReportKind, SalesReport};
pub(crate) use users::identity_conflict;

use parking_lot::RwLock;
use shared::models::{AuditAction, AuditLog, Editable, Record, Table};
use shared::StoreDocument;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audit::{self, AuditDraft, AuditListResponse, AuditQuery};
use crate::sync::SyncHandle;
use crate::utils::{AppError, AppResult};

/// 单次变更的上下文（持有写锁期间有效）
pub(crate) struct Mutation<'a> {
    pub doc: &'a mut StoreDocument,
    pub now: i64,
    pub actor: Option<i64>,
    dirty: bool,
}

impl Mutation<'_> {
    /// 追加审计条目并标记需要持久化
    pub fn audit(&mut self, draft: AuditDraft) -> AuditLog {
        self.dirty = true;
        audit::trail::append(self.doc, draft, self.actor, self.now)
    }
}

/// 实体存储
pub struct EntityStore {
    data: RwLock<StoreDocument>,
    actor: RwLock<Option<i64>>,
    /// 整体替换计数
    generation: AtomicU64,
    /// 变更版本号（outbox 使用）
    version: AtomicU64,
    persistence: Option<SyncHandle>,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("generation", &self.generation())
            .field("version", &self.version.load(Ordering::Acquire))
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

impl EntityStore {
    fn build(persistence: Option<SyncHandle>) -> Self {
        Self {
            data: RwLock::new(StoreDocument::default()),
            actor: RwLock::new(None),
            generation: AtomicU64::new(0),
            version: AtomicU64::new(0),
            persistence,
        }
    }

    /// 无持久化的空存储（测试、工具）
    pub fn in_memory() -> Self {
        Self::build(None)
    }

    /// 每次变更写本地缓存并登记远程推送
    pub fn with_persistence(handle: SyncHandle) -> Self {
        Self::build(Some(handle))
    }

    // ========== 操作人 ==========

    /// 设置当前操作人，之后的审计条目都带上该 user_id
    pub fn set_actor(&self, user_id: Option<i64>) {
        *self.actor.write() = user_id;
    }

    pub fn actor(&self) -> Option<i64> {
        *self.actor.read()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    // ========== 变更核心 ==========

    pub(crate) fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Mutation<'_>) -> AppResult<T>,
    ) -> AppResult<T> {
        let actor = self.actor();
        let mut guard = self.data.write();
        let (out, dirty) = {
            let mut m = Mutation {
                doc: &mut *guard,
                now: shared::util::now_millis(),
                actor,
                dirty: false,
            };
            let out = f(&mut m)?;
            (out, m.dirty)
        };
        if dirty {
            self.persist(&*guard);
        }
        Ok(out)
    }

    /// 本地持久化失败只记录日志，内存状态已生效
    fn persist(&self, doc: &StoreDocument) {
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(handle) = &self.persistence {
            if let Err(e) = handle.persist(doc, version) {
                tracing::error!(version, error = %e, "Failed to persist store to local cache");
            }
        }
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&StoreDocument) -> T) -> T {
        f(&*self.data.read())
    }

    // ========== 通用 CRUD ==========

    pub fn get<E: Record>(&self, id: i64) -> Option<E> {
        self.read(|doc| E::collection(doc).iter().find(|r| r.id() == id).cloned())
    }

    pub fn list<E: Record>(&self) -> Vec<E> {
        self.read(|doc| E::collection(doc).clone())
    }

    pub fn count<E: Record>(&self) -> usize {
        self.read(|doc| E::collection(doc).len())
    }

    /// 新建记录：分配 id、打时间戳、写 CREATE 审计
    pub fn insert<E: Editable>(&self, create: E::Create) -> AppResult<E> {
        self.mutate(|m| {
            let id = m.doc.next_id::<E>();
            let record = E::from_create(id, create, m.now);
            record.validate()?;
            if let Some(warning) = record.advisory() {
                tracing::warn!(table = %E::TABLE, id, "{warning}");
            }
            E::collection_mut(m.doc).push(record.clone());
            m.audit(
                AuditDraft::new(AuditAction::Create, E::TABLE)
                    .record(id)
                    .new_values(record.snapshot()),
            );
            tracing::info!(table = %E::TABLE, id, "Record created");
            Ok(record)
        })
    }

    /// 部分更新；记录不存在返回 `None`，返回 `(旧值, 新值)`
    pub fn patch<E: Editable>(&self, id: i64, patch: &E::Patch) -> AppResult<Option<(E, E)>> {
        self.mutate(|m| {
            let Some(index) = position::<E>(m.doc, id) else {
                return Ok(None);
            };
            let before = E::collection(m.doc)[index].clone();
            let mut after = before.clone();
            after.apply_patch(patch, m.now);
            after.validate()?;
            if let Some(warning) = after.advisory() {
                tracing::warn!(table = %E::TABLE, id, "{warning}");
            }
            E::collection_mut(m.doc)[index] = after.clone();
            m.audit(
                AuditDraft::new(AuditAction::Update, E::TABLE)
                    .record(id)
                    .old(before.snapshot())
                    .new_values(after.snapshot()),
            );
            tracing::info!(table = %E::TABLE, id, "Record updated");
            Ok(Some((before, after)))
        })
    }

    /// 删除（不级联）；返回被删记录及其原位置
    pub fn remove<E: Record>(&self, id: i64) -> AppResult<Option<(E, usize)>> {
        self.mutate(|m| {
            let Some(index) = position::<E>(m.doc, id) else {
                return Ok(None);
            };
            let removed = E::collection_mut(m.doc).remove(index);
            m.audit(
                AuditDraft::new(AuditAction::Delete, E::TABLE)
                    .record(id)
                    .old(removed.snapshot()),
            );
            tracing::info!(table = %E::TABLE, id, "Record deleted");
            Ok(Some((removed, index)))
        })
    }

    /// 按原样重新插入（保留 id），`position` 为原下标；审计记为 RESTORE
    pub fn reinsert<E: Record>(&self, record: E, position: Option<usize>) -> AppResult<()> {
        self.mutate(|m| {
            let id = record.id();
            if E::collection(m.doc).iter().any(|r| r.id() == id) {
                return Err(AppError::conflict(format!(
                    "{} {} already exists",
                    E::TABLE.singular(),
                    id
                )));
            }
            let collection = E::collection_mut(m.doc);
            let index = position.unwrap_or(collection.len()).min(collection.len());
            collection.insert(index, record.clone());
            m.audit(
                AuditDraft::new(AuditAction::Restore, E::TABLE)
                    .record(id)
                    .new_values(record.snapshot()),
            );
            Ok(())
        })
    }

    /// 整条记录覆盖（撤销更新时使用）；记录不存在返回 false
    pub fn replace<E: Record>(&self, record: E) -> AppResult<bool> {
        self.mutate(|m| {
            let id = record.id();
            let Some(index) = position::<E>(m.doc, id) else {
                return Ok(false);
            };
            let before = std::mem::replace(&mut E::collection_mut(m.doc)[index], record.clone());
            m.audit(
                AuditDraft::new(AuditAction::Update, E::TABLE)
                    .record(id)
                    .old(before.snapshot())
                    .new_values(record.snapshot()),
            );
            Ok(true)
        })
    }

    // ========== 审计 ==========

    pub fn get_audit_logs(&self, query: &AuditQuery) -> AuditListResponse {
        self.read(|doc| audit::trail::query(&doc.audit_logs, query))
    }

    pub fn audit_log_count(&self) -> usize {
        self.read(|doc| doc.audit_logs.len())
    }

    // ========== 整体替换 ==========

    /// 本地缓存水合：直接替换，不回写
    pub fn load_document(&self, doc: StoreDocument) {
        let mut guard = self.data.write();
        *guard = doc;
        let generation = self.bump_generation();
        tracing::info!(
            generation,
            records = guard.records_count(),
            "Store hydrated from local cache"
        );
    }

    /// 主远程水合：无条件覆盖，然后回写本地缓存
    pub fn apply_primary(&self, doc: StoreDocument) {
        let mut guard = self.data.write();
        *guard = doc;
        let generation = self.bump_generation();
        self.persist_local(&*guard);
        tracing::info!(
            generation,
            records = guard.records_count(),
            "Store overwritten from primary remote"
        );
    }

    /// 镜像水合：只覆盖非空集合，返回被覆盖的表
    pub fn apply_mirror(&self, doc: StoreDocument) -> Vec<Table> {
        let mut guard = self.data.write();
        let replaced = guard.merge_non_empty(doc);
        if replaced.is_empty() {
            tracing::debug!("Mirror snapshot had no non-empty collections");
            return replaced;
        }
        let generation = self.bump_generation();
        self.persist_local(&*guard);
        tracing::info!(generation, tables = ?replaced, "Store merged from mirror remote");
        replaced
    }

    fn persist_local(&self, doc: &StoreDocument) {
        if let Some(handle) = &self.persistence {
            if let Err(e) = handle.persist_local(doc) {
                tracing::error!(error = %e, "Failed to write hydrated document to local cache");
            }
        }
    }

    /// 完整文档拷贝（备份下载、导出）
    pub fn export_document(&self) -> StoreDocument {
        self.read(|doc| doc.clone())
    }
}

pub(crate) fn position<E: Record>(doc: &StoreDocument, id: i64) -> Option<usize> {
    E::collection(doc).iter().position(|r| r.id() == id)
}

pub(crate) fn find_mut<E: Record>(doc: &mut StoreDocument, id: i64) -> Option<&mut E> {
    E::collection_mut(doc).iter_mut().find(|r| r.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Laptop, LaptopCreate, LaptopUpdate};

    fn create(brand: &str) -> LaptopCreate {
        LaptopCreate {
            brand: brand.to_string(),
            model: "X".to_string(),
            price: 1000.0,
            cost: 600.0,
            quantity: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_allocates_max_plus_one() {
        let store = EntityStore::in_memory();
        let a: Laptop = store.insert(create("A")).unwrap();
        let b: Laptop = store.insert(create("B")).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        store.remove::<Laptop>(1).unwrap();
        let c: Laptop = store.insert(create("C")).unwrap();
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_failed_validation_leaves_no_trace() {
        let store = EntityStore::in_memory();
        let mut bad = create("A");
        bad.quantity = -2;
        let err = store.insert::<Laptop>(bad).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.count::<Laptop>(), 0);
        assert_eq!(store.audit_log_count(), 0);
    }

    #[test]
    fn test_patch_missing_record_returns_none() {
        let store = EntityStore::in_memory();
        let result = store.patch::<Laptop>(42, &LaptopUpdate::default()).unwrap();
        assert!(result.is_none());
        assert_eq!(store.audit_log_count(), 0);
    }

    #[test]
    fn test_reads_are_copies() {
        let store = EntityStore::in_memory();
        store.insert::<Laptop>(create("A")).unwrap();
        let mut copy = store.list::<Laptop>();
        copy[0].quantity = 0;
        copy.clear();
        assert_eq!(store.get::<Laptop>(1).unwrap().quantity, 5);
    }

    #[test]
    fn test_reinsert_restores_position_and_rejects_duplicates() {
        let store = EntityStore::in_memory();
        for brand in ["A", "B", "C"] {
            store.insert::<Laptop>(create(brand)).unwrap();
        }
        let (removed, index) = store.remove::<Laptop>(2).unwrap().unwrap();
        assert_eq!(index, 1);
        store.reinsert(removed.clone(), Some(index)).unwrap();
        let ids: Vec<i64> = store.list::<Laptop>().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let err = store.reinsert(removed, None).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_actor_is_stamped_on_audit_entries() {
        let store = EntityStore::in_memory();
        store.set_actor(Some(7));
        store.insert::<Laptop>(create("A")).unwrap();
        let logs = store.get_audit_logs(&AuditQuery::new());
        assert_eq!(logs.items[0].user_id, Some(7));
    }

    #[test]
    fn test_full_replacement_bumps_generation() {
        let store = EntityStore::in_memory();
        assert_eq!(store.generation(), 0);
        store.apply_primary(StoreDocument::default());
        assert_eq!(store.generation(), 1);
        // empty mirror changes nothing
        assert!(store.apply_mirror(StoreDocument::default()).is_empty());
        assert_eq!(store.generation(), 1);
    }
}
