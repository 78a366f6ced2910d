//! 备份元数据、恢复与导出
//!
//! 备份文件本身由快照主机提供下载，这里只维护元数据。

use shared::models::{AuditAction, Backup, Record, Table};
use shared::StoreDocument;

use super::{EntityStore, position};
use crate::audit::AuditDraft;
use crate::utils::AppResult;

impl EntityStore {
    pub fn get_backups(&self) -> Vec<Backup> {
        self.list()
    }

    /// 记录一次备份：`size` 为序列化文档字节数，`records_count` 为领域记录数
    pub fn create_backup(&self, prefix: &str, description: Option<String>) -> AppResult<Backup> {
        self.mutate(|m| {
            let size = serde_json::to_vec(&*m.doc)?.len() as u64;
            let backup = Backup {
                id: m.doc.next_id::<Backup>(),
                filename: Backup::filename_for(prefix, m.now),
                created_at: m.now,
                size,
                records_count: m.doc.records_count() as u64,
                description,
            };
            m.doc.backups.push(backup.clone());
            m.audit(
                AuditDraft::new(AuditAction::Backup, Backup::TABLE)
                    .record(backup.id)
                    .new_values(backup.snapshot()),
            );
            tracing::info!(
                backup_id = backup.id,
                filename = %backup.filename,
                size = backup.size,
                "Backup recorded"
            );
            Ok(backup)
        })
    }

    pub fn delete_backup(&self, id: i64) -> AppResult<Option<Backup>> {
        self.mutate(|m| {
            let Some(index) = position::<Backup>(m.doc, id) else {
                return Ok(None);
            };
            let removed = m.doc.backups.remove(index);
            m.audit(
                AuditDraft::new(AuditAction::BackupDelete, Backup::TABLE)
                    .record(id)
                    .old(removed.snapshot()),
            );
            Ok(Some(removed))
        })
    }

    /// 用备份文档替换全部领域集合
    ///
    /// 当前审计链和备份元数据保留；写一条 `RESTORE`。
    /// 返回恢复的领域记录数。
    pub fn restore_document(&self, doc: StoreDocument) -> AppResult<usize> {
        let restored = self.mutate(|m| {
            let previous = m.doc.records_count();
            let StoreDocument {
                laptops,
                customers,
                users,
                registration_requests,
                sales,
                installments,
                repairs,
                ..
            } = doc;
            m.doc.laptops = laptops;
            m.doc.customers = customers;
            m.doc.users = users;
            m.doc.registration_requests = registration_requests;
            m.doc.sales = sales;
            m.doc.installments = installments;
            m.doc.repairs = repairs;
            let restored = m.doc.records_count();

            m.audit(
                AuditDraft::new(AuditAction::Restore, Table::Backups).details(serde_json::json!({
                    "previous_records": previous,
                    "restored_records": restored,
                })),
            );
            Ok(restored)
        })?;
        let generation = self.bump_generation();
        tracing::info!(restored, generation, "Store restored from backup document");
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditQuery;
    use shared::models::{CustomerCreate, LaptopCreate};

    fn seeded() -> EntityStore {
        let store = EntityStore::in_memory();
        store
            .add_laptop(LaptopCreate {
                brand: "Acer".to_string(),
                model: "Swift".to_string(),
                price: 700.0,
                cost: 450.0,
                quantity: 4,
                ..Default::default()
            })
            .unwrap();
        store
            .add_customer(CustomerCreate {
                first_name: "Lu".to_string(),
                last_name: "Chen".to_string(),
                ..Default::default()
            })
            .unwrap();
        store
    }

    #[test]
    fn test_create_and_delete_backup() {
        let store = seeded();
        let backup = store.create_backup("laptop-store", None).unwrap();
        assert_eq!(backup.records_count, 2);
        assert!(backup.size > 0);
        assert!(backup.filename.starts_with("laptop-store-backup-"));
        assert!(backup.filename.ends_with(".json"));

        store.delete_backup(backup.id).unwrap();
        assert!(store.get_backups().is_empty());
        let latest = &store.get_audit_logs(&AuditQuery::new()).items[0];
        assert_eq!(latest.action, AuditAction::BackupDelete);
    }

    #[test]
    fn test_restore_keeps_audit_trail() {
        let store = seeded();
        let snapshot = store.export_document();
        store.delete_laptop(1).unwrap();
        let audit_before = store.audit_log_count();
        let generation = store.generation();

        let restored = store.restore_document(snapshot).unwrap();
        assert_eq!(restored, 2);
        assert_eq!(store.get_laptops().len(), 1);
        assert_eq!(store.audit_log_count(), audit_before + 1);
        assert_eq!(store.generation(), generation + 1);
        let latest = &store.get_audit_logs(&AuditQuery::new()).items[0];
        assert_eq!(latest.action, AuditAction::Restore);
    }
}
