//! Append-only 审计链
//!
//! 条目只追加，没有修改/删除接口。id 取 `max + 1`，
//! 调用方必须持有 store 写锁，保证并发下 id 不冲突。

use shared::models::{AuditAction, AuditLog, AuditSnapshot, Table};
use shared::StoreDocument;

use super::types::{AuditListResponse, AuditQuery};

/// 待写入的审计条目
#[derive(Debug, Clone)]
pub struct AuditDraft {
    action: AuditAction,
    table_name: String,
    record_id: Option<i64>,
    old_values: Option<AuditSnapshot>,
    new_values: Option<AuditSnapshot>,
    /// 覆盖当前操作人（审批人等）
    user_id: Option<Option<i64>>,
}

impl AuditDraft {
    pub fn new(action: AuditAction, table: Table) -> Self {
        Self {
            action,
            table_name: table.as_str().to_string(),
            record_id: None,
            old_values: None,
            new_values: None,
            user_id: None,
        }
    }

    pub fn record(mut self, id: i64) -> Self {
        self.record_id = Some(id);
        self
    }

    pub fn old(mut self, snapshot: AuditSnapshot) -> Self {
        self.old_values = Some(snapshot);
        self
    }

    pub fn new_values(mut self, snapshot: AuditSnapshot) -> Self {
        self.new_values = Some(snapshot);
        self
    }

    /// 非实体详情（登录、报表参数等）
    pub fn details(self, details: serde_json::Value) -> Self {
        self.new_values(AuditSnapshot::Details(details))
    }

    pub fn by(mut self, user_id: Option<i64>) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// 追加一条审计日志，返回写入的条目
pub fn append(
    doc: &mut StoreDocument,
    draft: AuditDraft,
    actor: Option<i64>,
    timestamp: i64,
) -> AuditLog {
    let entry = AuditLog {
        id: doc.next_audit_id(),
        user_id: draft.user_id.unwrap_or(actor),
        action: draft.action,
        table_name: draft.table_name,
        record_id: draft.record_id,
        old_values: draft.old_values,
        new_values: draft.new_values,
        timestamp,
    };

    tracing::debug!(
        audit_id = entry.id,
        action = %entry.action,
        table = %entry.table_name,
        record_id = ?entry.record_id,
        "Audit entry recorded"
    );

    doc.audit_logs.push(entry.clone());
    entry
}

/// 查询审计日志（按 id 倒序，最新在前）
pub fn query(logs: &[AuditLog], q: &AuditQuery) -> AuditListResponse {
    let matched: Vec<&AuditLog> = logs.iter().rev().filter(|e| q.matches(e)).collect();
    let total = matched.len();
    let items = matched
        .into_iter()
        .skip(q.offset)
        .take(q.limit)
        .cloned()
        .collect();
    AuditListResponse { items, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut doc = StoreDocument::default();
        let first = append(&mut doc, AuditDraft::new(AuditAction::Create, Table::Laptops), None, 1);
        let second = append(&mut doc, AuditDraft::new(AuditAction::Update, Table::Laptops), None, 2);
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_explicit_user_overrides_actor() {
        let mut doc = StoreDocument::default();
        let entry = append(
            &mut doc,
            AuditDraft::new(AuditAction::ApproveRegistration, Table::RegistrationRequests).by(Some(9)),
            Some(1),
            1,
        );
        assert_eq!(entry.user_id, Some(9));

        let entry = append(&mut doc, AuditDraft::new(AuditAction::Create, Table::Sales), Some(1), 2);
        assert_eq!(entry.user_id, Some(1));
    }

    #[test]
    fn test_query_filters_and_paginates_newest_first() {
        let mut doc = StoreDocument::default();
        for ts in 1..=5 {
            append(&mut doc, AuditDraft::new(AuditAction::Create, Table::Laptops).record(ts), None, ts);
        }
        append(&mut doc, AuditDraft::new(AuditAction::Create, Table::Sales), None, 6);

        let mut q = AuditQuery::new();
        q.table_name = Some("laptops".to_string());
        q.limit = 2;
        let page = query(&doc.audit_logs, &q);
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].record_id, Some(5));
        assert_eq!(page.items[1].record_id, Some(4));
    }

    #[test]
    fn test_default_query_uses_page_size() {
        let mut doc = StoreDocument::default();
        append(&mut doc, AuditDraft::new(AuditAction::Create, Table::Laptops), None, 1);
        let q = AuditQuery::default();
        assert_eq!(q.limit, 50);
        assert_eq!(query(&doc.audit_logs, &q).items.len(), 1);
    }
}
