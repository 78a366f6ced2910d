//! 审计日志查询类型

use serde::{Deserialize, Serialize};
use shared::models::{AuditAction, AuditLog};

/// 审计日志查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct AuditQuery {
    /// 表名过滤（如 "laptops"）
    pub table_name: Option<String>,
    /// 操作类型过滤
    pub action: Option<AuditAction>,
    /// 操作人过滤
    pub user_id: Option<i64>,
    /// 记录 ID 过滤
    pub record_id: Option<i64>,
    /// 起始时间（Unix 毫秒，含）
    pub from: Option<i64>,
    /// 截止时间（Unix 毫秒，含）
    pub to: Option<i64>,
    /// 分页偏移
    #[serde(default)]
    pub offset: usize,
    /// 分页大小（默认 50）
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditQuery {
    pub fn new() -> Self {
        Self {
            table_name: None,
            action: None,
            user_id: None,
            record_id: None,
            from: None,
            to: None,
            offset: 0,
            limit: default_limit(),
        }
    }

    pub fn matches(&self, entry: &AuditLog) -> bool {
        self.table_name
            .as_deref()
            .is_none_or(|t| entry.table_name == t)
            && self.action.is_none_or(|a| entry.action == a)
            && self.user_id.is_none_or(|u| entry.user_id == Some(u))
            && self.record_id.is_none_or(|r| entry.record_id == Some(r))
            && self.from.is_none_or(|from| entry.timestamp >= from)
            && self.to.is_none_or(|to| entry.timestamp <= to)
    }
}

/// 审计日志列表响应
#[derive(Debug, Clone, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditLog>,
    pub total: usize,
}
