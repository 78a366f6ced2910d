//! 审计日志模块
//!
//! ```text
//! EntityStore 变更操作（持有写锁）
//!   ├─ 修改集合
//!   ├─ trail::append() → StoreDocument.audit_logs
//!   └─ 写本地缓存 + 登记同步 outbox
//! ```
//!
//! - **Append-only**: 无删除/更新接口
//! - **同步写入**: 操作返回前审计条目已存在
//! - **结构化快照**: old/new 为 [`shared::models::AuditSnapshot`]，不是 JSON 字符串

pub mod trail;
pub mod types;

pub use trail::AuditDraft;
pub use types::{AuditListResponse, AuditQuery};
