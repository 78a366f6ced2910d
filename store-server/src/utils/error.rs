//! 统一错误处理
//!
//! 应用级错误类型：
//! - [`AppError`] - 存储层/业务层错误枚举
//! - [`AppResult`] - `Result<T, AppError>`
//!
//! 工作流类的"失败"（重复审批、撤销栈为空等）不是错误，
//! 而是以 [`shared::OperationResult`] 返回给调用方。

use shared::models::{Table, ValidationError};

use crate::sync::{CacheError, SyncError};

/// 应用错误枚举
///
/// | 分类 | 说明 |
/// |------|------|
/// | 业务错误 | 资源不存在、验证失败、冲突 |
/// | 持久化错误 | 本地缓存 (redb)、远程同步 |
/// | 系统错误 | 内部错误 |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 业务错误 ==========
    /// 资源不存在
    #[error("{0} not found")]
    NotFound(String),

    /// 验证失败
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 冲突（重复用户名、重复 id 等）
    #[error("Conflict: {0}")]
    Conflict(String),

    // ========== 持久化错误 ==========
    /// 本地缓存错误
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// 远程同步错误
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    // ========== 系统错误 ==========
    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// `<table> <id>` not found
    pub fn record_not_found(table: Table, id: i64) -> Self {
        Self::NotFound(format!("{} {}", table.singular(), id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization error: {err}"))
    }
}

/// 存储层 Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
