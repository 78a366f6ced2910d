//! 认证模块
//!
//! 登录 UI / 会话 Cookie 不在本服务内，这里只提供密码哈希。
//! 登录审计（LOGIN / LOGIN_FAIL）由 [`crate::store::EntityStore::authenticate`] 完成。

pub mod password;

pub use password::{hash_password, verify_password};
