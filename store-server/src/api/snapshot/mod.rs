//! 快照槽位路由
//!
//! - GET /api/snapshot/{slot} → 存储的文档 (缺失时返回空文档)
//! - POST /api/snapshot/{slot} → 替换文档

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/snapshot/{slot}", get(handler::fetch).post(handler::store))
}
