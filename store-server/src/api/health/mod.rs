//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /health | GET | 简单健康检查 |
//!
//! ```json
//! { "status": "ok", "version": "0.1.0", "generation": 1, "records": 42 }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// 全量替换次数 (水合 / 恢复)
    generation: u64,
    /// 内存中记录总数
    records: usize,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        generation: state.store.generation(),
        records: state.store.export_document().records_count(),
    })
}
