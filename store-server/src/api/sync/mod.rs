//! 同步状态路由
//!
//! - GET /api/sync/status → 各远程的最近成功/失败、待推送和死信

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::{Result, ServerState};
use crate::sync::{DeadLetterEntry, PendingSync, RemoteSyncState};
use crate::utils::AppError;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/sync/status", get(status))
}

#[derive(Debug, Serialize)]
pub struct SyncStatusResponse {
    remotes: Vec<RemoteSyncState>,
    pending: Vec<PendingSync>,
    dead_letters: Vec<DeadLetterEntry>,
}

pub async fn status(State(state): State<ServerState>) -> Result<Json<SyncStatusResponse>> {
    let cache = state.cache();
    let pending = cache.pending().map_err(AppError::from)?;
    let dead_letters = cache.dead_letters().map_err(AppError::from)?;
    Ok(Json(SyncStatusResponse {
        remotes: state.sync_status.snapshot(),
        pending,
        dead_letters,
    }))
}
