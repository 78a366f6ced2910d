//! 备份下载
//!
//! - GET /api/backup/download → primary 槽位的原始 JSON，作为附件下载

use axum::{
    Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};
use shared::models::Backup;

use crate::core::{Result, ServerError, ServerState};
use crate::services::Slot;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/backup/download", get(download))
}

pub async fn download(State(state): State<ServerState>) -> Result<impl IntoResponse> {
    let Some(bytes) = state.snapshots.read_raw(Slot::Primary).await? else {
        return Err(ServerError::NotFound("Backup file not found".to_string()));
    };

    let filename = Backup::filename_for(&state.config.backup_prefix, shared::util::now_millis());
    tracing::info!(filename = %filename, bytes = bytes.len(), "Serving backup download");

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}
