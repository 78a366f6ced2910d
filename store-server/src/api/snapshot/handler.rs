use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use shared::{OperationResult, StoreDocument};

use crate::core::{Result, ServerState};
use crate::services::Slot;

/// GET /api/snapshot/{slot}
///
/// 原样返回文件内容，避免一次反序列化再序列化
pub async fn fetch(
    State(state): State<ServerState>,
    Path(slot): Path<String>,
) -> Result<impl IntoResponse> {
    let slot: Slot = slot.parse()?;
    let body = match state.snapshots.read_raw(slot).await? {
        Some(bytes) => bytes,
        None => serde_json::to_vec(&StoreDocument::default())
            .map_err(crate::utils::AppError::from)?,
    };
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// POST /api/snapshot/{slot}
pub async fn store(
    State(state): State<ServerState>,
    Path(slot): Path<String>,
    Json(doc): Json<StoreDocument>,
) -> Result<Json<OperationResult>> {
    let slot: Slot = slot.parse()?;
    let bytes = state.snapshots.write(slot, &doc).await?;
    tracing::info!(slot = %slot, bytes, records = doc.records_count(), "Snapshot replaced");
    Ok(Json(OperationResult::ok(format!(
        "Stored {} records in {slot}",
        doc.records_count()
    ))))
}
