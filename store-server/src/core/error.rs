use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::utils::AppError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("冲突: {0}")]
    Conflict(String),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ServerError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            ServerError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ServerError::Internal(err) => {
                // 记录内部错误但不暴露详细信息
                tracing::error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ServerError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(what) => ServerError::NotFound(format!("{what} not found")),
            AppError::Validation(msg) => ServerError::Validation(msg),
            AppError::Conflict(msg) => ServerError::Conflict(msg),
            other => ServerError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// 处理器的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_mapping() {
        let err: ServerError = AppError::not_found("slot backup").into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err: ServerError = AppError::validation("bad").into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err: ServerError = AppError::internal("boom").into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
