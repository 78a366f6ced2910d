//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`snapshot`] - 远程快照槽位 (primary / mirror)
//! - [`backup`] - 备份下载
//! - [`sync`] - 同步状态

pub mod backup;
pub mod health;
pub mod snapshot;
pub mod sync;

use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use http::{Request, Response};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// 快照文档上限 (64 MB)
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// 注册所有路由 (无中间件)
pub fn routes() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(snapshot::router())
        .merge(backup::router())
        .merge(sync::router())
}

/// 构建完整应用：路由 + 中间件 + 状态
pub fn build_router(state: ServerState) -> Router {
    routes()
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 进程内调用路由，不经过网络栈
///
/// ```ignore
/// let request = Request::builder().uri("/health").body(Body::empty())?;
/// let response = api::oneshot(&state, request).await;
/// ```
pub async fn oneshot(state: &ServerState, request: Request<Body>) -> Response<Body> {
    // Router 的错误类型是 Infallible
    match build_router(state.clone()).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::sync::LocalCache;
    use http::StatusCode;

    fn state(dir: &tempfile::TempDir) -> ServerState {
        let config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0);
        ServerState::with_cache(&config, LocalCache::open_in_memory().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_oneshot_health() {
        let dir = tempfile::TempDir::new().unwrap();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = oneshot(&state(&dir), request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oneshot_unknown_route() {
        let dir = tempfile::TempDir::new().unwrap();
        let request = Request::builder()
            .uri("/api/laptops")
            .body(Body::empty())
            .unwrap();
        let response = oneshot(&state(&dir), request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oneshot_backup_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let request = Request::builder()
            .uri("/api/backup/download")
            .body(Body::empty())
            .unwrap();
        let response = oneshot(&state(&dir), request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
