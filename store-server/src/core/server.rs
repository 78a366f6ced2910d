//! HTTP 服务器启动和管理

use tokio::net::TcpListener;

use crate::api;
use crate::core::{Config, Result, ServerError, ServerState};

pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        let tasks = state.start_background_tasks();

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(e.into()))?;
        tracing::info!("Laptop store server listening on {}", addr);

        let app = api::build_router(state);
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.into()));

        tasks.shutdown().await;
        served
    }
}
