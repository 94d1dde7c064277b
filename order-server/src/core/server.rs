//! Server Implementation
//!
//! HTTP server startup, background tasks and graceful shutdown.

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{AppState, Config};
use shared::AppError;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<AppState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (shared with tests/tools)
    pub fn with_state(config: Config, state: AppState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => AppState::initialize(&self.config).await?,
        };

        // Background tasks
        let mut tasks = BackgroundTasks::new();
        let sweep_pool = state.db.pool.clone();
        let sweep_token = tasks.shutdown_token();
        tasks.spawn("discount_expiry_sweep", TaskKind::Periodic, async move {
            crate::pricing::run_expiry_sweep(sweep_pool, sweep_token).await;
        });
        tracing::info!("Background tasks registered: {}", tasks.len());

        let app = crate::api::router(state.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        tracing::info!("Order server listening on {addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        tasks.shutdown().await;
        Ok(())
    }
}
