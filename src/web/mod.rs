//! Web server module.

mod handlers;

pub use handlers::*;

use crate::camera::Snapshot;
use crate::config::ServerConfig;
use crate::feed::History;
use crate::insights::AnalysisBackend;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub history: Arc<RwLock<History>>,
    pub live: broadcast::Sender<Arc<Snapshot>>,
    pub backend: Option<Arc<dyn AnalysisBackend>>,
}

/// Web server for PipeWatch.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(
        config: ServerConfig,
        history: Arc<RwLock<History>>,
        live: broadcast::Sender<Arc<Snapshot>>,
    ) -> Self {
        Self {
            state: AppState {
                config,
                history,
                live,
                backend: None,
            },
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn AnalysisBackend>) -> Self {
        self.state.backend = Some(backend);
        self
    }

    /// Build the router with all routes.
    pub fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            .route("/health", get(handlers::handle_health))
            // Live fleet
            .route("/api/cameras", get(handlers::handle_cameras))
            .route("/api/severity", get(handlers::handle_severity))
            .route("/api/levels", get(handlers::handle_levels))
            .route("/api/fleet", get(handlers::handle_fleet))
            .route("/api/critical", get(handlers::handle_critical))
            // Filtering
            .route(
                "/api/filter",
                get(handlers::handle_filter).post(handlers::handle_filter_body),
            )
            .route("/api/presets", get(handlers::handle_presets))
            // Insights
            .route("/api/insights", get(handlers::handle_insights))
            .route("/api/analysis", get(handlers::handle_analysis))
            .route("/api/segments/insights", get(handlers::handle_segment_insights))
            // Playback
            .route("/api/history/range", get(handlers::handle_history_range))
            .route("/api/history/at", get(handlers::handle_history_at))
            .route("/api/stream", get(handlers::handle_stream))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(64 * 1024))
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
