//! HTTP API server for voicepal

pub mod health;
pub mod voice;
mod web;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::turn::TurnOrchestrator;
use crate::voice::STATIC_URL_PREFIX;

/// Shared state for API handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    pub turns: Arc<TurnOrchestrator>,
}

impl ApiState {
    #[must_use]
    pub const fn new(turns: Arc<TurnOrchestrator>) -> Self {
        Self { turns }
    }
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    turns: Arc<TurnOrchestrator>,
    port: u16,
    static_dir: Option<PathBuf>,
    web_dir: Option<PathBuf>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub const fn new(turns: Arc<TurnOrchestrator>, port: u16) -> Self {
        Self {
            turns,
            port,
            static_dir: None,
            web_dir: None,
        }
    }

    /// Directory served under `/static`
    #[must_use]
    pub fn static_dir(mut self, dir: PathBuf) -> Self {
        self.static_dir = Some(dir);
        self
    }

    /// Directory holding a web UI to serve at `/` in place of the bundled one
    #[must_use]
    pub fn web_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.web_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(ApiState::new(self.turns)),
            port: self.port,
            static_dir: self.static_dir,
            web_dir: self.web_dir,
        }
    }
}

/// HTTP API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
    web_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(voice::router(self.state.clone()))
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()));

        if let Some(static_dir) = &self.static_dir {
            router = router.nest_service(STATIC_URL_PREFIX, ServeDir::new(static_dir));
            tracing::info!(path = %static_dir.display(), "serving generated audio");
        }

        // Web UI, with index.html for anything else
        if let Some(web_dir) = &self.web_dir {
            let index_file = web_dir.join("index.html");
            let serve_dir = ServeDir::new(web_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %web_dir.display(), "serving web UI");
        } else {
            router = router.merge(web::router());
        }

        // The page may be opened from another origin during development
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(
            port = self.port,
            stt = self.state.turns.can_transcribe(),
            tts = self.state.turns.can_synthesize(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
