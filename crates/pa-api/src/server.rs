//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use pa_core::config::AUDIO_PATH;
use pa_core::{Config, CustomerStore, ReplyGenerator};
use pa_telephony::CallPlacer;
use pa_voice::SpeechSynthesizer;

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub customers: Arc<dyn CustomerStore>,
    pub calls: Arc<dyn CallPlacer>,
    pub replies: Arc<dyn ReplyGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

/// API routes plus the audio directory under `/audio`
pub fn build_router(state: AppState) -> Router {
    let audio = ServeDir::new(&state.config.audio.dir);

    Router::new()
        .merge(routes())
        .nest_service(AUDIO_PATH, audio)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP API server, stopping when `shutdown` completes
pub async fn start_server(
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let port = state.config.server.port;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
