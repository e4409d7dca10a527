//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};

use pa_core::config::WEBHOOK_PATH;

use crate::handlers::{call_customer, health, twilio_webhook};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Outbound calls
        .route("/call-customer", post(call_customer))
        // Twilio voice webhook
        .route(WEBHOOK_PATH, post(twilio_webhook))
}
