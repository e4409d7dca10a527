//! pa-api: HTTP API for phone-agent
//!
//! Call origination, the Twilio voice webhook and the audio files the
//! webhook points the caller at. Built with axum.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, build_router, start_server};
