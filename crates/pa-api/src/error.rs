//! Error types for pa-api

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::handlers::ErrorResponse;

/// pa-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Customer store error: {0}")]
    Store(#[from] pa_core::Error),

    #[error("Telephony error: {0}")]
    Telephony(#[from] pa_telephony::TelephonyError),

    #[error("Speech synthesis error: {0}")]
    Synthesis(#[from] pa_voice::VoiceError),

    #[error("Markup error: {0}")]
    Markup(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("{}", self);

        match self {
            ApiError::Store(_) | ApiError::Telephony(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: self.to_string(),
                }),
            )
                .into_response(),
            ApiError::Synthesis(_) | ApiError::Markup(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
