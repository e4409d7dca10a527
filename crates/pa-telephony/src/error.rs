//! Error types for pa-telephony

use thiserror::Error;

/// pa-telephony error type
#[derive(Error, Debug)]
pub enum TelephonyError {
    #[error("Twilio credentials not set")]
    CredentialsNotSet,

    #[error("Twilio API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid TwiML: {0}")]
    Markup(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TelephonyError {
    fn from(err: reqwest::Error) -> Self {
        TelephonyError::Http(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TelephonyError>;
