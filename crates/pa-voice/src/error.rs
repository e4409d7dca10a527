//! Error types for pa-voice

use thiserror::Error;

/// pa-voice error type
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Audio decoding error: {0}")]
    DecodingError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Unsupported audio format for {provider}: {format}")]
    UnsupportedFormat { provider: String, format: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Audio file error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, VoiceError>;
