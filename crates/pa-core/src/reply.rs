//! Reply generation
//!
//! Turns one caller utterance into one reply utterance with a single-turn
//! completion request. No history is sent, so every turn is answered without
//! memory of the previous ones.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::Error;
use crate::llm::LlmClient;

/// Spoken when no reply could be generated
pub const DEFAULT_FALLBACK_REPLY: &str = "I'm sorry, I didn't understand that.";

/// Why a reply could not be generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never produced a response (connect error, timeout)
    Unreachable,
    /// The API answered with a non-success status (auth, quota, bad request)
    Rejected { status: u16 },
    /// The API answered but the body could not be understood
    Malformed,
}

/// Result of one generation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The model produced text
    Generated(String),
    /// The model answered without usable text
    Declined,
    /// The model could not be used
    Failed(FailureKind),
}

impl ReplyOutcome {
    /// Classify an LLM client error
    pub fn from_error(err: &Error) -> Self {
        let kind = match err {
            Error::LlmStatus { status, .. } => FailureKind::Rejected { status: *status },
            Error::LlmApi(_) | Error::Json(_) => FailureKind::Malformed,
            Error::Http(e) if e.is_decode() => FailureKind::Malformed,
            Error::Http(e) => match e.status() {
                Some(status) => FailureKind::Rejected {
                    status: status.as_u16(),
                },
                None => FailureKind::Unreachable,
            },
            _ => FailureKind::Unreachable,
        };
        Self::Failed(kind)
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }

    /// The generated text, or `fallback` for any other outcome
    pub fn into_text_or(self, fallback: &str) -> String {
        match self {
            Self::Generated(text) => text,
            Self::Declined | Self::Failed(_) => fallback.to_string(),
        }
    }
}

/// Produces reply utterances
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Attempt to generate a reply to `utterance`
    async fn generate(&self, utterance: &str) -> ReplyOutcome;

    /// Sentence used when generation does not succeed
    fn fallback_reply(&self) -> &str {
        DEFAULT_FALLBACK_REPLY
    }

    /// Generate a reply, substituting the fallback sentence on any failure.
    /// Never fails.
    async fn reply(&self, utterance: &str) -> String {
        let outcome = self.generate(utterance).await;
        if !outcome.is_generated() {
            warn!("Using fallback reply: {:?}", outcome);
        }
        outcome.into_text_or(self.fallback_reply())
    }
}

/// Reply generator backed by a hosted language model
pub struct LlmReplyGenerator {
    client: LlmClient,
    system_prompt: Option<String>,
    max_tokens: u64,
    fallback_reply: String,
}

impl LlmReplyGenerator {
    pub fn new(client: LlmClient, config: &LlmConfig) -> Self {
        Self {
            client,
            system_prompt: config.system_prompt.clone(),
            max_tokens: config.max_tokens,
            fallback_reply: config.fallback_reply.clone(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for LlmReplyGenerator {
    async fn generate(&self, utterance: &str) -> ReplyOutcome {
        let mut builder = self
            .client
            .request_builder()
            .max_tokens(self.max_tokens)
            .user(utterance);
        if let Some(system) = &self.system_prompt {
            builder = builder.system(system);
        }

        match self.client.messages(builder.build()).await {
            Ok(response) => {
                let text = response.text();
                if text.trim().is_empty() {
                    debug!("Model returned no text (stop_reason={:?})", response.stop_reason);
                    ReplyOutcome::Declined
                } else {
                    ReplyOutcome::Generated(text)
                }
            }
            Err(e) => {
                warn!("Error generating response: {}", e);
                ReplyOutcome::from_error(&e)
            }
        }
    }

    fn fallback_reply(&self) -> &str {
        &self.fallback_reply
    }
}
