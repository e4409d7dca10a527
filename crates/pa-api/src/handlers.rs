//! HTTP API handlers
//!
//! Call origination and the per-turn Twilio voice webhook.

use axum::{
    Form, Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};

use pa_telephony::Twiml;

use crate::error::{ApiError, Result};
use crate::server::AppState;

/// Spoken when a webhook request carries no transcription
pub const NO_INPUT_PHRASE: &str = "No input detected.";

const TWIML_CONTENT_TYPE: &str = "application/xml";

// ============================================================================
// Request/Response types
// ============================================================================

/// Call origination request payload
#[derive(Debug, Deserialize)]
pub struct CallCustomerRequest {
    /// Number to call
    pub phone_number: String,
    pub customer_id: String,
}

/// Call origination response payload
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CallCustomerResponse {
    Initiated { message: String, call_sid: String },
    NotFound { error: String },
}

/// Fields of a Twilio voice webhook request. Everything else Twilio sends
/// is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookForm {
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
}

/// Generic API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Look up a customer and have Twilio call them
pub async fn call_customer(
    State(state): State<AppState>,
    Json(req): Json<CallCustomerRequest>,
) -> Result<Json<CallCustomerResponse>> {
    debug!("Call request for customer {}", req.customer_id);

    if state.customers.find(&req.customer_id).await?.is_none() {
        warn!("Customer not found: {}", req.customer_id);
        return Ok(Json(CallCustomerResponse::NotFound {
            error: "Customer not found".to_string(),
        }));
    }

    let callback_url = state.config.webhook_url();
    let call_sid = state
        .calls
        .place_call(&req.phone_number, &callback_url)
        .await?;

    info!("Call initiated for customer {}: {}", req.customer_id, call_sid);

    Ok(Json(CallCustomerResponse::Initiated {
        message: "Call initiated".to_string(),
        call_sid,
    }))
}

/// One conversational turn: transcription in, TwiML out
pub async fn twilio_webhook(
    State(state): State<AppState>,
    Form(form): Form<WebhookForm>,
) -> Result<Response> {
    let span = info_span!(
        "turn",
        call_sid = %form.call_sid.as_deref().unwrap_or("-")
    );

    async move {
        let speech = form
            .speech_result
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let twiml = match speech {
            None => {
                info!("No speech in request");
                Twiml::new().say(NO_INPUT_PHRASE)
            }
            Some(utterance) => {
                info!("Caller said: {}", utterance);
                let reply = state.replies.reply(utterance).await;
                debug!("Reply: {}", reply);

                let audio = state.speech.synthesize(&reply).await?;
                Twiml::new()
                    .play(audio.url)
                    .redirect(state.config.webhook_url())
            }
        };

        let xml = twiml
            .to_xml()
            .map_err(|e| ApiError::Markup(e.to_string()))?;

        Ok::<_, ApiError>(([(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)], xml).into_response())
    }
    .instrument(span)
    .await
}
