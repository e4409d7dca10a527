//! Twilio API client for voice calls

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pa_core::config::TwilioConfig;

use crate::error::{Result, TelephonyError};

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Originates outbound calls
#[async_trait]
pub trait CallPlacer: Send + Sync {
    /// Call `to` and have the provider fetch call instructions from
    /// `callback_url`. Returns the provider's call identifier.
    async fn place_call(&self, to: &str, callback_url: &str) -> Result<String>;
}

/// Twilio API client
#[derive(Debug, Clone)]
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    phone_number: String,
    base_url: String,
}

/// Outgoing call payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateCallPayload<'a> {
    to: &'a str,
    from: &'a str,
    url: &'a str,
    method: &'a str,
}

#[derive(Deserialize)]
struct CreateCallResponse {
    sid: String,
}

impl TwilioClient {
    /// Create a new Twilio client
    pub fn new(
        account_sid: String,
        auth_token: String,
        phone_number: String,
        timeout: Duration,
    ) -> Result<Self> {
        if account_sid.is_empty() || auth_token.is_empty() {
            return Err(TelephonyError::CredentialsNotSet);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TelephonyError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            account_sid,
            auth_token,
            phone_number,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create from the `[twilio]` settings
    pub fn from_config(config: &TwilioConfig, timeout: Duration) -> Result<Self> {
        let client = Self::new(
            config.account_sid.clone(),
            config.auth_token.clone(),
            config.phone_number.clone(),
            timeout,
        )?;

        Ok(match &config.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        })
    }

    /// Point the client at another API host (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Source number for outbound calls
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// Start an outbound call
    pub async fn create_call(&self, to: &str, callback_url: &str) -> Result<String> {
        info!("Placing call to {}", to);

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.base_url, self.account_sid
        );

        let payload = CreateCallPayload {
            to,
            from: &self.phone_number,
            url: callback_url,
            method: "POST",
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Twilio API error: {} - {}", status, text);
            return Err(TelephonyError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let result: CreateCallResponse = response.json().await?;
        info!("Call created: {}", result.sid);
        Ok(result.sid)
    }
}

#[async_trait]
impl CallPlacer for TwilioClient {
    async fn place_call(&self, to: &str, callback_url: &str) -> Result<String> {
        self.create_call(to, callback_url).await
    }
}
