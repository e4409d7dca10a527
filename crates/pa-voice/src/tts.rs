//! Text-to-Speech synthesis
//!
//! Supports multiple providers:
//! - Google Cloud Text-to-Speech (REST, base64 audio in a JSON body)
//! - OpenAI TTS API (raw audio bytes)

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pa_core::config::SpeechConfig;

use crate::error::{Result, VoiceError};

/// TTS API provider
pub use pa_core::config::SpeechProvider as TtsProvider;

/// TTS configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// API key
    pub api_key: String,
    /// Provider to use
    pub provider: TtsProvider,
    /// Model to use (OpenAI only)
    pub model: String,
    /// Google: SSML gender (`NEUTRAL`, `FEMALE`, `MALE`) or a voice name.
    /// OpenAI: voice name.
    pub voice: String,
    /// Language code (Google only)
    pub language_code: String,
    /// Response format (audio format)
    pub response_format: AudioFormat,
    /// Speech speed (0.25 - 4.0)
    pub speed: Option<f32>,
    /// Endpoint override
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl TtsConfig {
    /// Create a new Google Cloud TTS configuration
    pub fn google(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            provider: TtsProvider::Google,
            model: String::new(),
            voice: "NEUTRAL".to_string(),
            language_code: "en-US".to_string(),
            response_format: AudioFormat::Mp3,
            speed: None,
            base_url: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Create a new OpenAI TTS configuration
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            provider: TtsProvider::OpenAi,
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            language_code: "en-US".to_string(),
            response_format: AudioFormat::Mp3,
            speed: None,
            base_url: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Build from the `[tts]` settings, keeping provider defaults for
    /// anything left unset
    pub fn from_settings(settings: &SpeechConfig, timeout: Duration) -> Self {
        let mut config = match settings.provider {
            TtsProvider::Google => Self::google(&settings.api_key),
            TtsProvider::OpenAi => Self::openai(&settings.api_key),
        };

        if let Some(model) = &settings.model {
            config.model = model.clone();
        }
        if let Some(voice) = &settings.voice {
            config.voice = voice.clone();
        }
        if let Some(speed) = settings.speed {
            config = config.with_speed(speed);
        }
        config.language_code = settings.language_code.clone();
        config.base_url = settings.base_url.clone();
        config.timeout = timeout;
        config
    }

    /// Set voice
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set language
    pub fn with_language(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = language_code.into();
        self
    }

    /// Set speed
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed.clamp(0.25, 4.0));
        self
    }

    /// Set format
    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.response_format = format;
        self
    }

    /// Set endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Get the API base URL for the provider
    pub fn base_url(&self) -> &str {
        match (&self.base_url, &self.provider) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, TtsProvider::Google) => "https://texttospeech.googleapis.com/v1",
            (None, TtsProvider::OpenAi) => "https://api.openai.com/v1",
        }
    }

    /// Identifies the voice settings that shape the audio for a given text
    pub fn fingerprint(&self) -> String {
        format!(
            "{:?}|{}|{}|{}|{}|{:?}",
            self.provider,
            self.model,
            self.voice,
            self.language_code,
            self.response_format,
            self.speed
        )
    }

    fn google_voice(&self) -> serde_json::Value {
        let gender = self.voice.to_uppercase();
        match gender.as_str() {
            "NEUTRAL" | "FEMALE" | "MALE" | "SSML_VOICE_GENDER_UNSPECIFIED" => serde_json::json!({
                "languageCode": self.language_code,
                "ssmlGender": gender,
            }),
            _ => serde_json::json!({
                "languageCode": self.language_code,
                "name": self.voice,
            }),
        }
    }
}

/// Audio format for TTS output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
    Pcm,
}

impl AudioFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Opus => "audio/ogg",
            Self::Aac => "audio/aac",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
            Self::Pcm => "audio/pcm",
        }
    }

    /// Google `audioEncoding` value, if Google can produce this format
    fn google_encoding(&self) -> Option<&'static str> {
        match self {
            Self::Mp3 => Some("MP3"),
            Self::Opus => Some("OGG_OPUS"),
            Self::Wav => Some("LINEAR16"),
            Self::Aac | Self::Flac | Self::Pcm => None,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// TTS synthesis result
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Audio data (encoded in the requested format)
    pub audio_data: Vec<u8>,
    /// Audio format
    pub format: AudioFormat,
    /// Content type
    pub content_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleSynthesizeResponse {
    audio_content: String,
}

/// TTS client for speech synthesis
pub struct TtsClient {
    client: Client,
    config: TtsConfig,
}

impl TtsClient {
    /// Create a new TTS client
    pub fn new(config: TtsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VoiceError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TtsConfig {
        &self.config
    }

    /// Synthesize speech from text
    pub async fn synthesize(&self, text: &str) -> Result<SynthesisResult> {
        match self.config.provider {
            TtsProvider::Google => self.synthesize_google(text).await,
            TtsProvider::OpenAi => self.synthesize_openai(text).await,
        }
    }

    /// Synthesize using Google Cloud Text-to-Speech
    async fn synthesize_google(&self, text: &str) -> Result<SynthesisResult> {
        let format = self.config.response_format;
        let encoding = format
            .google_encoding()
            .ok_or_else(|| VoiceError::UnsupportedFormat {
                provider: "google".to_string(),
                format: format.to_string(),
            })?;

        let url = format!("{}/text:synthesize", self.config.base_url());

        info!("Synthesizing speech: {} chars using Google", text.len());
        debug!(
            "Voice: {}, Language: {}, Encoding: {}",
            self.config.voice, self.config.language_code, encoding
        );

        let mut audio_config = serde_json::json!({ "audioEncoding": encoding });
        if let Some(speed) = self.config.speed {
            audio_config["speakingRate"] = serde_json::json!(speed);
        }

        let body = serde_json::json!({
            "input": { "text": text },
            "voice": self.config.google_voice(),
            "audioConfig": audio_config,
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::ApiError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VoiceError::SynthesisFailed(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let parsed: GoogleSynthesizeResponse = response.json().await.map_err(|e| {
            VoiceError::SynthesisFailed(format!("Failed to parse response: {}", e))
        })?;

        let audio_data = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| VoiceError::DecodingError(format!("Invalid base64 audio: {}", e)))?;

        info!("Synthesis complete: {} bytes", audio_data.len());

        Ok(SynthesisResult {
            audio_data,
            format,
            content_type: format.content_type().to_string(),
        })
    }

    /// Synthesize using OpenAI TTS API
    async fn synthesize_openai(&self, text: &str) -> Result<SynthesisResult> {
        let url = format!("{}/audio/speech", self.config.base_url());

        info!("Synthesizing speech: {} chars using OpenAI", text.len());
        debug!("Model: {}, Voice: {}", self.config.model, self.config.voice);

        let mut body = serde_json::json!({
            "model": self.config.model,
            "input": text,
            "voice": self.config.voice,
            "response_format": self.config.response_format.to_string(),
        });

        if let Some(speed) = self.config.speed {
            body["speed"] = serde_json::json!(speed);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::ApiError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VoiceError::SynthesisFailed(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(self.config.response_format.content_type())
            .to_string();

        let audio_data = response.bytes().await.map_err(|e| {
            VoiceError::SynthesisFailed(format!("Failed to read audio data: {}", e))
        })?;

        info!(
            "Synthesis complete: {} bytes, content-type: {}",
            audio_data.len(),
            content_type
        );

        Ok(SynthesisResult {
            audio_data: audio_data.to_vec(),
            format: self.config.response_format,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_tts_config_google() {
        let config = TtsConfig::google("test-key");
        assert_eq!(config.provider, TtsProvider::Google);
        assert_eq!(config.voice, "NEUTRAL");
        assert_eq!(config.language_code, "en-US");
        assert_eq!(config.response_format, AudioFormat::Mp3);
        assert_eq!(config.base_url(), "https://texttospeech.googleapis.com/v1");
    }

    #[test]
    fn test_tts_config_openai() {
        let config = TtsConfig::openai("test-key");
        assert_eq!(config.provider, TtsProvider::OpenAi);
        assert_eq!(config.model, "tts-1");
        assert_eq!(config.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_tts_config_from_settings() {
        let settings = SpeechConfig {
            provider: TtsProvider::OpenAi,
            api_key: "key".to_string(),
            voice: Some("nova".to_string()),
            speed: Some(9.0),
            base_url: Some("http://localhost:9000/".to_string()),
            ..SpeechConfig::default()
        };

        let config = TtsConfig::from_settings(&settings, Duration::from_secs(7));
        assert_eq!(config.voice, "nova");
        assert_eq!(config.model, "tts-1");
        assert_eq!(config.speed, Some(4.0));
        assert_eq!(config.base_url(), "http://localhost:9000");
        assert_eq!(config.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_google_voice_selection() {
        let by_gender = TtsConfig::google("k").google_voice();
        assert_eq!(by_gender["ssmlGender"], "NEUTRAL");
        assert_eq!(by_gender["languageCode"], "en-US");

        let by_name = TtsConfig::google("k")
            .with_voice("en-GB-Standard-A")
            .with_language("en-GB")
            .google_voice();
        assert_eq!(by_name["name"], "en-GB-Standard-A");
        assert!(by_name.get("ssmlGender").is_none());
    }

    #[test]
    fn test_fingerprint_tracks_voice() {
        let a = TtsConfig::google("k");
        let b = TtsConfig::google("other-key");
        let c = TtsConfig::google("k").with_voice("FEMALE");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_audio_format_display() {
        assert_eq!(AudioFormat::Mp3.to_string(), "mp3");
        assert_eq!(AudioFormat::Opus.to_string(), "opus");
        assert_eq!(AudioFormat::Mp3.content_type(), "audio/mpeg");
    }

    #[tokio::test]
    async fn test_google_synthesis() {
        let server = MockServer::start().await;
        let audio = b"ID3 fake mp3 bytes";
        let encoded = base64::engine::general_purpose::STANDARD.encode(audio);

        Mock::given(method("POST"))
            .and(path("/text:synthesize"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "input": {"text": "Hello"},
                "voice": {"languageCode": "en-US", "ssmlGender": "NEUTRAL"},
                "audioConfig": {"audioEncoding": "MP3"}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "audioContent": encoded })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = TtsClient::new(TtsConfig::google("test-key").with_base_url(server.uri())).unwrap();
        let result = client.synthesize("Hello").await.unwrap();
        assert_eq!(result.audio_data, audio);
        assert_eq!(result.format, AudioFormat::Mp3);
        assert_eq!(result.content_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_google_invalid_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "audioContent": "!!not base64!!" })),
            )
            .mount(&server)
            .await;

        let client = TtsClient::new(TtsConfig::google("k").with_base_url(server.uri())).unwrap();
        let err = client.synthesize("Hello").await.unwrap_err();
        assert!(matches!(err, VoiceError::DecodingError(_)));
    }

    #[tokio::test]
    async fn test_google_rejects_unsupported_format() {
        let client = TtsClient::new(
            TtsConfig::google("k")
                .with_format(AudioFormat::Flac)
                .with_base_url("http://127.0.0.1:9"),
        )
        .unwrap();
        let err = client.synthesize("Hello").await.unwrap_err();
        assert!(matches!(err, VoiceError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn test_openai_synthesis() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(vec![1u8, 2, 3, 4]),
            )
            .mount(&server)
            .await;

        let client = TtsClient::new(TtsConfig::openai("test-key").with_base_url(server.uri())).unwrap();
        let result = client.synthesize("Hello").await.unwrap();
        assert_eq!(result.audio_data, vec![1, 2, 3, 4]);
        assert_eq!(result.content_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_synthesis_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let client = TtsClient::new(TtsConfig::google("bad").with_base_url(server.uri())).unwrap();
        match client.synthesize("Hello").await {
            Err(VoiceError::SynthesisFailed(msg)) => assert!(msg.contains("API key not valid")),
            other => panic!("unexpected result: {:?}", other.map(|r| r.audio_data.len())),
        }
    }
}
