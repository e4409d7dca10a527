//! Configuration management
//!
//! Settings are resolved in this order (later sources win):
//! 1. Built-in defaults
//! 2. `phone-agent.toml` (or the path passed with `--config`)
//! 3. Environment variables
//!
//! Inside the config file, `${VAR_NAME}` is replaced with the value of the
//! environment variable before the TOML is parsed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "phone-agent.toml";

/// Route the telephony provider calls back on every turn
pub const WEBHOOK_PATH: &str = "/twilio-webhook";

/// Route under which synthesized audio files are served
pub const AUDIO_PATH: &str = "/audio";

/// LLM provider type
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API
    #[serde(alias = "anthropic")]
    Claude,
    /// OpenAI-compatible chat completions API
    #[default]
    OpenAi,
}

impl LlmProvider {
    /// Map a provider name from the environment to a provider
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "claude" | "anthropic" => Self::Claude,
            _ => Self::OpenAi,
        }
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Claude => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4",
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key
    pub api_key: String,

    /// Model to use. Empty selects the provider's default.
    #[serde(default)]
    pub model: String,

    /// API provider
    pub provider: LlmProvider,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,

    /// Optional system prompt sent with every turn
    pub system_prompt: Option<String>,

    /// Completion token limit
    pub max_tokens: u64,

    /// Sentence spoken when no reply could be generated
    pub fallback_reply: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: LlmProvider::OpenAi.default_model().to_string(),
            provider: LlmProvider::OpenAi,
            base_url: None,
            system_prompt: None,
            max_tokens: 1024,
            fallback_reply: crate::reply::DEFAULT_FALLBACK_REPLY.to_string(),
        }
    }
}

impl LlmConfig {
    /// Switch provider, moving an unset or provider-default model to the
    /// new provider's default
    pub fn set_provider(&mut self, provider: LlmProvider) {
        if self.model.is_empty() || self.model == self.provider.default_model() {
            self.model = provider.default_model().to_string();
        }
        self.provider = provider;
    }

    fn fill_default_model(&mut self) {
        if self.model.trim().is_empty() {
            self.model = self.provider.default_model().to_string();
        }
    }
}

/// Text-to-speech provider type
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpeechProvider {
    /// Google Cloud Text-to-Speech
    #[default]
    Google,
    /// OpenAI-compatible `/audio/speech`
    OpenAi,
}

impl SpeechProvider {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "openai" => Self::OpenAi,
            _ => Self::Google,
        }
    }
}

/// Text-to-speech configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub provider: SpeechProvider,
    pub api_key: String,
    /// Model name (OpenAI only)
    pub model: Option<String>,
    /// Google: SSML gender or voice name. OpenAI: voice name.
    pub voice: Option<String>,
    /// BCP-47 language code (Google only)
    pub language_code: String,
    /// Speaking rate
    pub speed: Option<f32>,
    pub base_url: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider: SpeechProvider::Google,
            api_key: String::new(),
            model: None,
            voice: None,
            language_code: "en-US".to_string(),
            speed: None,
            base_url: None,
        }
    }
}

/// How synthesized audio files are named
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioNaming {
    /// First 10 characters of the text; equal prefixes share one file
    Prefix,
    /// Prefix plus a digest of the full text and voice settings
    #[default]
    Hashed,
}

impl AudioNaming {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "prefix" => Self::Prefix,
            _ => Self::Hashed,
        }
    }
}

/// Audio file storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AudioConfig {
    /// Directory the audio files are written to and served from
    pub dir: PathBuf,
    pub naming: AudioNaming,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/audio"),
            naming: AudioNaming::Hashed,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Port for the HTTP server
    pub port: u16,

    /// Externally reachable base URL, used in callback and audio URLs
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            public_base_url: format!("http://localhost:{}", default_port()),
        }
    }
}

fn default_port() -> u16 {
    3000
}

/// Twilio account configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Source number outbound calls are placed from
    pub phone_number: String,
    pub base_url: Option<String>,
}

/// Customer store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CustomersConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
}

impl Default for CustomersConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/customers.db"),
        }
    }
}

/// Main configuration for phone-agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Timeout applied to every outbound HTTP request
    pub http_timeout_secs: u64,
    pub server: ServerConfig,
    pub twilio: TwilioConfig,
    pub llm: LlmConfig,
    pub tts: SpeechConfig,
    pub audio: AudioConfig,
    pub customers: CustomersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_timeout_secs: 120,
            server: ServerConfig::default(),
            twilio: TwilioConfig::default(),
            llm: LlmConfig::default(),
            tts: SpeechConfig::default(),
            audio: AudioConfig::default(),
            customers: CustomersConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file (or the default file if present),
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Read a TOML config file, expanding `${VAR}` references
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse TOML config content, expanding `${VAR}` references
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(content, |name| std::env::var(name).ok());
        let mut config: Self = toml::from_str(&expanded)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.llm.fill_default_model();
        Ok(config)
    }

    /// Replace `${VAR_NAME}` with the looked-up value.
    ///
    /// Unknown variables expand to the empty string.
    fn expand_env_vars(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
        let mut result = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Some(value) = lookup(&var_name) {
                    result.push_str(&value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Override settings from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override settings from a variable lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        // Server
        if let Some(port) = get("SERVER_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = get("PUBLIC_BASE_URL") {
            self.server.public_base_url = url;
        }

        // Twilio
        if let Some(sid) = get("TWILIO_ACCOUNT_SID") {
            self.twilio.account_sid = sid;
        }
        if let Some(token) = get("TWILIO_AUTH_TOKEN") {
            self.twilio.auth_token = token;
        }
        if let Some(number) = get("TWILIO_PHONE_NUMBER") {
            self.twilio.phone_number = number;
        }
        if let Some(url) = get("TWILIO_BASE_URL") {
            self.twilio.base_url = Some(url);
        }

        // LLM
        if let Some(provider) = get("LLM_PROVIDER") {
            self.llm.set_provider(LlmProvider::from_name(&provider));
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(api_key) = get("LLM_API_KEY") {
            self.llm.api_key = api_key;
        }
        if let Some(url) = get("LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }

        // TTS
        if let Some(provider) = get("TTS_PROVIDER") {
            self.tts.provider = SpeechProvider::from_name(&provider);
        }
        if let Some(api_key) = get("TTS_API_KEY") {
            self.tts.api_key = api_key;
        }
        if let Some(url) = get("TTS_BASE_URL") {
            self.tts.base_url = Some(url);
        }

        // Audio
        if let Some(dir) = get("AUDIO_DIR") {
            self.audio.dir = PathBuf::from(dir);
        }
        if let Some(naming) = get("AUDIO_NAMING") {
            self.audio.naming = AudioNaming::from_name(&naming);
        }

        // Customers
        if let Some(path) = get("CUSTOMERS_DB_PATH") {
            self.customers.db_path = PathBuf::from(path);
        }
    }

    /// Check the settings the server cannot run without
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("twilio.account_sid", &self.twilio.account_sid),
            ("twilio.auth_token", &self.twilio.auth_token),
            ("twilio.phone_number", &self.twilio.phone_number),
            ("llm.api_key", &self.llm.api_key),
            ("tts.api_key", &self.tts.api_key),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        }

        let base = &self.server.public_base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!(
                "server.public_base_url must be an absolute http(s) URL, got {:?}",
                base
            )));
        }

        Ok(())
    }

    /// Public base URL without a trailing slash
    pub fn public_base_url(&self) -> &str {
        self.server.public_base_url.trim_end_matches('/')
    }

    /// URL the telephony provider is sent back to after every turn
    pub fn webhook_url(&self) -> String {
        format!("{}{}", self.public_base_url(), WEBHOOK_PATH)
    }

    /// Base URL synthesized audio file names are appended to
    pub fn audio_base_url(&self) -> String {
        format!("{}{}", self.public_base_url(), AUDIO_PATH)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm.fallback_reply, "I'm sorry, I didn't understand that.");
        assert_eq!(config.tts.provider, SpeechProvider::Google);
        assert_eq!(config.tts.language_code, "en-US");
        assert_eq!(config.audio.naming, AudioNaming::Hashed);
        assert_eq!(config.http_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_expand_env_vars() {
        let lookup = lookup_from(&[("PA_TEST_VAR", "test_value")]);

        let result = Config::expand_env_vars("prefix_${PA_TEST_VAR}_suffix", &lookup);
        assert_eq!(result, "prefix_test_value_suffix");

        let result = Config::expand_env_vars("prefix_${NONEXISTENT_VAR}_suffix", &lookup);
        assert_eq!(result, "prefix__suffix");
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        let result = Config::expand_env_vars("cost: $5 and no_vars_here", |_| None);
        assert_eq!(result, "cost: $5 and no_vars_here");
    }

    #[test]
    fn test_expand_env_vars_empty_name() {
        let result = Config::expand_env_vars("${}_content", |_| None);
        assert_eq!(result, "_content");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
http_timeout_secs = 30

[server]
port = 8080
public_base_url = "https://agent.example.com/"

[twilio]
account_sid = "AC123"
auth_token = "secret"
phone_number = "+15550001111"

[llm]
provider = "claude"
model = "claude-sonnet-4-20250514"
api_key = "llm_key"
fallback_reply = "Sorry?"

[tts]
provider = "openai"
api_key = "tts_key"
voice = "nova"

[audio]
dir = "/tmp/audio"
naming = "prefix"

[customers]
db_path = "/tmp/customers.db"
"#;

        let config = Config::from_toml_str(toml_content).unwrap();
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.twilio.account_sid, "AC123");
        assert_eq!(config.llm.provider, LlmProvider::Claude);
        assert_eq!(config.llm.fallback_reply, "Sorry?");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.tts.provider, SpeechProvider::OpenAi);
        assert_eq!(config.tts.voice.as_deref(), Some("nova"));
        assert_eq!(config.tts.language_code, "en-US");
        assert_eq!(config.audio.naming, AudioNaming::Prefix);
        assert_eq!(config.audio.dir, PathBuf::from("/tmp/audio"));
        assert_eq!(config.customers.db_path, PathBuf::from("/tmp/customers.db"));

        assert_eq!(config.webhook_url(), "https://agent.example.com/twilio-webhook");
        assert_eq!(config.audio_base_url(), "https://agent.example.com/audio");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("[llm]\napi_key = \"k\"\n").unwrap();
        assert_eq!(config.llm.api_key, "k");
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml_str("[server\nport = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = Config::from_toml_file("/nonexistent/phone-agent.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[
            ("SERVER_PORT", "9000"),
            ("PUBLIC_BASE_URL", "https://calls.example.com"),
            ("TWILIO_ACCOUNT_SID", "AC999"),
            ("LLM_PROVIDER", "anthropic"),
            ("LLM_MODEL", ""),
            ("TTS_PROVIDER", "openai"),
            ("AUDIO_NAMING", "prefix"),
            ("CUSTOMERS_DB_PATH", "/var/lib/customers.db"),
        ]));

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.public_base_url, "https://calls.example.com");
        assert_eq!(config.twilio.account_sid, "AC999");
        assert_eq!(config.llm.provider, LlmProvider::Claude);
        // Empty LLM_MODEL is ignored, so the new provider's default applies
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
        assert_eq!(config.tts.provider, SpeechProvider::OpenAi);
        assert_eq!(config.audio.naming, AudioNaming::Prefix);
        assert_eq!(config.customers.db_path, PathBuf::from("/var/lib/customers.db"));
    }

    #[test]
    fn test_claude_provider_gets_claude_model() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[("LLM_PROVIDER", "claude")]));
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");

        let config = Config::from_toml_str("[llm]\nprovider = \"claude\"\n").unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Claude);
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_explicit_model_survives_provider_override() {
        let mut config =
            Config::from_toml_str("[llm]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\n").unwrap();
        config.apply_overrides(lookup_from(&[("LLM_PROVIDER", "claude")]));
        assert_eq!(config.llm.provider, LlmProvider::Claude);
        assert_eq!(config.llm.model, "gpt-4o-mini");

        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[
            ("LLM_PROVIDER", "claude"),
            ("LLM_MODEL", "claude-3-5-haiku-latest"),
        ]));
        assert_eq!(config.llm.model, "claude-3-5-haiku-latest");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[("SERVER_PORT", "not-a-port")]));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validate_reports_missing_settings() {
        let err = Config::default().validate().unwrap_err().to_string();
        assert!(err.contains("twilio.account_sid"));
        assert!(err.contains("llm.api_key"));
        assert!(err.contains("tts.api_key"));
    }

    #[test]
    fn test_validate_rejects_relative_base_url() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[
            ("TWILIO_ACCOUNT_SID", "AC1"),
            ("TWILIO_AUTH_TOKEN", "t"),
            ("TWILIO_PHONE_NUMBER", "+1555"),
            ("LLM_API_KEY", "k"),
            ("TTS_API_KEY", "k"),
        ]));
        assert!(config.validate().is_ok());

        config.server.public_base_url = "your-server-url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_from_name() {
        assert_eq!(LlmProvider::from_name("Claude"), LlmProvider::Claude);
        assert_eq!(LlmProvider::from_name("glm"), LlmProvider::OpenAi);
        assert_eq!(SpeechProvider::from_name("OPENAI"), SpeechProvider::OpenAi);
        assert_eq!(SpeechProvider::from_name("google"), SpeechProvider::Google);
        assert_eq!(AudioNaming::from_name("hashed"), AudioNaming::Hashed);
    }
}
