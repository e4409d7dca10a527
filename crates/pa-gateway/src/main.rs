//! phone-agent: Twilio voice agent main binary
//!
//! Usage:
//!   phone-agent                              - Start the webhook server
//!   phone-agent --config <path>              - Start with a specific config file
//!   phone-agent --import-customers <file>    - Load customer records and exit
//!   phone-agent --help                       - Show help

mod import;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use pa_api::AppState;
use pa_core::{Config, LlmClient, LlmReplyGenerator, SqliteCustomerStore};
use pa_telephony::TwilioClient;
use pa_voice::{AudioStore, TtsClient, TtsConfig, TtsSynthesizer};
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Webhook server
    Serve { config: Option<PathBuf> },
    /// Load customer records from a JSON file
    ImportCustomers {
        config: Option<PathBuf>,
        file: PathBuf,
    },
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let mode = parse_args(std::env::args().skip(1))?;

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("phone-agent {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    match mode {
        RunMode::Serve { config } => {
            let config = Config::load(config.as_deref())
                .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
            run_server(config).await
        }
        RunMode::ImportCustomers { config, file } => {
            let config = Config::load(config.as_deref())
                .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
            let store = SqliteCustomerStore::new(&config.customers.db_path)
                .map_err(|e| anyhow::anyhow!("Failed to open customer store: {}", e))?;
            import::import_customers(&store, &file).await?;
            Ok(())
        }
        RunMode::Help | RunMode::Version => Ok(()),
    }
}

/// Parse command line arguments (without the program name)
fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<RunMode> {
    let mut args = args.into_iter();
    let mut config = None;
    let mut import = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => match args.next() {
                Some(path) => config = Some(PathBuf::from(path)),
                None => bail!("--config requires a path"),
            },
            "--import-customers" => match args.next() {
                Some(path) => import = Some(PathBuf::from(path)),
                None => bail!("--import-customers requires a JSON file"),
            },
            other => bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(match import {
        Some(file) => RunMode::ImportCustomers { config, file },
        None => RunMode::Serve { config },
    })
}

/// Print help message
fn print_help() {
    println!("phone-agent - Twilio voice agent");
    println!();
    println!("Usage:");
    println!("  phone-agent                            Start the webhook server");
    println!("  phone-agent --config <path>            Read settings from <path>");
    println!("  phone-agent --import-customers <file>  Load customer records from a JSON array (Mongo exports accepted)");
    println!("  phone-agent --help                     Show this help message");
    println!("  phone-agent --version                  Show version");
    println!();
    println!("Configuration is read from phone-agent.toml when present.");
    println!();
    println!("Environment Variables:");
    println!("  PUBLIC_BASE_URL      Externally reachable URL of this server");
    println!("  SERVER_PORT          HTTP port (default: 3000)");
    println!("  TWILIO_ACCOUNT_SID   Twilio account SID (required)");
    println!("  TWILIO_AUTH_TOKEN    Twilio auth token (required)");
    println!("  TWILIO_PHONE_NUMBER  Number outbound calls are placed from (required)");
    println!("  LLM_API_KEY          Language model API key (required)");
    println!("  LLM_PROVIDER         Provider: openai or claude (default: openai)");
    println!("  LLM_MODEL            Model name (default: gpt-4, or claude-sonnet-4-20250514 for claude)");
    println!("  TTS_API_KEY          Text-to-speech API key (required)");
    println!("  TTS_PROVIDER         Provider: google or openai (default: google)");
    println!("  AUDIO_DIR            Directory for synthesized audio (default: data/audio)");
    println!("  AUDIO_NAMING         Audio file naming: hashed or prefix (default: hashed)");
    println!("  CUSTOMERS_DB_PATH    Customer database (default: data/customers.db)");
    println!("  RUST_LOG             Log filter");
}

/// Build the collaborators and serve until Ctrl+C
async fn run_server(config: Config) -> anyhow::Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting phone-agent...");
    tracing::info!("Public URL: {}", config.public_base_url());
    tracing::info!("Model: {} ({:?})", config.llm.model, config.llm.provider);

    let timeout = config.http_timeout();

    let customers = SqliteCustomerStore::new(&config.customers.db_path)
        .map_err(|e| anyhow::anyhow!("Failed to open customer store: {}", e))?;

    let llm_client = LlmClient::new(&config.llm, timeout)
        .map_err(|e| anyhow::anyhow!("Failed to create LLM client: {}", e))?;
    let replies = LlmReplyGenerator::new(llm_client, &config.llm);

    std::fs::create_dir_all(&config.audio.dir).with_context(|| {
        format!(
            "Failed to create audio directory {}",
            config.audio.dir.display()
        )
    })?;
    let tts = TtsClient::new(TtsConfig::from_settings(&config.tts, timeout))
        .map_err(|e| anyhow::anyhow!("Failed to create TTS client: {}", e))?;
    let store = AudioStore::new(&config.audio.dir, config.audio_base_url(), config.audio.naming);
    tracing::info!(
        "Audio files in {} ({:?} naming)",
        config.audio.dir.display(),
        config.audio.naming
    );

    let twilio = TwilioClient::from_config(&config.twilio, timeout)
        .map_err(|e| anyhow::anyhow!("Failed to create Twilio client: {}", e))?;

    let state = AppState {
        config: Arc::new(config),
        customers: Arc::new(customers),
        calls: Arc::new(twilio),
        replies: Arc::new(replies),
        speech: Arc::new(TtsSynthesizer::new(tts, store)),
    };

    tracing::info!("phone-agent initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    pa_api::start_server(state, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_default() {
        assert_eq!(parse_args(args(&[])).unwrap(), RunMode::Serve { config: None });
    }

    #[test]
    fn test_parse_args_config() {
        assert_eq!(
            parse_args(args(&["--config", "agent.toml"])).unwrap(),
            RunMode::Serve {
                config: Some(PathBuf::from("agent.toml"))
            }
        );
    }

    #[test]
    fn test_parse_args_import() {
        assert_eq!(
            parse_args(args(&["-c", "agent.toml", "--import-customers", "customers.json"])).unwrap(),
            RunMode::ImportCustomers {
                config: Some(PathBuf::from("agent.toml")),
                file: PathBuf::from("customers.json"),
            }
        );
    }

    #[test]
    fn test_parse_args_help_and_version() {
        assert_eq!(parse_args(args(&["--help"])).unwrap(), RunMode::Help);
        assert_eq!(parse_args(args(&["-v"])).unwrap(), RunMode::Version);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["--import-customers"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
    }
}
