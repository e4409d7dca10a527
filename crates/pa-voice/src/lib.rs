//! pa-voice: Speech synthesis for phone-agent
//!
//! Turns reply text into an audio file the telephony provider can fetch.
//!
//! ## Features
//!
//! - **Text-to-Speech**: Google Cloud Text-to-Speech and OpenAI TTS
//! - **Audio files**: written to a local directory and addressed by URL
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pa_voice::{AudioStore, SpeechSynthesizer, TtsClient, TtsConfig, TtsSynthesizer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tts = TtsClient::new(TtsConfig::google("your-api-key"))?;
//!     let store = AudioStore::new("data/audio", "https://example.com/audio", Default::default());
//!     let synthesizer = TtsSynthesizer::new(tts, store);
//!
//!     let audio = synthesizer.synthesize("Hello, world!").await?;
//!     println!("Play {}", audio.url);
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod error;
pub mod synthesizer;
pub mod tts;

pub use audio::{AudioStore, prefix_stem};
pub use error::{Result, VoiceError};
pub use synthesizer::{SpeechSynthesizer, SynthesizedAudio, TtsSynthesizer};
pub use tts::{AudioFormat, SynthesisResult, TtsClient, TtsConfig, TtsProvider};
