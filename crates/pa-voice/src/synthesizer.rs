//! Text to a playable audio URL

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::audio::AudioStore;
use crate::error::Result;
use crate::tts::TtsClient;

/// A synthesized utterance stored where the telephony provider can fetch it
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub file_name: String,
    pub path: PathBuf,
    /// Public URL of the file
    pub url: String,
    pub bytes: usize,
}

/// Speaks text into a stored audio file
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio>;
}

/// Synthesizer backed by a TTS API and a local audio directory
pub struct TtsSynthesizer {
    client: TtsClient,
    store: AudioStore,
}

impl TtsSynthesizer {
    pub fn new(client: TtsClient, store: AudioStore) -> Self {
        Self { client, store }
    }
}

#[async_trait]
impl SpeechSynthesizer for TtsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        let result = self.client.synthesize(text).await?;

        let config = self.client.config();
        let file_name = self
            .store
            .file_name_for(text, &config.fingerprint(), result.format);
        let path = self.store.save(&file_name, &result.audio_data).await?;
        let url = self.store.url_for(&file_name);

        info!("Audio content written to file {}", path.display());

        Ok(SynthesizedAudio {
            file_name,
            path,
            url,
            bytes: result.audio_data.len(),
        })
    }
}
