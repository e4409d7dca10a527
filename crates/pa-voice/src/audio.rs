//! Local audio file storage
//!
//! Synthesized audio is written under one directory and served from
//! `{public_base_url}/audio/{file name}`.

use std::path::PathBuf;

use pa_core::config::AudioNaming;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;
use crate::tts::AudioFormat;

const PREFIX_CHARS: usize = 10;
const DIGEST_HEX_CHARS: usize = 16;

/// The first ten characters of `text` with spaces replaced by `_`.
///
/// Anything outside ASCII letters, digits and `_ - , . '` is also replaced
/// by `_`, so the stem is safe both as a path segment and inside a URL.
pub fn prefix_stem(text: &str) -> String {
    let stem: String = text
        .chars()
        .take(PREFIX_CHARS)
        .map(|c| match c {
            ' ' => '_',
            c if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ',' | '.' | '\'') => c,
            _ => '_',
        })
        .collect();

    if stem.is_empty() {
        "audio".to_string()
    } else {
        stem
    }
}

fn digest_hex(text: &str, fingerprint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fingerprint.as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(DIGEST_HEX_CHARS);
    digest
}

/// Directory of synthesized audio files
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    base_url: String,
    naming: AudioNaming,
}

impl AudioStore {
    /// `base_url` is the public URL the directory is served under
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>, naming: AudioNaming) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            naming,
        }
    }

    /// File name for the audio of `text` spoken with the voice identified by
    /// `fingerprint`
    pub fn file_name_for(&self, text: &str, fingerprint: &str, format: AudioFormat) -> String {
        let stem = prefix_stem(text);
        match self.naming {
            AudioNaming::Prefix => format!("{}.{}", stem, format.extension()),
            AudioNaming::Hashed => format!(
                "{}-{}.{}",
                stem,
                digest_hex(text, fingerprint),
                format.extension()
            ),
        }
    }

    /// Public URL of a stored file
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url, file_name)
    }

    /// Write `bytes` to `file_name`, replacing any previous file of that name
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_stem() {
        assert_eq!(prefix_stem("Hello there, how are you?"), "Hello_ther");
        assert_eq!(prefix_stem("Hi"), "Hi");
        assert_eq!(prefix_stem("a/b\\c?d"), "a_b_c_d");
        assert_eq!(prefix_stem(""), "audio");
    }

    #[test]
    fn test_prefix_stem_is_ascii() {
        let stem = prefix_stem("¿Cómo estás?");
        assert_eq!(stem, "_C_mo_est_");
        assert!(stem.is_ascii());

        let store = AudioStore::new("audio", "http://host/audio", AudioNaming::Prefix);
        let name = store.file_name_for("¿Cómo estás?", "voice", AudioFormat::Mp3);
        assert_eq!(store.url_for(&name), "http://host/audio/_C_mo_est_.mp3");
    }

    #[test]
    fn test_prefix_names_collide() {
        let store = AudioStore::new("audio", "http://host/audio", AudioNaming::Prefix);
        let a = store.file_name_for("Hello there, how are you?", "voice", AudioFormat::Mp3);
        let b = store.file_name_for("Hello there, goodbye", "voice", AudioFormat::Mp3);
        assert_eq!(a, "Hello_ther.mp3");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hashed_names_are_distinct() {
        let store = AudioStore::new("audio", "http://host/audio", AudioNaming::Hashed);
        let a = store.file_name_for("Hello there, how are you?", "voice", AudioFormat::Mp3);
        let b = store.file_name_for("Hello there, goodbye", "voice", AudioFormat::Mp3);
        let c = store.file_name_for("Hello there, how are you?", "other voice", AudioFormat::Mp3);

        assert!(a.starts_with("Hello_ther-"));
        assert!(a.ends_with(".mp3"));
        assert_eq!(a.len(), "Hello_ther-".len() + DIGEST_HEX_CHARS + ".mp3".len());
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            a,
            store.file_name_for("Hello there, how are you?", "voice", AudioFormat::Mp3)
        );
    }

    #[test]
    fn test_url_for() {
        let store = AudioStore::new("audio", "https://example.com/audio/", AudioNaming::Prefix);
        assert_eq!(
            store.url_for("Hello_ther.mp3"),
            "https://example.com/audio/Hello_ther.mp3"
        );
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioStore::new(dir.path().join("audio"), "http://host/audio", AudioNaming::Prefix);

        let path = store.save("Hello_ther.mp3", b"first").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"first");

        store.save("Hello_ther.mp3", b"second").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"second");
    }
}
