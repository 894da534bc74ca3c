use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors that can occur during speech synthesis
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("No text to speak")]
    EmptyText,

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to connect to speech engine: {0}")]
    Connection(String),

    #[error("Speech engine returned error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Speech engine returned no audio")]
    EmptyAudio,

    #[error("Failed to write audio clip: {0}")]
    Write(String),
}

/// An external text-to-speech engine producing MP3 audio
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// Accept ASCII tags like `en`, `pt-br` or `zh-CN`
pub fn is_valid_language(language: &str) -> bool {
    if !(2..=12).contains(&language.len()) {
        return false;
    }

    let mut parts = language.split('-');
    let primary_ok = parts
        .next()
        .map(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false);

    primary_ok && parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// A synthesized clip under the public audio directory
#[derive(Debug, Clone)]
pub struct SpeechClip {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
}

pub struct SpeechSynthesizer {
    engine: Arc<dyn SpeechEngine>,
    audio_dir: PathBuf,
    url_prefix: String,
}

impl SpeechSynthesizer {
    /// `url_prefix` is the public path `audio_dir` is served under
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        audio_dir: impl Into<PathBuf>,
        url_prefix: &str,
    ) -> Self {
        Self {
            engine,
            audio_dir: audio_dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Synthesize `text` into a new `<uuid>.mp3` clip
    pub async fn synthesize(&self, text: &str, language: &str) -> Result<SpeechClip, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }
        if !is_valid_language(language) {
            return Err(SynthesisError::UnsupportedLanguage(language.to_string()));
        }

        let audio = self.engine.synthesize(text, language).await?;
        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        let filename = format!("{}.mp3", Uuid::new_v4());
        let path = self.audio_dir.join(&filename);

        write_new_file(&path, &audio)
            .await
            .map_err(|e| SynthesisError::Write(e.to_string()))?;

        info!(
            "Synthesized {} chars into {} ({} bytes)",
            text.chars().count(),
            filename,
            audio.len()
        );

        Ok(SpeechClip {
            url: format!("{}/{}", self.url_prefix, filename),
            filename,
            path,
        })
    }
}

/// Write `bytes` to a file that must not exist yet
///
/// A partial file is removed when the write fails. An existing file at
/// `path` is left untouched.
async fn write_new_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        drop(file);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "Failed to remove partial clip");
        }
    }
    written
}
