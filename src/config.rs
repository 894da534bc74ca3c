use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default confusion emotions (matched case-insensitively)
pub const DEFAULT_CONFUSION_EMOTIONS: [&str; 3] = ["neutral", "sad", "fear"];

/// Application configuration
///
/// Built once at startup and never mutated afterwards. Every adapter receives
/// the values it needs from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,
    pub bind_address: String,

    // Emotion classifier
    pub confusion_emotions: Vec<String>,
    pub classifier_url: String,
    pub classifier_detector_backend: String,
    pub frame_dir: PathBuf,
    pub max_upload_bytes: usize,

    // Language model (Ollama)
    pub llm_api_url: String,
    pub llm_model: String,

    // Speech synthesis
    pub tts_url: String,
    pub tts_language: String,
    pub static_dir: PathBuf,
    pub audio_retention_secs: u64,
    pub audio_sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            bind_address: "127.0.0.1:5000".to_string(),
            confusion_emotions: DEFAULT_CONFUSION_EMOTIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            classifier_url: "http://localhost:5005/analyze".to_string(),
            classifier_detector_backend: "opencv".to_string(),
            frame_dir: std::env::temp_dir().join("emotion-assist-frames"),
            max_upload_bytes: 10 * 1024 * 1024,
            llm_api_url: "http://localhost:11434/api/generate".to_string(),
            llm_model: "phi3".to_string(),
            tts_url: "https://translate.google.com/translate_tts".to_string(),
            tts_language: "en".to_string(),
            static_dir: PathBuf::from("static"),
            audio_retention_secs: 24 * 60 * 60,
            audio_sweep_interval_secs: 10 * 60,
        }
    }
}

impl Config {
    /// Get the default config directory
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".emotion-assist"))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default location or return default
    pub fn load_or_default() -> Self {
        let loaded = Self::config_path().and_then(|path| Self::load(&path));
        match loaded {
            Ok(config) => config,
            Err(e) => {
                debug!("Failed to load config, using default: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load config from file, or default when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            config.normalized()
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Validate fields and canonicalize the confusion set
    pub fn normalized(mut self) -> Result<Self> {
        self.socket_addr()?;

        self.confusion_emotions = self
            .confusion_emotions
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Ok(self)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.bind_address))
    }

    /// Directory synthesized clips are written to
    pub fn audio_dir(&self) -> PathBuf {
        self.static_dir.join("audio")
    }

    /// Create the directories the adapters write into
    pub fn prepare_directories(&self) -> Result<()> {
        let audio_dir = self.audio_dir();
        std::fs::create_dir_all(&audio_dir)
            .with_context(|| format!("Failed to create audio directory {}", audio_dir.display()))?;
        std::fs::create_dir_all(&self.frame_dir).with_context(|| {
            format!("Failed to create frame directory {}", self.frame_dir.display())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.confusion_emotions, vec!["neutral", "sad", "fear"]);
        assert_eq!(config.llm_api_url, "http://localhost:11434/api/generate");
        assert_eq!(config.llm_model, "phi3");
        assert_eq!(config.tts_language, "en");
    }

    #[test]
    fn test_audio_dir_under_static() {
        let config = Config::default();
        assert_eq!(config.audio_dir(), PathBuf::from("static").join("audio"));
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:5000");
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"llm_model": "llama3", "confusion_emotions": [" Angry ", "", "SAD"]}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.llm_model, "llama3");
        assert_eq!(config.confusion_emotions, vec!["angry", "sad"]);
        assert_eq!(config.tts_language, "en");
        assert_eq!(config.audio_retention_secs, 86_400);
    }

    #[test]
    fn test_load_rejects_bad_bind_address() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"bind_address": "not-an-address"}"#).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid bind address"));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.llm_model = "mistral".to_string();
        config.audio_retention_secs = 0;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.llm_model, "mistral");
        assert_eq!(loaded.audio_retention_secs, 0);
    }

    #[test]
    fn test_prepare_directories() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.static_dir = dir.path().join("static");
        config.frame_dir = dir.path().join("frames");

        config.prepare_directories().unwrap();
        assert!(config.audio_dir().is_dir());
        assert!(config.frame_dir.is_dir());
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path().unwrap();
        assert!(path.to_string_lossy().contains(".emotion-assist"));
        assert!(path.to_string_lossy().ends_with("config.json"));
    }
}
