//! Configuration Management
//!
//! Loads pipeline configuration from a TOML file with environment-variable
//! overrides for credentials. Configuration covers:
//! - Hosted-service credentials (speech/LLM key, document-parser key)
//! - Remote credit store (URL + service key), optional
//! - Generation limits (question count bounds, source truncation)
//! - Media handling (compression threshold, ffmpeg binary)
//! - Certificate rendering (optional Unicode font path)
//!
//! Missing credentials for a service that is about to be used are a fatal
//! startup error, before any work is accepted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::QuizforgeError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Key for the speech-to-text and quiz-model service.
    pub openai_api_key: Option<String>,
    /// Key for the cloud document-parsing service.
    pub parse_api_key: Option<String>,
    /// Token for a chat-bot front door, when one is deployed.
    pub bot_token: Option<String>,

    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_transcribe_model")]
    pub transcribe_model: String,
    #[serde(default = "default_parse_endpoint")]
    pub parse_endpoint: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Remote credit store settings. When `url`/`service_key` are absent the
/// pipeline falls back to the in-memory store (selected here, by
/// configuration, never by runtime type inspection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
    /// Credits granted to a web account on registration.
    #[serde(default = "default_signup_credits")]
    pub signup_credits: u32,
    /// Credits granted to a bot handle on first contact.
    #[serde(default = "default_bot_signup_credits")]
    pub bot_signup_credits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Inputs shorter than this are rejected as insufficient.
    #[serde(default = "default_min_source_chars")]
    pub min_source_chars: usize,
    /// Source text is truncated to this many chars before prompting.
    #[serde(default = "default_max_source_chars")]
    pub max_source_chars: usize,
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Audio above this size is re-encoded before transcription.
    #[serde(default = "default_compress_threshold")]
    pub compress_threshold_bytes: u64,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// TTF font with Cyrillic coverage for certificates. Falls back to a
    /// builtin Latin font when unset or unreadable.
    pub certificate_font: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            parse_api_key: None,
            bot_token: None,
            llm_endpoint: default_llm_endpoint(),
            model: default_model(),
            transcribe_model: default_transcribe_model(),
            parse_endpoint: default_parse_endpoint(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
            store: StoreConfig::default(),
            generation: GenerationConfig::default(),
            media: MediaConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            signup_credits: default_signup_credits(),
            bot_signup_credits: default_bot_signup_credits(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_source_chars: default_min_source_chars(),
            max_source_chars: default_max_source_chars(),
            max_questions: default_max_questions(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            compress_threshold_bytes: default_compress_threshold(),
            audio_bitrate: default_audio_bitrate(),
            ffmpeg_bin: default_ffmpeg_bin(),
        }
    }
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_transcribe_model() -> String {
    "whisper-1".to_string()
}
fn default_parse_endpoint() -> String {
    "https://api.cloud.llamaindex.ai/api/parsing".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_request_timeout() -> u64 {
    300
}
fn default_signup_credits() -> u32 {
    5
}
fn default_bot_signup_credits() -> u32 {
    3
}
fn default_min_source_chars() -> usize {
    50
}
fn default_max_source_chars() -> usize {
    50_000
}
fn default_max_questions() -> usize {
    20
}
fn default_compress_threshold() -> u64 {
    24 * 1024 * 1024
}
fn default_audio_bitrate() -> String {
    "32k".to_string()
}
fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

impl Config {
    /// Load configuration from an explicit path, or `quizforge.toml` in the
    /// working directory if present, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new("quizforge.toml");
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Environment variables win over file values so deployments can keep
    /// secrets out of the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            if !v.is_empty() {
                self.openai_api_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var("PARSE_API_KEY") {
            if !v.is_empty() {
                self.parse_api_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var("BOT_TOKEN") {
            if !v.is_empty() {
                self.bot_token = Some(v);
            }
        }
        if let Ok(v) = std::env::var("CREDIT_STORE_URL") {
            if !v.is_empty() {
                self.store.url = Some(v);
            }
        }
        if let Ok(v) = std::env::var("CREDIT_STORE_KEY") {
            if !v.is_empty() {
                self.store.service_key = Some(v);
            }
        }
    }

    /// Validate that the configuration can support a pipeline run.
    /// Called once at startup; failures here halt before accepting work.
    pub fn validate(&self) -> crate::errors::Result<()> {
        if self.openai_api_key.as_deref().unwrap_or("").is_empty() {
            return Err(QuizforgeError::Config(
                "OPENAI_API_KEY is not set (config key `openai_api_key`)".into(),
            ));
        }
        if self.parse_api_key.as_deref().unwrap_or("").is_empty() {
            return Err(QuizforgeError::Config(
                "PARSE_API_KEY is not set (config key `parse_api_key`)".into(),
            ));
        }
        if self.store.url.is_some() != self.store.service_key.is_some() {
            return Err(QuizforgeError::Config(
                "store.url and store.service_key must be set together".into(),
            ));
        }
        if self.generation.min_source_chars == 0
            || self.generation.min_source_chars >= self.generation.max_source_chars
        {
            return Err(QuizforgeError::Config(
                "generation.min_source_chars must be positive and below max_source_chars".into(),
            ));
        }
        if self.generation.max_questions == 0 {
            return Err(QuizforgeError::Config(
                "generation.max_questions must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn has_remote_store(&self) -> bool {
        self.store.url.is_some() && self.store.service_key.is_some()
    }
}
