//! Speech-to-text client.
//!
//! Posts prepared audio to the hosted transcription endpoint as multipart
//! form data and takes the `text` field of the JSON response. The trait
//! seam exists so the extractor can be exercised without network access.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::errors::ApiError;
use crate::telemetry::redact_secrets;

#[async_trait]
pub trait SpeechClient: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, ApiError>;
}

pub struct HostedSpeechClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl HostedSpeechClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.llm_endpoint.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone().unwrap_or_default(),
            model: config.transcribe_model.clone(),
        })
    }
}

#[async_trait]
impl SpeechClient for HostedSpeechClient {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(audio_path)
            .await
            .map_err(|e| ApiError::Network(format!("cannot read prepared audio: {e}")))?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        debug!(
            file = %crate::telemetry::sanitize_for_log(&file_name),
            bytes = bytes.len(),
            "submitting audio for transcription"
        );

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", part);

        let url = format!("{}/audio/transcriptions", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                message: redact_secrets(&body),
            });
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(parsed.text)
    }
}
