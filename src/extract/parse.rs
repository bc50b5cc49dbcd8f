//! Cloud document parser client.
//!
//! All document formats on the upload surface (pdf, docx, pptx, txt, xlsx,
//! csv) are routed to the same hosted parser requesting markdown output.
//! The service is job-based: upload the file, poll the job until it
//! settles, then fetch the markdown result. Result fragments are joined by
//! the extractor with blank-line separators.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::{ApiError, ExtractError};
use crate::telemetry::redact_secrets;

#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Parse a document into markdown fragments.
    async fn parse_markdown(
        &self,
        path: &Path,
        file_name: &str,
    ) -> Result<Vec<String>, ExtractError>;
}

pub struct CloudParseClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: u32,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct MarkdownResult {
    markdown: String,
}

impl CloudParseClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.parse_endpoint.trim_end_matches('/').to_string(),
            api_key: config.parse_api_key.clone().unwrap_or_default(),
            poll_interval: Duration::from_secs(2),
            max_polls: 150,
        })
    }

    async fn upload(&self, path: &Path, file_name: &str) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Network(format!("cannot read staged upload: {e}")))?;

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let form = multipart::Form::new()
            .text("result_type", "markdown")
            .part("file", part);

        let url = format!("{}/upload", self.endpoint);
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

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(parsed.id)
    }

    async fn job_status(&self, job_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/job/{}", self.endpoint, job_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
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

        let parsed: JobStatus = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(parsed.status)
    }

    async fn fetch_markdown(&self, job_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/job/{}/result/markdown", self.endpoint, job_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
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

        let parsed: MarkdownResult = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(parsed.markdown)
    }
}

#[async_trait]
impl DocumentParser for CloudParseClient {
    async fn parse_markdown(
        &self,
        path: &Path,
        file_name: &str,
    ) -> Result<Vec<String>, ExtractError> {
        let job_id = self
            .upload(path, file_name)
            .await
            .map_err(|e| ExtractError::Parsing(e.to_string()))?;
        debug!(
            job_id = %job_id,
            file = %crate::telemetry::sanitize_for_log(file_name),
            "document parse job submitted"
        );

        let mut last_status = String::from("PENDING");
        for _ in 0..self.max_polls {
            last_status = self
                .job_status(&job_id)
                .await
                .map_err(|e| ExtractError::Parsing(e.to_string()))?;
            match last_status.as_str() {
                "SUCCESS" => {
                    let markdown = self
                        .fetch_markdown(&job_id)
                        .await
                        .map_err(|e| ExtractError::Parsing(e.to_string()))?;
                    // The service returns one markdown body per job; page
                    // breaks inside it already carry blank-line separators.
                    return Ok(vec![markdown]);
                }
                "ERROR" | "CANCELED" => {
                    warn!(job_id = %job_id, status = %last_status, "parse job failed");
                    return Err(ExtractError::Parsing(format!(
                        "parse job {job_id} ended with status {last_status}"
                    )));
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }

        Err(ExtractError::ParseIncomplete {
            job_id,
            status: last_status,
        })
    }
}
