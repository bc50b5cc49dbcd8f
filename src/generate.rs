//! Quiz Generation
//!
//! Builds a schema-constrained completion request from extracted text and
//! decodes the result into a [`Quiz`]. The source text is truncated to a
//! fixed character budget to bound model context, and the decoded quiz is
//! re-validated before it reaches any caller. A schema violation or a
//! service error is terminal for the request; nothing is retried.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{Config, GenerationConfig};
use crate::errors::{ApiError, GenerateError};
use crate::quiz::{quiz_json_schema, Quiz, MAX_OPTIONS, MIN_OPTIONS};

/// Trait abstraction over the completion API, enabling test mocking.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Request a completion constrained to the given JSON schema and
    /// return the raw JSON content of the first choice.
    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        schema: serde_json::Value,
    ) -> Result<String, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// Per-request generation parameters.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub count: usize,
    pub difficulty: Difficulty,
    pub language: String,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            count: 5,
            difficulty: Difficulty::Medium,
            language: "English".to_string(),
        }
    }
}

pub struct QuizGenerator<C: LlmClient> {
    client: C,
    limits: GenerationConfig,
}

impl<C: LlmClient> QuizGenerator<C> {
    pub fn new(client: C, limits: GenerationConfig) -> Self {
        Self { client, limits }
    }

    pub async fn generate(
        &self,
        text: &str,
        params: &GenerationParams,
    ) -> Result<Quiz, GenerateError> {
        let length = text.chars().count();
        if length < self.limits.min_source_chars {
            return Err(GenerateError::SourceTooShort {
                length,
                minimum: self.limits.min_source_chars,
            });
        }

        // max(1) keeps the clamp bounds ordered even for a zero limit.
        let count = params.count.clamp(1, self.limits.max_questions.max(1));
        let truncated = truncate_chars(text, self.limits.max_source_chars);
        let system = build_instruction(count, params.difficulty, &params.language);
        debug!(
            source_chars = truncated.chars().count(),
            count, "requesting quiz completion"
        );

        let raw = self
            .client
            .complete_json(&system, &truncated, quiz_json_schema())
            .await?;

        let quiz: Quiz = serde_json::from_str(&raw)
            .map_err(|e| GenerateError::MalformedQuiz(e.to_string()))?;
        quiz.validate()?;
        info!(questions = quiz.len(), "quiz generated");
        Ok(quiz)
    }
}

/// The natural-language instruction for the model. Keeps questions and
/// options short enough to survive the chat-poll limits downstream.
fn build_instruction(count: usize, difficulty: Difficulty, language: &str) -> String {
    format!(
        "Create a multiple-choice quiz based on the text. \
         Language: {language}. Difficulty: {difficulty}. Questions: {count}. \
         'scenario' is the question text. 'options' is a list of \
         {MIN_OPTIONS}-{MAX_OPTIONS} strings. 'correct_option_id' is the \
         0-based integer index of the correct answer. 'explanation' briefly \
         says why the answer is correct. Keep questions under 300 \
         characters and options under 100 characters."
    )
}

/// Truncate to at most `max_chars` characters, never splitting a char.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Production completion client speaking the chat-completions protocol
/// with a `json_schema` response format.
pub struct HostedLlmClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl HostedLlmClient {
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
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmClient for HostedLlmClient {
    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        schema: serde_json::Value,
    ) -> Result<String, ApiError> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "quiz",
                    "strict": true,
                    "schema": schema,
                }
            }
        });

        let url = format!("{}/chat/completions", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                message: crate::telemetry::redact_secrets(&text),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Parse("response contained no choices".into()))?;
        Ok(choice.message.content)
    }
}
