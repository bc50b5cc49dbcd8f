//! End-to-end pipeline tests with mocked hosted services.
//!
//! Exercises the public surface the way a front door would: build a
//! pipeline over mock clients, submit requests, inspect outcomes and the
//! ledger afterwards.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use quizforge::config::{GenerationConfig, MediaConfig, StoreConfig};
use quizforge::errors::{ApiError, ExtractError, GenerateError, QuizforgeError};
use quizforge::extract::parse::DocumentParser;
use quizforge::extract::transcribe::SpeechClient;
use quizforge::extract::{Extractor, UploadSource};
use quizforge::generate::{GenerationParams, LlmClient, QuizGenerator};
use quizforge::identity::Identity;
use quizforge::ledger::{CreditStore, MemoryStore};
use quizforge::pipeline::{Pipeline, PipelineOutcome, QuizRequest};

struct StubSpeech(String);

#[async_trait]
impl SpeechClient for StubSpeech {
    async fn transcribe(&self, _audio_path: &Path) -> Result<String, ApiError> {
        Ok(self.0.clone())
    }
}

struct StubParser(String);

#[async_trait]
impl DocumentParser for StubParser {
    async fn parse_markdown(
        &self,
        _path: &Path,
        _file_name: &str,
    ) -> Result<Vec<String>, ExtractError> {
        Ok(vec![self.0.clone()])
    }
}

struct StubLlm(String);

#[async_trait]
impl LlmClient for StubLlm {
    async fn complete_json(
        &self,
        _system: &str,
        _user: &str,
        _schema: serde_json::Value,
    ) -> Result<String, ApiError> {
        Ok(self.0.clone())
    }
}

const QUIZ_JSON: &str = r#"{
    "questions": [
        {
            "scenario": "Which stage runs first?",
            "options": ["Extraction", "Generation", "Export"],
            "correct_option_id": 0,
            "explanation": "Text must exist before a quiz can."
        },
        {
            "scenario": "How many credits does one quiz cost?",
            "options": ["One", "Two"],
            "correct_option_id": 0,
            "explanation": "Each successful generation costs one credit."
        }
    ]
}"#;

fn long_text() -> String {
    "Extraction turns uploads into plain text for the quiz model. ".repeat(5)
}

fn pipeline(
    extracted: &str,
    llm_response: &str,
    ledger: Arc<dyn CreditStore>,
) -> Pipeline<StubLlm> {
    let extractor = Extractor::new(
        Arc::new(StubSpeech(extracted.to_string())),
        Arc::new(StubParser(extracted.to_string())),
        MediaConfig::default(),
    );
    let generator = QuizGenerator::new(
        StubLlm(llm_response.to_string()),
        GenerationConfig::default(),
    );
    Pipeline::new(extractor, generator, ledger, StoreConfig::default())
}

fn student() -> Identity {
    Identity::email("student@example.com").unwrap()
}

fn txt_upload() -> UploadSource {
    UploadSource::Memory {
        file_name: "lecture-notes.txt".into(),
        bytes: b"contents are supplied by the stub parser".to_vec(),
    }
}

#[tokio::test]
async fn test_document_request_completes_and_charges() {
    let ledger = Arc::new(MemoryStore::with_balance(&student(), 5));
    let p = pipeline(&long_text(), QUIZ_JSON, ledger.clone());

    let request = QuizRequest::new(student(), txt_upload(), GenerationParams::default());
    match p.run(request).await.unwrap() {
        PipelineOutcome::Completed {
            quiz,
            remaining_credits,
        } => {
            assert_eq!(quiz.len(), 2);
            assert_eq!(remaining_credits, 4);
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_repeat_requests_drain_the_balance() {
    let ledger = Arc::new(MemoryStore::with_balance(&student(), 2));
    let p = pipeline(&long_text(), QUIZ_JSON, ledger.clone());

    for expected_remaining in [1, 0] {
        let request = QuizRequest::new(student(), txt_upload(), GenerationParams::default());
        match p.run(request).await.unwrap() {
            PipelineOutcome::Completed {
                remaining_credits, ..
            } => assert_eq!(remaining_credits, expected_remaining),
            other => panic!("expected completion, got {other:?}"),
        }
    }

    // Third request finds an empty balance.
    let request = QuizRequest::new(student(), txt_upload(), GenerationParams::default());
    assert!(matches!(
        p.run(request).await.unwrap(),
        PipelineOutcome::InsufficientCredits { balance: 0 }
    ));
}

#[tokio::test]
async fn test_unsupported_extension_is_an_extract_error() {
    let ledger = Arc::new(MemoryStore::with_balance(&student(), 5));
    let p = pipeline(&long_text(), QUIZ_JSON, ledger.clone());

    let request = QuizRequest::new(
        student(),
        UploadSource::Memory {
            file_name: "notes.exe".into(),
            bytes: vec![0],
        },
        GenerationParams::default(),
    );
    let err = p.run(request).await.unwrap_err();
    assert!(matches!(
        err,
        QuizforgeError::Extract(ExtractError::UnsupportedType { .. })
    ));
    // Failed requests are free.
    assert_eq!(ledger.balance(&student()).await.unwrap(), 5);
}

#[tokio::test]
async fn test_short_extraction_result_is_a_generate_error() {
    let ledger = Arc::new(MemoryStore::with_balance(&student(), 5));
    let p = pipeline("too short to quiz", QUIZ_JSON, ledger.clone());

    let request = QuizRequest::new(student(), txt_upload(), GenerationParams::default());
    let err = p.run(request).await.unwrap_err();
    assert!(matches!(
        err,
        QuizforgeError::Generate(GenerateError::SourceTooShort { .. })
    ));
    assert_eq!(ledger.balance(&student()).await.unwrap(), 5);
}

#[tokio::test]
async fn test_invalid_model_output_is_terminal_and_free() {
    let bad = r#"{"questions": [{"scenario": "Q?", "options": ["a"], "correct_option_id": 0, "explanation": "e"}]}"#;
    let ledger = Arc::new(MemoryStore::with_balance(&student(), 5));
    let p = pipeline(&long_text(), bad, ledger.clone());

    let request = QuizRequest::new(student(), txt_upload(), GenerationParams::default());
    let err = p.run(request).await.unwrap_err();
    assert!(matches!(
        err,
        QuizforgeError::Generate(GenerateError::InvalidQuiz(_))
    ));
    assert_eq!(ledger.balance(&student()).await.unwrap(), 5);
}

#[tokio::test]
async fn test_request_ids_are_unique() {
    let a = QuizRequest::new(student(), txt_upload(), GenerationParams::default());
    let b = QuizRequest::new(student(), txt_upload(), GenerationParams::default());
    assert_ne!(a.id, b.id);
}
