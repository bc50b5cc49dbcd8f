//! quizforge — turn lectures and documents into multiple-choice quizzes.
//!
//! The pipeline accepts an uploaded audio/video or document file, extracts
//! plain text from it (speech-to-text for media, cloud parsing for
//! documents), asks a schema-constrained language model for a quiz, and
//! renders the result as a self-contained HTML page, chat-poll questions,
//! or a PDF certificate. Each successful generation costs one credit from
//! a per-user ledger with an atomic decrement-with-floor.
//!
//! Quizzes are ephemeral: the credit ledger is the only persistent state.

pub mod cli;
pub mod config;
pub mod errors;
pub mod export;
pub mod extract;
pub mod generate;
pub mod identity;
pub mod ledger;
pub mod pipeline;
pub mod quiz;
pub mod telemetry;

pub use config::Config;
pub use errors::{QuizforgeError, Result};
pub use identity::Identity;
pub use pipeline::{Pipeline, PipelineOutcome, QuizRequest};
pub use quiz::{Question, Quiz};
