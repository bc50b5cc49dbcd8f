//! Quiz data model.
//!
//! A quiz is immutable once generated and lives only in request state; the
//! ledger is the only persistent store in the system. Model output is
//! decoded into these types and then re-validated, because the hosted model
//! occasionally returns a correct-answer index outside the option list.

use serde::{Deserialize, Serialize};

use crate::errors::GenerateError;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The question text shown to the student.
    pub scenario: String,
    /// 2-4 answer options.
    pub options: Vec<String>,
    /// 0-based index of the correct option.
    pub correct_option_id: usize,
    /// Short explanation of why the answer is correct.
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<Question>,
}

impl Question {
    /// Enforce the structural invariant: 2-4 non-empty options and an
    /// in-range correct index.
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.scenario.trim().is_empty() {
            return Err(GenerateError::InvalidQuiz("empty question text".into()));
        }
        if self.options.len() < MIN_OPTIONS || self.options.len() > MAX_OPTIONS {
            return Err(GenerateError::InvalidQuiz(format!(
                "question has {} options, expected {MIN_OPTIONS}-{MAX_OPTIONS}",
                self.options.len()
            )));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(GenerateError::InvalidQuiz("empty answer option".into()));
        }
        if self.correct_option_id >= self.options.len() {
            return Err(GenerateError::InvalidQuiz(format!(
                "correct_option_id {} out of range for {} options",
                self.correct_option_id,
                self.options.len()
            )));
        }
        Ok(())
    }
}

impl Quiz {
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.questions.is_empty() {
            return Err(GenerateError::InvalidQuiz("quiz has no questions".into()));
        }
        for (i, q) in self.questions.iter().enumerate() {
            q.validate()
                .map_err(|e| GenerateError::InvalidQuiz(format!("question {}: {e}", i + 1)))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// JSON schema the model completion is constrained to. Kept next to the
/// types it mirrors so the two cannot drift apart silently.
pub fn quiz_json_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "scenario": { "type": "string" },
                        "options": {
                            "type": "array",
                            "items": { "type": "string" },
                            "minItems": MIN_OPTIONS,
                            "maxItems": MAX_OPTIONS
                        },
                        "correct_option_id": { "type": "integer", "minimum": 0 },
                        "explanation": { "type": "string" }
                    },
                    "required": ["scenario", "options", "correct_option_id", "explanation"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["questions"],
        "additionalProperties": false
    })
}
