//! Poll shaping for chat-platform export.
//!
//! Chat platforms enforce hard string limits on quiz polls: question text
//! up to 300 characters, options up to 100, explanation up to 200. These
//! limits are an external contract; anything longer is truncated here, on
//! character boundaries, before a question leaves the process.

use crate::quiz::Question;

pub const POLL_QUESTION_MAX_CHARS: usize = 300;
pub const POLL_OPTION_MAX_CHARS: usize = 100;
pub const POLL_EXPLANATION_MAX_CHARS: usize = 200;

/// A question shaped to fit a platform quiz poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_option_id: usize,
    pub explanation: String,
}

impl From<&Question> for PollQuestion {
    fn from(q: &Question) -> Self {
        PollQuestion {
            question: truncate_chars(&q.scenario, POLL_QUESTION_MAX_CHARS),
            options: q
                .options
                .iter()
                .map(|o| truncate_chars(o, POLL_OPTION_MAX_CHARS))
                .collect(),
            correct_option_id: q.correct_option_id,
            explanation: truncate_chars(&q.explanation, POLL_EXPLANATION_MAX_CHARS),
        }
    }
}

/// Truncate to `max_chars` characters without splitting a character.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
