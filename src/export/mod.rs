//! Export Renderers
//!
//! Pure functions over a generated quiz: a self-contained interactive HTML
//! page, a landscape PDF certificate, and the poll shape used when a
//! question is posted to a chat platform. No network calls happen here.

pub mod certificate;
pub mod html;
pub mod poll;

pub use certificate::{render_certificate, CertificateRequest};
pub use html::render_html;
pub use poll::{
    PollQuestion, POLL_EXPLANATION_MAX_CHARS, POLL_OPTION_MAX_CHARS, POLL_QUESTION_MAX_CHARS,
};
