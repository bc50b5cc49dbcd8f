//! Unit tests for quizforge modules
//!
//! These tests cover individual components without network I/O.

mod test_config;
mod test_export;
mod test_ledger;
mod test_pipeline;
