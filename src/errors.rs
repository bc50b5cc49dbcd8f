use thiserror::Error;

/// The central error type for the quizforge pipeline.
///
/// Each stage of the pipeline owns a domain enum so callers can branch on
/// the failure class (bad upload vs. service down vs. store unreachable)
/// without string-matching error messages.
#[derive(Error, Debug)]
pub enum QuizforgeError {
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Generation error: {0}")]
    Generate(#[from] GenerateError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures while turning an uploaded artifact into plain text.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file type: {extension:?}")]
    UnsupportedType { extension: String },

    #[error("Could not read upload '{name}': {message}")]
    Unreadable { name: String, message: String },

    #[error("Audio preparation failed: {0}")]
    AudioPrep(String),

    #[error("Transcription service error: {0}")]
    Transcription(#[from] ApiError),

    #[error("Document parsing failed: {0}")]
    Parsing(String),

    #[error("Document parsing did not finish (job {job_id}, last status {status})")]
    ParseIncomplete { job_id: String, status: String },

    #[error("No text could be extracted from the upload")]
    EmptyResult,
}

/// Failures while producing a quiz from extracted text.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Source text too short ({length} chars, minimum {minimum})")]
    SourceTooShort { length: usize, minimum: usize },

    #[error("Model service error: {0}")]
    Model(#[from] ApiError),

    #[error("Model returned malformed quiz: {0}")]
    MalformedQuiz(String),

    #[error("Quiz failed validation: {0}")]
    InvalidQuiz(String),
}

/// Failures talking to the credit store.
///
/// An insufficient balance is *not* an error: `deduct` reports it as
/// `Ok(false)` because it is an expected business outcome.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Credit store unavailable: {0}")]
    Unavailable(String),

    #[error("Credit store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed store response: {0}")]
    Parse(String),

    #[error("Account already exists: {identity}")]
    DuplicateAccount { identity: String },
}

/// Failures while rendering export artifacts.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Certificate rendering failed: {0}")]
    Certificate(String),

    #[error("Could not load font: {0}")]
    Font(String),
}

/// Errors shared by all hosted-service clients.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API request timed out")]
    Timeout,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("API returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if let Some(status) = e.status() {
            ApiError::HttpStatus {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, QuizforgeError>;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_EXTRACT_ERROR: u8 = 3;
pub const EXIT_API_ERROR: u8 = 4;
pub const EXIT_LEDGER_ERROR: u8 = 5;

/// Determine the appropriate process exit code for an error.
pub fn get_exit_code(e: &anyhow::Error) -> u8 {
    if let Some(err) = e.downcast_ref::<QuizforgeError>() {
        return match err {
            QuizforgeError::Config(_) => EXIT_CONFIG_ERROR,
            QuizforgeError::Extract(_) => EXIT_EXTRACT_ERROR,
            QuizforgeError::Generate(_) => EXIT_API_ERROR,
            QuizforgeError::Ledger(_) => EXIT_LEDGER_ERROR,
            _ => EXIT_ERROR,
        };
    }

    if e.downcast_ref::<ExtractError>().is_some() {
        return EXIT_EXTRACT_ERROR;
    }
    if e.downcast_ref::<GenerateError>().is_some() || e.downcast_ref::<ApiError>().is_some() {
        return EXIT_API_ERROR;
    }
    if e.downcast_ref::<LedgerError>().is_some() {
        return EXIT_LEDGER_ERROR;
    }

    EXIT_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_for_config_error() {
        let e: anyhow::Error = QuizforgeError::Config("missing key".into()).into();
        assert_eq!(get_exit_code(&e), EXIT_CONFIG_ERROR);
    }

    #[test]
    fn test_exit_code_for_extract_error() {
        let e: anyhow::Error = QuizforgeError::Extract(ExtractError::EmptyResult).into();
        assert_eq!(get_exit_code(&e), EXIT_EXTRACT_ERROR);
    }

    #[test]
    fn test_exit_code_for_direct_domain_enum() {
        let e: anyhow::Error = LedgerError::Unavailable("connection refused".into()).into();
        assert_eq!(get_exit_code(&e), EXIT_LEDGER_ERROR);
    }

    #[test]
    fn test_exit_code_for_plain_anyhow() {
        let e = anyhow::anyhow!("something else");
        assert_eq!(get_exit_code(&e), EXIT_ERROR);
    }

    #[test]
    fn test_api_error_message_includes_status() {
        let e = ApiError::HttpStatus {
            status: 429,
            message: "too many requests".into(),
        };
        assert!(e.to_string().contains("429"));
    }

    #[test]
    fn test_source_too_short_reports_lengths() {
        let e = GenerateError::SourceTooShort {
            length: 12,
            minimum: 50,
        };
        let msg = e.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("50"));
    }
}
