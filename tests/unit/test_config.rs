//! Config loading tests covering file parsing and validation.

use std::io::Write;

use quizforge::config::Config;

fn write_config(raw: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    f.write_all(raw.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn test_load_full_file() {
    let f = write_config(
        r#"
        openai_api_key = "sk-file"
        parse_api_key = "llx-file"
        model = "gpt-4o-mini"
        temperature = 0.5

        [store]
        url = "https://project.supabase.co"
        service_key = "service-role"
        signup_credits = 10

        [generation]
        max_questions = 12

        [media]
        compress_threshold_bytes = 1048576

        [export]
        certificate_font = "/fonts/DejaVuSans.ttf"
    "#,
    );

    let config = Config::load(Some(f.path())).unwrap();
    assert_eq!(config.model, "gpt-4o-mini");
    assert_eq!(config.store.signup_credits, 10);
    // Unset fields keep defaults.
    assert_eq!(config.store.bot_signup_credits, 3);
    assert_eq!(config.generation.max_questions, 12);
    assert_eq!(config.generation.min_source_chars, 50);
    assert_eq!(config.media.compress_threshold_bytes, 1_048_576);
    assert!(config.has_remote_store());
    assert!(config.export.certificate_font.is_some());
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_missing_file_is_an_error() {
    let err = Config::load(Some(std::path::Path::new("/nonexistent/quizforge.toml")));
    assert!(err.is_err());
}

#[test]
fn test_load_rejects_bad_toml() {
    let f = write_config("openai_api_key = [not closed");
    assert!(Config::load(Some(f.path())).is_err());
}

#[test]
fn test_validate_catches_missing_llm_key() {
    std::env::remove_var("OPENAI_API_KEY");
    let f = write_config(r#"parse_api_key = "llx-only""#);
    let config = Config::load(Some(f.path())).unwrap();
    // Loads fine; only validation enforces credentials.
    assert!(config.validate().is_err());
}

#[test]
fn test_keyless_store_config_defaults_to_memory() {
    std::env::remove_var("CREDIT_STORE_URL");
    std::env::remove_var("CREDIT_STORE_KEY");
    let f = write_config(
        r#"
        openai_api_key = "sk-test"
        parse_api_key = "llx-test"
    "#,
    );
    let config = Config::load(Some(f.path())).unwrap();
    assert!(!config.has_remote_store());
    assert!(config.validate().is_ok());
}
