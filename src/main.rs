use std::process::ExitCode;

use quizforge::errors::get_exit_code;

#[tokio::main]
async fn main() -> ExitCode {
    match quizforge::cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(get_exit_code(&e))
        }
    }
}
