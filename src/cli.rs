//! Command-line interface.
//!
//! `generate` runs the full pipeline against a local file and writes the
//! interactive HTML quiz. `certificate` renders a completion certificate.
//! `credits` and `account` talk to the credit store directly, for
//! operating the ledger without going through a pipeline run.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::config::Config;
use crate::errors::QuizforgeError;
use crate::export::{render_certificate, render_html, CertificateRequest};
use crate::extract::UploadSource;
use crate::generate::{Difficulty, GenerationParams};
use crate::identity::Identity;
use crate::ledger::hash_password;
use crate::pipeline::{build_pipeline, select_store, PipelineOutcome, QuizRequest};

#[derive(Parser)]
#[command(name = "quizforge", version, about = "Turn lectures and documents into quizzes")]
pub struct Cli {
    /// Path to a quizforge.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable info-level logging without setting RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a quiz from an audio, video or document file
    Generate {
        /// Input file (mp4, mp3, pdf, docx, pptx, txt, ...)
        file: PathBuf,

        /// Account to charge, as an email or a `bot:<platform>:<id>` key
        #[arg(short, long)]
        identity: String,

        /// Number of questions to generate
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,

        #[arg(long, value_enum, default_value = "medium")]
        difficulty: Difficulty,

        /// Language the quiz should be written in
        #[arg(long, default_value = "English")]
        language: String,

        /// Quiz title for the HTML page
        #[arg(long)]
        title: Option<String>,

        /// Where to write the HTML quiz; defaults next to the input
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print the quiz as JSON to stdout instead of writing HTML
        #[arg(long)]
        json: bool,
    },

    /// Render a PDF certificate of completion
    Certificate {
        /// Student name as it should appear on the certificate
        #[arg(long)]
        name: String,

        /// Course title
        #[arg(long)]
        course: String,

        /// Optional PNG logo to place on the certificate
        #[arg(long)]
        logo: Option<PathBuf>,

        #[arg(short, long, default_value = "certificate.pdf")]
        out: PathBuf,
    },

    /// Inspect or adjust credit balances
    Credits {
        #[command(subcommand)]
        action: CreditsAction,
    },

    /// Manage login accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum CreditsAction {
    /// Show the balance for an identity
    Get { identity: String },
    /// Grant credits to an identity
    Add { identity: String, amount: u32 },
    /// Deduct credits if the balance covers them
    Deduct { identity: String, amount: u32 },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Register an email account with signup credits
    Register { email: String, password: String },
    /// Verify an email/password pair
    Verify { email: String, password: String },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        crate::telemetry::init_tracing_with_filter("info");
    } else {
        crate::telemetry::init_tracing();
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            file,
            identity,
            count,
            difficulty,
            language,
            title,
            out,
            json,
        } => {
            config.validate()?;
            generate(&config, file, &identity, count, difficulty, language, title, out, json)
                .await
        }
        Commands::Certificate {
            name,
            course,
            logo,
            out,
        } => certificate(&config, &name, &course, logo.as_deref(), &out).await,
        Commands::Credits { action } => credits(&config, action).await,
        Commands::Account { action } => account(&config, action).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn generate(
    config: &Config,
    file: PathBuf,
    identity: &str,
    count: usize,
    difficulty: Difficulty,
    language: String,
    title: Option<String>,
    out: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let identity: Identity = identity.parse()?;
    if !config.has_remote_store() {
        warn!("no remote store configured; balances will not persist across runs");
    }

    let pipeline = build_pipeline(config)?;
    let params = GenerationParams {
        count,
        difficulty,
        language,
    };
    let request = QuizRequest::new(identity, UploadSource::Path(file.clone()), params);

    match pipeline.run(request).await? {
        PipelineOutcome::Completed {
            quiz,
            remaining_credits,
        } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&quiz)?);
            } else {
                let title = title.unwrap_or_else(|| {
                    file.file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "Quiz".to_string())
                });
                let html = render_html(&quiz, &title);
                let out = out.unwrap_or_else(|| file.with_extension("quiz.html"));
                tokio::fs::write(&out, html)
                    .await
                    .with_context(|| format!("Failed to write {}", out.display()))?;
                println!("Wrote {} questions to {}", quiz.len(), out.display());
            }
            println!("Remaining credits: {remaining_credits}");
            Ok(())
        }
        PipelineOutcome::InsufficientCredits { balance } => {
            println!("Not enough credits to generate a quiz (balance: {balance}).");
            Ok(())
        }
    }
}

async fn certificate(
    config: &Config,
    name: &str,
    course: &str,
    logo: Option<&std::path::Path>,
    out: &std::path::Path,
) -> anyhow::Result<()> {
    let logo_png = match logo {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read logo {}", path.display()))?,
        ),
        None => None,
    };
    let font_bytes = match &config.export.certificate_font {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read font {}", path.display()))?,
        ),
        None => None,
    };

    let request = CertificateRequest {
        student_name: name.to_string(),
        course_title: course.to_string(),
        logo_png,
        issued_on: chrono::Utc::now().date_naive(),
    };
    let pdf = render_certificate(&request, font_bytes.as_deref())
        .map_err(QuizforgeError::from)?;
    tokio::fs::write(out, pdf)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!("Wrote certificate to {}", out.display());
    Ok(())
}

async fn credits(config: &Config, action: CreditsAction) -> anyhow::Result<()> {
    let store = select_store(config)?;
    match action {
        CreditsAction::Get { identity } => {
            let identity: Identity = identity.parse()?;
            let balance = store.balance(&identity).await?;
            println!("{balance}");
        }
        CreditsAction::Add { identity, amount } => {
            let identity: Identity = identity.parse()?;
            store.add(&identity, amount).await?;
            println!("Added {amount} credits to {identity}");
        }
        CreditsAction::Deduct { identity, amount } => {
            let identity: Identity = identity.parse()?;
            if store.deduct(&identity, amount).await? {
                println!("Deducted {amount} credits from {identity}");
            } else {
                println!("Insufficient balance; nothing deducted");
            }
        }
    }
    Ok(())
}

async fn account(config: &Config, action: AccountAction) -> anyhow::Result<()> {
    let store = select_store(config)?;
    match action {
        AccountAction::Register { email, password } => {
            let identity = Identity::email(&email)?;
            store
                .register_account(
                    &identity,
                    &hash_password(&password),
                    config.store.signup_credits,
                )
                .await?;
            println!(
                "Registered {identity} with {} credits",
                config.store.signup_credits
            );
        }
        AccountAction::Verify { email, password } => {
            let identity = Identity::email(&email)?;
            if store
                .verify_account(&identity, &hash_password(&password))
                .await?
            {
                println!("Credentials OK");
            } else {
                println!("Credentials rejected");
            }
        }
    }
    Ok(())
}
