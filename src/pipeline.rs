//! Pipeline orchestration.
//!
//! One request in, one outcome out: register-on-first-use, balance
//! precheck, extract, generate, atomic deduct. All state for a run lives
//! in the request and the returned outcome; the only persistent store in
//! the system is the credit ledger. Once submitted a run either completes
//! or errors — there is no cancellation and nothing is retried.

use std::sync::Arc;

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{Config, StoreConfig};
use crate::errors::{QuizforgeError, Result};
use crate::extract::parse::CloudParseClient;
use crate::extract::transcribe::HostedSpeechClient;
use crate::extract::{Extractor, UploadSource};
use crate::generate::{GenerationParams, HostedLlmClient, LlmClient, QuizGenerator};
use crate::identity::Identity;
use crate::ledger::{CreditStore, MemoryStore, RemoteStore};
use crate::quiz::Quiz;

/// Request-scoped context for one pipeline run.
#[derive(Debug)]
pub struct QuizRequest {
    pub id: Uuid,
    pub identity: Identity,
    pub source: UploadSource,
    pub params: GenerationParams,
}

impl QuizRequest {
    pub fn new(identity: Identity, source: UploadSource, params: GenerationParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            source,
            params,
        }
    }
}

/// What a pipeline run produced. An exhausted balance is an expected
/// outcome, not an error; service failures come back as `Err` instead.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed {
        quiz: Quiz,
        remaining_credits: u32,
    },
    InsufficientCredits {
        balance: u32,
    },
}

pub struct Pipeline<C: LlmClient> {
    extractor: Extractor,
    generator: QuizGenerator<C>,
    ledger: Arc<dyn CreditStore>,
    store_config: StoreConfig,
}

impl<C: LlmClient> Pipeline<C> {
    pub fn new(
        extractor: Extractor,
        generator: QuizGenerator<C>,
        ledger: Arc<dyn CreditStore>,
        store_config: StoreConfig,
    ) -> Self {
        Self {
            extractor,
            generator,
            ledger,
            store_config,
        }
    }

    fn signup_credits(&self, identity: &Identity) -> u32 {
        match identity {
            Identity::Email { .. } => self.store_config.signup_credits,
            Identity::BotHandle { .. } => self.store_config.bot_signup_credits,
        }
    }

    /// Run the full extract-generate-deduct sequence for one request.
    /// One credit is consumed per successful generation; the deduction is
    /// atomic, so a concurrent spend of the last credit blocks this run
    /// instead of driving the balance negative.
    pub async fn run(&self, request: QuizRequest) -> Result<PipelineOutcome> {
        let span = info_span!("pipeline.run", request_id = %request.id, identity = %request.identity);
        async {
            let balance = self
                .ledger
                .balance_or_register(&request.identity, self.signup_credits(&request.identity))
                .await?;
            if balance == 0 {
                info!("request blocked: no credits");
                return Ok(PipelineOutcome::InsufficientCredits { balance });
            }

            let text = self.extractor.extract_text(&request.source).await?;
            let quiz = self.generator.generate(&text, &request.params).await?;

            if !self.ledger.deduct(&request.identity, 1).await? {
                // A concurrent request spent the last credit between the
                // precheck and here.
                let balance = self.ledger.balance(&request.identity).await?;
                info!("request blocked: credit spent concurrently");
                return Ok(PipelineOutcome::InsufficientCredits { balance });
            }

            let remaining_credits = self.ledger.balance(&request.identity).await?;
            info!(questions = quiz.len(), remaining_credits, "pipeline completed");
            Ok(PipelineOutcome::Completed {
                quiz,
                remaining_credits,
            })
        }
        .instrument(span)
        .await
    }
}

/// Build the production pipeline from configuration. The credit store
/// backend is chosen here: remote when configured, in-memory otherwise.
pub fn build_pipeline(config: &Config) -> Result<Pipeline<HostedLlmClient>> {
    let speech = Arc::new(HostedSpeechClient::new(config)?);
    let parser = Arc::new(CloudParseClient::new(config)?);
    let extractor = Extractor::new(speech, parser, config.media.clone());

    let generator = QuizGenerator::new(HostedLlmClient::new(config)?, config.generation.clone());
    let ledger = select_store(config)?;

    Ok(Pipeline::new(
        extractor,
        generator,
        ledger,
        config.store.clone(),
    ))
}

/// Select the ledger backend from configuration.
pub fn select_store(config: &Config) -> Result<Arc<dyn CreditStore>> {
    match (&config.store.url, &config.store.service_key) {
        (Some(url), Some(key)) => Ok(Arc::new(
            RemoteStore::new(url, key, config.request_timeout_secs)
                .map_err(QuizforgeError::Other)?,
        )),
        _ => {
            tracing::warn!("no remote store configured, using in-memory credit store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
