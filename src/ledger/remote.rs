//! Remote credit store over a PostgREST-style API.
//!
//! Rows live in `credit_accounts (identity text primary key, credits int)`
//! and `auth_accounts (identity text primary key, password_hash text)`;
//! see `db/schema.sql`. Reads go through plain filtered selects. The
//! deduct path goes through the `deduct_credits` database function so the
//! conditional decrement ("set credits = credits - amount where credits >=
//! amount") executes as one statement server-side — the read-then-write
//! race lives in the database, not here.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::errors::LedgerError;
use crate::identity::Identity;

use super::CreditStore;

pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct CreditRow {
    credits: u32,
}

impl RemoteStore {
    pub fn new(url: &str, service_key: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            service_key: service_key.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn select_credits(&self, identity: &Identity) -> Result<Option<u32>, LedgerError> {
        let response = self
            .request(reqwest::Method::GET, "/credit_accounts")
            .query(&[
                ("identity", format!("eq.{}", identity.storage_key())),
                ("select", "credits".to_string()),
            ])
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let rows: Vec<CreditRow> = check_json(response).await?;
        Ok(rows.first().map(|r| r.credits))
    }

    async fn insert_account(&self, identity: &Identity, credits: u32) -> Result<(), LedgerError> {
        let response = self
            .request(reqwest::Method::POST, "/credit_accounts")
            .query(&[("on_conflict", "identity")])
            .header("Prefer", "resolution=ignore-duplicates")
            .json(&serde_json::json!({
                "identity": identity.storage_key(),
                "credits": credits,
            }))
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(LedgerError::Rejected {
        status: status.as_u16(),
        message: crate::telemetry::redact_secrets(&message),
    })
}

async fn check_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, LedgerError> {
    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| LedgerError::Parse(e.to_string()))
}

#[async_trait]
impl CreditStore for RemoteStore {
    async fn balance(&self, identity: &Identity) -> Result<u32, LedgerError> {
        Ok(self.select_credits(identity).await?.unwrap_or(0))
    }

    async fn balance_or_register(
        &self,
        identity: &Identity,
        initial: u32,
    ) -> Result<u32, LedgerError> {
        if let Some(credits) = self.select_credits(identity).await? {
            return Ok(credits);
        }
        debug!(identity = %identity, initial, "registering ledger account on first use");
        // ignore-duplicates makes a concurrent first contact harmless;
        // re-read to report whichever row won.
        self.insert_account(identity, initial).await?;
        Ok(self.select_credits(identity).await?.unwrap_or(initial))
    }

    async fn deduct(&self, identity: &Identity, amount: u32) -> Result<bool, LedgerError> {
        let response = self
            .request(reqwest::Method::POST, "/rpc/deduct_credits")
            .json(&serde_json::json!({
                "p_identity": identity.storage_key(),
                "p_amount": amount,
            }))
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        // The function returns true when the conditional update touched a
        // row, false when the balance did not cover the amount.
        let deducted: bool = check_json(response).await?;
        Ok(deducted)
    }

    async fn add(&self, identity: &Identity, amount: u32) -> Result<(), LedgerError> {
        let response = self
            .request(reqwest::Method::POST, "/rpc/add_credits")
            .json(&serde_json::json!({
                "p_identity": identity.storage_key(),
                "p_amount": amount,
            }))
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        check_status(response).await.map(|_| ())
    }

    async fn register_account(
        &self,
        identity: &Identity,
        password_hash: &str,
        signup_credits: u32,
    ) -> Result<(), LedgerError> {
        let response = self
            .request(reqwest::Method::POST, "/auth_accounts")
            .json(&serde_json::json!({
                "identity": identity.storage_key(),
                "password_hash": password_hash,
            }))
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        if response.status().as_u16() == 409 {
            return Err(LedgerError::DuplicateAccount {
                identity: identity.to_string(),
            });
        }
        check_status(response).await?;
        self.add(identity, signup_credits).await
    }

    async fn verify_account(
        &self,
        identity: &Identity,
        password_hash: &str,
    ) -> Result<bool, LedgerError> {
        #[derive(Deserialize)]
        struct IdentityRow {
            #[allow(dead_code)]
            identity: String,
        }

        let response = self
            .request(reqwest::Method::GET, "/auth_accounts")
            .query(&[
                ("identity", format!("eq.{}", identity.storage_key())),
                ("password_hash", format!("eq.{password_hash}")),
                ("select", "identity".to_string()),
            ])
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let rows: Vec<IdentityRow> = check_json(response).await?;
        Ok(!rows.is_empty())
    }
}
