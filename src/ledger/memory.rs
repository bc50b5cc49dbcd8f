//! In-memory credit store.
//!
//! The test double, also used for keyless development runs when no remote
//! store is configured. One mutex guards each map; `deduct` holds the lock
//! across the check and the write, which is what makes it atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::LedgerError;
use crate::identity::Identity;

use super::CreditStore;

#[derive(Default)]
pub struct MemoryStore {
    credits: Mutex<HashMap<String, u32>>,
    accounts: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a balance directly; test convenience.
    pub fn with_balance(identity: &Identity, credits: u32) -> Self {
        let store = Self::new();
        store
            .credits
            .lock()
            .insert(identity.storage_key(), credits);
        store
    }
}

#[async_trait]
impl CreditStore for MemoryStore {
    async fn balance(&self, identity: &Identity) -> Result<u32, LedgerError> {
        Ok(self
            .credits
            .lock()
            .get(&identity.storage_key())
            .copied()
            .unwrap_or(0))
    }

    async fn balance_or_register(
        &self,
        identity: &Identity,
        initial: u32,
    ) -> Result<u32, LedgerError> {
        let mut credits = self.credits.lock();
        Ok(*credits.entry(identity.storage_key()).or_insert(initial))
    }

    async fn deduct(&self, identity: &Identity, amount: u32) -> Result<bool, LedgerError> {
        let mut credits = self.credits.lock();
        match credits.get_mut(&identity.storage_key()) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add(&self, identity: &Identity, amount: u32) -> Result<(), LedgerError> {
        let mut credits = self.credits.lock();
        let balance = credits.entry(identity.storage_key()).or_insert(0);
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    async fn register_account(
        &self,
        identity: &Identity,
        password_hash: &str,
        signup_credits: u32,
    ) -> Result<(), LedgerError> {
        {
            let mut accounts = self.accounts.lock();
            if accounts.contains_key(&identity.storage_key()) {
                return Err(LedgerError::DuplicateAccount {
                    identity: identity.to_string(),
                });
            }
            accounts.insert(identity.storage_key(), password_hash.to_string());
        }
        self.add(identity, signup_credits).await
    }

    async fn verify_account(
        &self,
        identity: &Identity,
        password_hash: &str,
    ) -> Result<bool, LedgerError> {
        Ok(self
            .accounts
            .lock()
            .get(&identity.storage_key())
            .is_some_and(|stored| stored == password_hash))
    }
}
