//! Credit Ledger
//!
//! Maps a tagged [`Identity`] to an integer credit balance. One credit is
//! consumed per successful quiz generation. The store seam is an explicit
//! trait with two implementations selected by configuration: a remote
//! PostgREST-backed store and an in-memory double for tests and keyless
//! development runs.
//!
//! Invariant: a balance never goes negative. `deduct` is an atomic
//! decrement-with-floor — the check and the write happen as one operation
//! in every implementation, so concurrent deductions against the same
//! identity cannot double-spend.

pub mod memory;
pub mod remote;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::errors::LedgerError;
use crate::identity::Identity;

pub use memory::MemoryStore;
pub use remote::RemoteStore;

#[async_trait]
pub trait CreditStore: Send + Sync {
    /// Current balance; 0 when no row exists.
    async fn balance(&self, identity: &Identity) -> Result<u32, LedgerError>;

    /// Balance with register-on-first-use: creates the account with
    /// `initial` credits when it does not exist yet.
    async fn balance_or_register(
        &self,
        identity: &Identity,
        initial: u32,
    ) -> Result<u32, LedgerError>;

    /// Atomically deduct `amount` if the balance covers it. Returns
    /// `Ok(false)` on insufficient balance — an expected outcome, not an
    /// error. Exactly one of two concurrent deductions against a balance
    /// of `amount` succeeds.
    async fn deduct(&self, identity: &Identity, amount: u32) -> Result<bool, LedgerError>;

    /// Add credits, creating the account if needed.
    async fn add(&self, identity: &Identity, amount: u32) -> Result<(), LedgerError>;

    /// Create a login account with a password hash and grant signup
    /// credits. Fails with [`LedgerError::DuplicateAccount`] if taken.
    async fn register_account(
        &self,
        identity: &Identity,
        password_hash: &str,
        signup_credits: u32,
    ) -> Result<(), LedgerError>;

    /// Check a login against the stored password hash.
    async fn verify_account(
        &self,
        identity: &Identity,
        password_hash: &str,
    ) -> Result<bool, LedgerError>;
}

/// SHA-256 hex digest used for stored passwords.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
