//! Credit store tests against the trait surface.
//!
//! Everything here runs through `Arc<dyn CreditStore>` so the tests hold
//! for any backend wired into the pipeline.

use std::sync::Arc;

use quizforge::errors::LedgerError;
use quizforge::identity::Identity;
use quizforge::ledger::{hash_password, CreditStore, MemoryStore};

fn store() -> Arc<dyn CreditStore> {
    Arc::new(MemoryStore::new())
}

fn alice() -> Identity {
    Identity::email("alice@example.com").unwrap()
}

#[tokio::test]
async fn test_unknown_identity_has_zero_balance() {
    let s = store();
    assert_eq!(s.balance(&alice()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_balance_or_register_grants_initial_once() {
    let s = store();
    assert_eq!(s.balance_or_register(&alice(), 5).await.unwrap(), 5);
    // Second contact must not re-grant.
    assert_eq!(s.balance_or_register(&alice(), 5).await.unwrap(), 5);
}

#[tokio::test]
async fn test_deduct_with_sufficient_balance() {
    let s = store();
    s.add(&alice(), 3).await.unwrap();
    assert!(s.deduct(&alice(), 2).await.unwrap());
    assert_eq!(s.balance(&alice()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_deduct_never_goes_negative() {
    let s = store();
    s.add(&alice(), 1).await.unwrap();
    assert!(!s.deduct(&alice(), 2).await.unwrap());
    // The failed deduct must not have touched the balance.
    assert_eq!(s.balance(&alice()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_deduct_from_unknown_identity() {
    let s = store();
    assert!(!s.deduct(&alice(), 1).await.unwrap());
}

#[tokio::test]
async fn test_exact_balance_deduct_reaches_zero() {
    let s = store();
    s.add(&alice(), 4).await.unwrap();
    assert!(s.deduct(&alice(), 4).await.unwrap());
    assert_eq!(s.balance(&alice()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_email_and_bot_balances_are_separate_rows() {
    let s = store();
    let bot = Identity::bot_handle("telegram", 7);
    s.add(&alice(), 10).await.unwrap();
    s.add(&bot, 2).await.unwrap();
    assert!(s.deduct(&bot, 2).await.unwrap());
    assert_eq!(s.balance(&alice()).await.unwrap(), 10);
    assert_eq!(s.balance(&bot).await.unwrap(), 0);
}

#[tokio::test]
async fn test_register_account_grants_signup_credits() {
    let s = store();
    s.register_account(&alice(), &hash_password("pw"), 5)
        .await
        .unwrap();
    assert_eq!(s.balance(&alice()).await.unwrap(), 5);
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let s = store();
    s.register_account(&alice(), &hash_password("pw"), 5)
        .await
        .unwrap();
    let err = s
        .register_account(&alice(), &hash_password("other"), 5)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateAccount { .. }));
    // The duplicate attempt must not add credits.
    assert_eq!(s.balance(&alice()).await.unwrap(), 5);
}

#[tokio::test]
async fn test_verify_account_checks_hash() {
    let s = store();
    s.register_account(&alice(), &hash_password("pw"), 5)
        .await
        .unwrap();
    assert!(s
        .verify_account(&alice(), &hash_password("pw"))
        .await
        .unwrap());
    assert!(!s
        .verify_account(&alice(), &hash_password("wrong"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_verify_unknown_account_is_false() {
    let s = store();
    assert!(!s
        .verify_account(&alice(), &hash_password("pw"))
        .await
        .unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_deducts_spend_exactly_the_balance() {
    let s: Arc<dyn CreditStore> = Arc::new(MemoryStore::new());
    s.add(&alice(), 10).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..25 {
        let s = Arc::clone(&s);
        handles.push(tokio::spawn(
            async move { s.deduct(&alice(), 1).await.unwrap() },
        ));
    }

    let mut successes = 0;
    for h in handles {
        if h.await.unwrap() {
            successes += 1;
        }
    }

    assert_eq!(successes, 10);
    assert_eq!(s.balance(&alice()).await.unwrap(), 0);
}
