//! Remote-preferring fallback behavior.

use std::sync::Arc;

use gymdex::store::{HybridStore, InMemory, LocalStore, RecordStore};
use gymdex::{AccountService, FixedClock};

use crate::helpers::{UnreachableStore, test_record};

#[tokio::test]
async fn falls_back_to_local_when_remote_is_down() {
    let clock = Arc::new(FixedClock::default());
    let local = Arc::new(LocalStore::in_memory().await.unwrap());
    local
        .save_all(&[test_record(&clock, "local@demo.com", "Local User")])
        .await
        .unwrap();

    let hybrid = HybridStore::new(Arc::new(UnreachableStore), local.clone());

    let set = hybrid.get_all().await.unwrap();
    assert!(set.degraded);
    assert_eq!(set.records.len(), 1);

    let receipt = hybrid
        .save_all(&[test_record(&clock, "written@demo.com", "Written Offline")])
        .await
        .unwrap();
    assert!(receipt.degraded);
    assert!(local.exists("written@demo.com").await.unwrap());
}

#[tokio::test]
async fn healthy_remote_is_mirrored_locally() {
    let clock = Arc::new(FixedClock::default());
    let local = Arc::new(LocalStore::in_memory().await.unwrap());
    let remote = Arc::new(InMemory::new());
    let hybrid = HybridStore::new(remote.clone(), local.clone());

    let receipt = hybrid
        .save_all(&[test_record(&clock, "both@demo.com", "Both Sides")])
        .await
        .unwrap();
    assert!(!receipt.degraded);

    assert!(remote.exists("both@demo.com").await.unwrap());
    // The fallback copy is kept fresh so an outage serves current data.
    assert!(local.exists("both@demo.com").await.unwrap());
}

#[tokio::test]
async fn duplicate_email_from_remote_is_not_retried_locally() {
    let clock = Arc::new(FixedClock::default());
    let local = Arc::new(LocalStore::in_memory().await.unwrap());
    let remote = Arc::new(InMemory::new());
    let hybrid = HybridStore::new(remote.clone(), local.clone());

    let err = hybrid
        .save_all(&[
            test_record(&clock, "same@demo.com", "First"),
            test_record(&clock, "same@demo.com", "Second"),
        ])
        .await
        .unwrap_err();
    assert!(err.is_duplicate_email());

    // The rejection never reached the local side.
    let set = local.get_all().await.unwrap();
    assert!(set.records.is_empty());
}

#[tokio::test]
async fn registration_reports_degraded_service() {
    let clock = Arc::new(FixedClock::default());
    let local = Arc::new(LocalStore::in_memory().await.unwrap());
    let hybrid: Arc<HybridStore> =
        Arc::new(HybridStore::new(Arc::new(UnreachableStore), local.clone()));

    let service = AccountService::new(hybrid, clock.clone());
    let registered = service
        .register("Offline User", "offline@demo.com", "secret1")
        .await
        .unwrap();
    assert!(registered.degraded);

    // The account works locally right away.
    let authenticated = service
        .authenticate("offline@demo.com", "secret1")
        .await
        .unwrap();
    assert!(authenticated.degraded);
}
