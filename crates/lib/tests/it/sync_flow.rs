//! Offline registration followed by reconciliation.

use std::sync::Arc;

use gymdex::store::{HybridStore, LocalStore, RecordStore, RemoteConfig, RemoteStore};
use gymdex::sync::SyncCoordinator;
use gymdex::{AccountService, FixedClock};
use serde_json::json;

use crate::helpers::{TEST_API_KEY, UnreachableStore, spawn_stub_remote, test_record};

#[tokio::test]
async fn offline_accounts_surface_remotely_after_reconcile() {
    let clock = Arc::new(FixedClock::default());
    let local = Arc::new(LocalStore::in_memory().await.unwrap());

    // Register while the remote is down: the hybrid store lands the account
    // locally and reports the degradation.
    let hybrid: Arc<HybridStore> =
        Arc::new(HybridStore::new(Arc::new(UnreachableStore), local.clone()));
    let service = AccountService::new(hybrid, clock.clone());
    let registered = service
        .register("Offline User", "offline@demo.com", "secret1")
        .await
        .unwrap();
    assert!(registered.degraded);

    // The remote comes back, already holding someone else's account.
    let (base, _document) = spawn_stub_remote(json!({ "users": [
        serde_json::to_value(test_record(&clock, "existing@demo.com", "Existing User")).unwrap(),
    ] }))
    .await;
    let remote = RemoteStore::new(
        RemoteConfig {
            api_base: base,
            bin_id: "bin123".into(),
            api_key: TEST_API_KEY.into(),
        },
        clock.clone(),
    )
    .unwrap();

    clock.advance(1000);
    let coordinator = SyncCoordinator::new(clock.clone());
    let report = coordinator.reconcile(local.as_ref(), &remote).await.unwrap();
    assert_eq!(report.pushed, 1);
    assert_eq!(report.remote_total, 2);
    assert_eq!(report.pushed_emails, vec!["offline@demo.com"]);

    let remote_set = remote.get_all().await.unwrap();
    let pushed = remote_set
        .records
        .iter()
        .find(|r| r.email == "offline@demo.com")
        .unwrap();
    assert!(pushed.synced_from_local);
    assert_ne!(pushed.id, registered.record.id);
    // The digest travels with the record, so the password still works
    // against the remote copy.
    assert_eq!(pushed.password_digest, registered.record.password_digest);

    // Authentication now succeeds straight against the remote.
    let remote_service = AccountService::new(Arc::new(remote), clock.clone());
    let authenticated = remote_service
        .authenticate("offline@demo.com", "secret1")
        .await
        .unwrap();
    assert!(!authenticated.degraded);
}

#[tokio::test]
async fn remote_copy_wins_over_local_edits() {
    let clock = Arc::new(FixedClock::default());
    let local = LocalStore::in_memory().await.unwrap();
    let (base, _document) = spawn_stub_remote(json!({ "users": [] })).await;
    let remote = RemoteStore::new(
        RemoteConfig {
            api_base: base,
            bin_id: "bin123".into(),
            api_key: TEST_API_KEY.into(),
        },
        clock.clone(),
    )
    .unwrap();

    let mut shared = test_record(&clock, "shared@demo.com", "Remote Name");
    remote.save_all(std::slice::from_ref(&shared)).await.unwrap();

    shared.full_name = "Local Edit".into();
    local.save_all(std::slice::from_ref(&shared)).await.unwrap();

    let coordinator = SyncCoordinator::new(clock.clone());
    let report = coordinator.reconcile(&local, &remote).await.unwrap();
    assert_eq!(report.pushed, 0);

    // No field merge: the local rename is lost.
    let remote_set = remote.get_all().await.unwrap();
    assert_eq!(remote_set.records[0].full_name, "Remote Name");
}
