//! Account flows over the SQLite store.

use std::sync::Arc;

use gymdex::lockout::{LOCKOUT_MINUTES, MAX_LOGIN_ATTEMPTS};
use gymdex::store::{ActivityLog, LocalStore};
use gymdex::types::ActivityKind;
use gymdex::{AccountService, Clock, FixedClock};

async fn fixture() -> (Arc<LocalStore>, Arc<FixedClock>, AccountService) {
    let clock = Arc::new(FixedClock::default());
    let store = Arc::new(LocalStore::in_memory().await.unwrap());
    let service = AccountService::new(store.clone(), clock.clone())
        .with_activity_log(store.clone())
        .with_device_info("integration-test");
    (store, clock, service)
}

#[tokio::test]
async fn register_authenticate_roundtrip() {
    let (_store, _clock, service) = fixture().await;

    let registered = service
        .register("  John Doe  ", "John@Demo.com", "secret1")
        .await
        .unwrap();
    assert_eq!(registered.record.full_name, "John Doe");
    assert_eq!(registered.record.email, "john@demo.com");
    assert_ne!(registered.record.password_digest, "secret1");

    let authenticated = service
        .authenticate("john@DEMO.com", "secret1")
        .await
        .unwrap();
    assert_eq!(authenticated.record.id, registered.record.id);
    assert_eq!(
        authenticated.record.device_info.as_deref(),
        Some("integration-test")
    );
}

#[tokio::test]
async fn duplicate_registration_across_service_instances() {
    let (store, clock, service) = fixture().await;
    service
        .register("John Doe", "john@demo.com", "secret1")
        .await
        .unwrap();

    // A second service over the same store still sees the account.
    let second = AccountService::new(store.clone(), clock.clone());
    let err = second
        .register("Impostor", "JOHN@demo.com", "other-secret")
        .await
        .unwrap_err();
    assert!(err.is_duplicate_email());
}

#[tokio::test]
async fn lockout_window_is_persisted() {
    let (store, clock, service) = fixture().await;
    service
        .register("John Doe", "john@demo.com", "secret1")
        .await
        .unwrap();

    for _ in 0..MAX_LOGIN_ATTEMPTS {
        let _ = service.authenticate("john@demo.com", "nope-nope").await;
    }

    // The lock survives a fresh service over the same database.
    let second = AccountService::new(store.clone(), clock.clone());
    let err = second
        .authenticate("john@demo.com", "secret1")
        .await
        .unwrap_err();
    assert!(err.is_locked_out());
    let until = err.locked_until().unwrap();
    assert_eq!(
        until,
        clock.now_utc() + chrono::Duration::minutes(LOCKOUT_MINUTES)
    );

    clock.advance_minutes(LOCKOUT_MINUTES + 1);
    second
        .authenticate("john@demo.com", "secret1")
        .await
        .unwrap();
}

#[tokio::test]
async fn change_password_stamps_and_persists() {
    let (store, clock, service) = fixture().await;
    service
        .register("John Doe", "john@demo.com", "secret1")
        .await
        .unwrap();

    clock.advance_minutes(5);
    service
        .change_password("john@demo.com", "secret1", "secret2")
        .await
        .unwrap();

    let second = AccountService::new(store.clone(), clock.clone());
    let err = second
        .authenticate("john@demo.com", "secret1")
        .await
        .unwrap_err();
    assert!(err.is_bad_credentials());

    let authenticated = second
        .authenticate("john@demo.com", "secret2")
        .await
        .unwrap();
    assert_eq!(
        authenticated.record.password_changed_at,
        Some(clock.now_utc())
    );
}

#[tokio::test]
async fn wrong_current_password_counts_toward_lockout() {
    let (_store, _clock, service) = fixture().await;
    service
        .register("John Doe", "john@demo.com", "secret1")
        .await
        .unwrap();

    for _ in 0..MAX_LOGIN_ATTEMPTS {
        let err = service
            .change_password("john@demo.com", "wrong-current", "secret2")
            .await
            .unwrap_err();
        assert!(err.is_bad_credentials() || err.is_locked_out());
    }

    let err = service
        .authenticate("john@demo.com", "secret1")
        .await
        .unwrap_err();
    assert!(err.is_locked_out());
}

#[tokio::test]
async fn delete_removes_listing_and_activity_trail_remains() {
    let (store, _clock, service) = fixture().await;
    let registered = service
        .register("John Doe", "john@demo.com", "secret1")
        .await
        .unwrap();
    service
        .register("Jane Doe", "jane@demo.com", "secret2")
        .await
        .unwrap();

    service.delete_account("john@demo.com").await.unwrap();

    let users = service.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "jane@demo.com");

    // The log keeps the trail of the deleted account.
    let entries = store.recent(&registered.record.id, 10).await.unwrap();
    let actions: Vec<ActivityKind> = entries.iter().map(|e| e.action).collect();
    assert!(actions.contains(&ActivityKind::UserRegistered));
    assert!(actions.contains(&ActivityKind::AccountDeleted));
}

#[tokio::test]
async fn login_refreshes_the_file_backed_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    let clock = Arc::new(FixedClock::default());
    let store = Arc::new(LocalStore::in_memory().await.unwrap());

    let cache = Arc::new(gymdex::ClientCache::load_from_file(&path).await);
    let service =
        AccountService::new(store.clone(), clock.clone()).with_cache(cache.clone());

    service
        .register("John Doe", "john@demo.com", "secret1")
        .await
        .unwrap();
    service
        .authenticate("john@demo.com", "secret1")
        .await
        .unwrap();

    // The summary landed on disk, not just in memory.
    let reloaded = gymdex::ClientCache::load_from_file(&path).await;
    let user = reloaded.last_user().unwrap();
    assert_eq!(user.email, "john@demo.com");
    assert_eq!(user.full_name, "John Doe");
}

#[tokio::test]
async fn listing_excludes_digests() {
    let (_store, _clock, service) = fixture().await;
    service
        .register("John Doe", "john@demo.com", "secret1")
        .await
        .unwrap();

    let users = service.list_users().await.unwrap();
    let serialized = serde_json::to_string(&users).unwrap();
    assert!(!serialized.contains("passwordDigest"));
    assert!(!serialized.contains("secret1"));
}
