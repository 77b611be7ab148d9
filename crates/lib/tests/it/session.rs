//! Session lifecycle over the SQLite store.

use std::sync::Arc;

use gymdex::session::{InvalidSessionReason, SESSION_TTL_HOURS, SessionValidation};
use gymdex::store::LocalStore;
use gymdex::{AccountService, ClientCache, FixedClock, SessionManager};

#[tokio::test]
async fn login_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("gymdex.db");
    let clock = Arc::new(FixedClock::default());

    let session_id = {
        let store = Arc::new(LocalStore::open(&db).await.unwrap());
        let service = AccountService::new(store.clone(), clock.clone());
        let sessions = SessionManager::new(store.clone(), store.clone(), clock.clone());

        let registered = service
            .register("John Doe", "john@demo.com", "secret1")
            .await
            .unwrap();
        let session = sessions.create(&registered.record).await.unwrap();
        session.session_id
    };

    // A fresh process over the same file still honors the token.
    let store = Arc::new(LocalStore::open(&db).await.unwrap());
    let sessions = SessionManager::new(store.clone(), store.clone(), clock.clone());
    let validation = sessions.validate(&session_id).await.unwrap();
    assert_eq!(validation.user().unwrap().email, "john@demo.com");
}

#[tokio::test]
async fn expired_sessions_fail_and_get_swept() {
    let clock = Arc::new(FixedClock::default());
    let store = Arc::new(LocalStore::in_memory().await.unwrap());
    let service = AccountService::new(store.clone(), clock.clone());
    let sessions = SessionManager::new(store.clone(), store.clone(), clock.clone());

    let registered = service
        .register("John Doe", "john@demo.com", "secret1")
        .await
        .unwrap();
    let session = sessions.create(&registered.record).await.unwrap();

    // At the deadline exactly the token still validates, and the sweep uses
    // the same boundary: what validates as live cannot be deleted under it.
    clock.advance_minutes(SESSION_TTL_HOURS * 60);
    assert!(
        sessions
            .validate(&session.session_id)
            .await
            .unwrap()
            .user()
            .is_some()
    );
    assert_eq!(sessions.sweep_expired().await.unwrap(), 0);

    clock.advance(1);
    let validation = sessions.validate(&session.session_id).await.unwrap();
    assert!(matches!(
        validation,
        SessionValidation::Invalid(InvalidSessionReason::Expired)
    ));

    assert_eq!(sessions.sweep_expired().await.unwrap(), 1);
    let validation = sessions.validate(&session.session_id).await.unwrap();
    assert!(matches!(
        validation,
        SessionValidation::Invalid(InvalidSessionReason::NotFound)
    ));
}

#[tokio::test]
async fn deleted_user_cannot_ride_an_open_session() {
    let clock = Arc::new(FixedClock::default());
    let store = Arc::new(LocalStore::in_memory().await.unwrap());
    let service = AccountService::new(store.clone(), clock.clone());
    let sessions = SessionManager::new(store.clone(), store.clone(), clock.clone());

    let registered = service
        .register("John Doe", "john@demo.com", "secret1")
        .await
        .unwrap();
    let session = sessions.create(&registered.record).await.unwrap();

    // Deletion does not touch the session row, but validation re-checks the
    // owner and refuses from then on.
    service.delete_account("john@demo.com").await.unwrap();
    let validation = sessions.validate(&session.session_id).await.unwrap();
    assert!(matches!(
        validation,
        SessionValidation::Invalid(InvalidSessionReason::UserInactive)
    ));
}

#[tokio::test]
async fn logout_clears_matching_cache_slot() {
    let clock = Arc::new(FixedClock::default());
    let store = Arc::new(LocalStore::in_memory().await.unwrap());
    let cache = Arc::new(ClientCache::new());
    let service = AccountService::new(store.clone(), clock.clone()).with_cache(cache.clone());
    let sessions =
        SessionManager::new(store.clone(), store.clone(), clock.clone()).with_cache(cache.clone());

    let registered = service
        .register("John Doe", "john@demo.com", "secret1")
        .await
        .unwrap();
    service
        .authenticate("john@demo.com", "secret1")
        .await
        .unwrap();
    let session = sessions.create(&registered.record).await.unwrap();
    assert_eq!(cache.session().as_deref(), Some(session.session_id.as_str()));

    assert!(sessions.invalidate(&session.session_id).await.unwrap());
    assert!(cache.session().is_none());
    assert_eq!(cache.last_user().unwrap().email, "john@demo.com");

    // Idempotent: a second logout of the same token is a quiet no-op.
    assert!(sessions.invalidate(&session.session_id).await.unwrap());
}
