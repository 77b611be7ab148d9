//! SQLite backend behavior.

use chrono::Duration;
use gymdex::FixedClock;
use gymdex::clock::Clock;
use gymdex::store::{LocalStore, RecordStore};
use gymdex::types::MembershipType;

use crate::helpers::test_record;

#[tokio::test]
async fn full_record_roundtrip() {
    let clock = FixedClock::default();
    let store = LocalStore::in_memory().await.unwrap();

    let mut record = test_record(&clock, "round@demo.com", "Round Trip");
    record.last_login = Some(clock.now_utc() + Duration::hours(1));
    record.login_attempts = 3;
    record.locked_until = Some(clock.now_utc() + Duration::minutes(15));
    record.membership_type = MembershipType::Elite;
    record.device_info = Some("test device".into());
    record.password_changed_at = Some(clock.now_utc() + Duration::days(1));
    record.synced_from_local = true;

    store.save_all(std::slice::from_ref(&record)).await.unwrap();
    let set = store.get_all().await.unwrap();
    assert_eq!(set.records, vec![record]);
}

#[tokio::test]
async fn save_all_replaces_the_whole_set() {
    let clock = FixedClock::default();
    let store = LocalStore::in_memory().await.unwrap();

    store
        .save_all(&[
            test_record(&clock, "a@demo.com", "A"),
            test_record(&clock, "b@demo.com", "B"),
        ])
        .await
        .unwrap();
    store
        .save_all(&[test_record(&clock, "c@demo.com", "C")])
        .await
        .unwrap();

    let set = store.get_all().await.unwrap();
    assert_eq!(set.records.len(), 1);
    assert_eq!(set.records[0].email, "c@demo.com");
}

#[tokio::test]
async fn unique_email_index_rejects_duplicates() {
    let clock = FixedClock::default();
    let store = LocalStore::in_memory().await.unwrap();

    let err = store
        .save_all(&[
            test_record(&clock, "same@demo.com", "First"),
            test_record(&clock, "same@demo.com", "Second"),
        ])
        .await
        .unwrap_err();
    assert!(err.is_duplicate_email());

    // The failed transaction left nothing behind.
    let set = store.get_all().await.unwrap();
    assert!(set.records.is_empty());
}

#[tokio::test]
async fn corrupt_rows_are_skipped_not_fatal() {
    let clock = FixedClock::default();
    let store = LocalStore::in_memory().await.unwrap();
    store
        .save_all(&[test_record(&clock, "good@demo.com", "Good")])
        .await
        .unwrap();

    // Inject a row with a membership tag no release ever wrote.
    sqlx::query(
        "INSERT INTO users (id, full_name, email, password_digest, registration_date, membership_type)
         VALUES ('user_0_broken', 'Broken', 'broken@demo.com', 'digest', 0, 'platinum')",
    )
    .execute(store.pool())
    .await
    .unwrap();

    let set = store.get_all().await.unwrap();
    assert_eq!(set.records.len(), 1);
    assert_eq!(set.records[0].email, "good@demo.com");
}

#[tokio::test]
async fn reopening_a_file_database_keeps_data() {
    let clock = FixedClock::default();
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("keep.db");

    {
        let store = LocalStore::open(&db).await.unwrap();
        store
            .save_all(&[test_record(&clock, "keep@demo.com", "Keeper")])
            .await
            .unwrap();
    }

    let store = LocalStore::open(&db).await.unwrap();
    let set = store.get_all().await.unwrap();
    assert_eq!(set.records.len(), 1);
    assert!(store.exists("keep@demo.com").await.unwrap());
}
