mod helpers;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use warden::domain::models::{SessionRecord, SessionStatus};
use warden::domain::ports::SessionStore;
use warden::infrastructure::database::SqliteSessionStore;

use helpers::database::{setup_test_db, teardown_test_db};

fn record(service_id: &str) -> SessionRecord {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
    SessionRecord::new(service_id.to_string(), "cookie-jar".to_string(), now)
}

#[tokio::test]
async fn test_put_and_get_round_trip() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let mut stored = record("spotify");
    stored.status = SessionStatus::Expiring;
    stored.failure_count = 2;
    stored.blocked_reason = Some("second factor required".to_string());
    stored.blocked_since = Some(stored.created_at + Duration::hours(1));

    store.put(&stored).await.expect("failed to put record");

    let loaded = store
        .get("spotify")
        .await
        .expect("failed to get record")
        .expect("record should exist");

    assert_eq!(loaded, stored);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_get_missing_returns_none() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let loaded = store.get("nobody").await.expect("failed to query");
    assert!(loaded.is_none());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_put_twice_overwrites() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let mut stored = record("spotify");
    store.put(&stored).await.expect("first put");

    stored.renewed(
        "fresh-cookie".to_string(),
        stored.last_renewal_at + Duration::days(7),
    );
    store.put(&stored).await.expect("second put");

    let loaded = store
        .get("spotify")
        .await
        .expect("failed to get")
        .expect("record should exist");
    assert_eq!(loaded.payload, "fresh-cookie");
    assert_eq!(loaded.failure_count, 0);
    assert_eq!(loaded.last_renewal_at, stored.last_renewal_at);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_list_is_ordered_by_service_id() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    for id in ["linktree", "distrokid", "spotify"] {
        store.put(&record(id)).await.expect("failed to put");
    }

    let listed = store.list().await.expect("failed to list");
    let ids: Vec<&str> = listed.iter().map(|r| r.service_id.as_str()).collect();
    assert_eq!(ids, vec!["distrokid", "linktree", "spotify"]);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_record_failure_increments_the_counter() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let stored = record("spotify");
    store.put(&stored).await.expect("failed to put");

    let later = stored.created_at + Duration::hours(4);
    assert_eq!(store.record_failure("spotify", later).await.unwrap(), 1);
    assert_eq!(store.record_failure("spotify", later).await.unwrap(), 2);

    let loaded = store.get("spotify").await.unwrap().unwrap();
    assert_eq!(loaded.failure_count, 2);
    assert_eq!(loaded.updated_at, later);
    // The credential itself stays untouched.
    assert_eq!(loaded.payload, stored.payload);
    assert_eq!(loaded.last_renewal_at, stored.last_renewal_at);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_record_failure_without_a_record_counts_nothing() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let count = store
        .record_failure("never-authenticated", Utc::now())
        .await
        .expect("failed to record");
    assert_eq!(count, 0);
    assert!(store.get("never-authenticated").await.unwrap().is_none());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_mark_blocked_keeps_the_first_blocked_since() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let stored = record("tiktok");
    store.put(&stored).await.expect("failed to put");

    let first = stored.created_at + Duration::hours(1);
    let second = first + Duration::days(1);

    assert!(store
        .mark_blocked("tiktok", "browser login required", first)
        .await
        .unwrap());
    assert!(store
        .mark_blocked("tiktok", "still waiting on the operator", second)
        .await
        .unwrap());

    let loaded = store.get("tiktok").await.unwrap().unwrap();
    assert_eq!(
        loaded.blocked_reason.as_deref(),
        Some("still waiting on the operator")
    );
    assert_eq!(loaded.blocked_since, Some(first));

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_mark_blocked_without_a_record_reports_false() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let marked = store
        .mark_blocked("never-authenticated", "whatever", Utc::now())
        .await
        .expect("failed to mark");
    assert!(!marked);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_lock_excludes_other_holders_until_unlock() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
    let ttl = Duration::minutes(10);
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    assert!(store.try_lock("spotify", first, ttl, now).await.unwrap());
    assert!(!store.try_lock("spotify", second, ttl, now).await.unwrap());

    store.unlock("spotify", first).await.expect("failed to unlock");
    assert!(store.try_lock("spotify", second, ttl, now).await.unwrap());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_lock_is_reentrant_for_the_same_holder() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let now = Utc::now();
    let holder = Uuid::new_v4();
    let ttl = Duration::minutes(10);

    assert!(store.try_lock("spotify", holder, ttl, now).await.unwrap());
    assert!(store.try_lock("spotify", holder, ttl, now).await.unwrap());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_expired_lease_can_be_taken_over() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
    let crashed = Uuid::new_v4();
    let successor = Uuid::new_v4();

    assert!(store
        .try_lock("spotify", crashed, Duration::seconds(30), now)
        .await
        .unwrap());

    // Within the lease the lock holds; after it expires it does not.
    let before_expiry = now + Duration::seconds(29);
    assert!(!store
        .try_lock("spotify", successor, Duration::seconds(30), before_expiry)
        .await
        .unwrap());

    let after_expiry = now + Duration::seconds(31);
    assert!(store
        .try_lock("spotify", successor, Duration::seconds(30), after_expiry)
        .await
        .unwrap());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_unlock_by_a_non_holder_keeps_the_lease() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let now = Utc::now();
    let holder = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let ttl = Duration::minutes(10);

    assert!(store.try_lock("spotify", holder, ttl, now).await.unwrap());
    store.unlock("spotify", stranger).await.expect("unlock is idempotent");

    assert!(!store.try_lock("spotify", stranger, ttl, now).await.unwrap());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_locks_are_per_service() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let now = Utc::now();
    let holder_a = Uuid::new_v4();
    let holder_b = Uuid::new_v4();
    let ttl = Duration::minutes(10);

    assert!(store.try_lock("spotify", holder_a, ttl, now).await.unwrap());
    assert!(store.try_lock("distrokid", holder_b, ttl, now).await.unwrap());

    teardown_test_db(pool).await;
}
