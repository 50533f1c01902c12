//! Integration tests for login, logout, validity and authentication.

mod helpers;

use std::sync::atomic::Ordering;
use std::time::Duration;

use sessiond_auth::session::{BestEffortStep, InvalidSession};
use sessiond_auth::SessionError;
use sessiond_core::traits::{SessionCache, TokenCodec};
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::RevokedBy;

use helpers::{TestEngine, client};

#[tokio::test]
async fn test_login_creates_live_record_index_entry_and_ledger_row() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;

    let outcome = t.login_ok("alice", "pw").await;

    let live = t.cache.get(&outcome.session_id).await.unwrap().unwrap();
    assert_eq!(live.user_id, alice.id);
    assert_eq!(live.expires_at, outcome.expires_at);
    assert_eq!(live.client, client());
    assert!(
        t.cache
            .members(&alice.id)
            .await
            .unwrap()
            .contains(&outcome.session_id)
    );

    let row = t.ledger_row(&outcome.session_id).await;
    assert_eq!(row.user_id, alice.id);
    assert!(!row.is_revoked());
    assert!(outcome.degraded.is_empty());
    assert_eq!(outcome.user.id, alice.id);
}

#[tokio::test]
async fn test_login_expiry_follows_configured_ttl() {
    let t = TestEngine::with_config(sessiond_core::config::SessionConfig {
        ttl_seconds: 120,
        max_sessions_per_user: 0,
    });
    t.create_user("alice", "pw").await;

    let outcome = t.login_ok("alice", "pw").await;
    let live = t.cache.get(&outcome.session_id).await.unwrap().unwrap();
    assert_eq!((live.expires_at - live.created_at).num_seconds(), 120);
}

#[tokio::test]
async fn test_login_schedules_expiry_then_audit() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;

    let outcome = t.login_ok("alice", "pw").await;

    let jobs = t.jobs.jobs().await;
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].job_type, "session:expire");
    assert_eq!(jobs[0].run_at, Some(outcome.expires_at));
    assert_eq!(jobs[0].payload["session_id"], outcome.session_id.to_string());
    assert_eq!(jobs[0].payload["user_id"], alice.id.to_string());

    assert_eq!(jobs[1].job_type, "login:audit");
    assert_eq!(jobs[1].run_at, None);
    assert_eq!(jobs[1].payload["success"], true);
    assert_eq!(jobs[1].payload["reason"], "success");
    assert_eq!(jobs[1].payload["ip"], "203.0.113.7");
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_are_indistinguishable() {
    let t = TestEngine::new(2);
    t.create_user("alice", "pw").await;

    let unknown = t.engine.login("nobody", "pw", client()).await.unwrap_err();
    let wrong = t.engine.login("alice", "nope", client()).await.unwrap_err();

    assert!(matches!(unknown, SessionError::InvalidCredentials));
    assert!(matches!(wrong, SessionError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());

    let reasons: Vec<_> = t
        .jobs
        .of_type("login:audit")
        .await
        .into_iter()
        .map(|j| j.payload["reason"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(reasons, vec!["user_not_found", "wrong_password"]);

    let first = &t.jobs.of_type("login:audit").await[0];
    assert!(first.payload.get("user_id").is_none());
}

#[tokio::test]
async fn test_cap_evicts_single_oldest_session() {
    let t = TestEngine::new(3);
    let alice = t.create_user("alice", "pw").await;

    let mut issued = Vec::new();
    for _ in 0..4 {
        issued.push(t.login_ok("alice", "pw").await);
    }

    let members = t.cache.members(&alice.id).await.unwrap();
    assert_eq!(members.len(), 3);
    assert!(!members.contains(&issued[0].session_id));
    assert_eq!(issued[3].evicted, Some(issued[0].session_id));

    let row = t.ledger_row(&issued[0].session_id).await;
    assert_eq!(row.revoked_by(), Some(RevokedBy::SystemLimit));
}

#[tokio::test]
async fn test_alice_three_logins_with_cap_of_two() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;

    let first = t.login_ok("alice", "pw").await;
    let second = t.login_ok("alice", "pw").await;
    let third = t.login_ok("alice", "pw").await;

    assert!(!t.engine.is_valid(&alice.id, &first.session_id).await.unwrap());
    assert!(t.engine.is_valid(&alice.id, &second.session_id).await.unwrap());
    assert!(t.engine.is_valid(&alice.id, &third.session_id).await.unwrap());
}

#[tokio::test]
async fn test_zero_cap_disables_eviction() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;

    for _ in 0..5 {
        t.login_ok("alice", "pw").await;
    }
    assert_eq!(t.cache.count(&alice.id).await.unwrap(), 5);
}

#[tokio::test]
async fn test_is_valid_rejects_unknown_and_foreign_sessions() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    let bob = t.create_user("bob", "pw").await;
    let outcome = t.login_ok("alice", "pw").await;

    assert!(!t.engine.is_valid(&alice.id, &SessionId::new()).await.unwrap());
    assert!(!t.engine.is_valid(&bob.id, &outcome.session_id).await.unwrap());
    assert!(!t.engine.is_valid(&UserId::new(), &outcome.session_id).await.unwrap());
}

#[tokio::test]
async fn test_logout_invalidates_and_is_idempotent() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    let outcome = t.login_ok("alice", "pw").await;

    let first = t.engine.logout(&alice.id, &outcome.session_id).await.unwrap();
    assert!(first.ledger_revoked);
    assert!(!t.engine.is_valid(&alice.id, &outcome.session_id).await.unwrap());

    let second = t.engine.logout(&alice.id, &outcome.session_id).await.unwrap();
    assert!(!second.ledger_revoked);
    assert!(!t.engine.is_valid(&alice.id, &outcome.session_id).await.unwrap());
    assert!(!t.engine.is_valid(&alice.id, &outcome.session_id).await.unwrap());

    assert_eq!(t.cache.count(&alice.id).await.unwrap(), 0);
    let row = t.ledger_row(&outcome.session_id).await;
    assert_eq!(row.revoked_by(), Some(RevokedBy::User));
}

#[tokio::test]
async fn test_logout_with_someone_elses_session_id_changes_nothing() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    let bob = t.create_user("bob", "pw").await;
    let bobs = t.login_ok("bob", "pw").await;

    let outcome = t.engine.logout(&alice.id, &bobs.session_id).await.unwrap();

    assert!(!outcome.ledger_revoked);
    assert!(t.engine.is_valid(&bob.id, &bobs.session_id).await.unwrap());
    assert_eq!(t.cache.count(&bob.id).await.unwrap(), 1);
    assert!(!t.ledger_row(&bobs.session_id).await.is_revoked());
}

#[tokio::test]
async fn test_logout_of_never_issued_session_succeeds() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;

    let outcome = t.engine.logout(&alice.id, &SessionId::new()).await.unwrap();
    assert!(!outcome.ledger_revoked);
    assert!(outcome.degraded.is_empty());
}

#[tokio::test]
async fn test_token_round_trips_to_session() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    let outcome = t.login_ok("alice", "pw").await;

    let claims = t.codec.verify(&outcome.token).unwrap();
    assert_eq!(claims.user_id, alice.id);
    assert_eq!(claims.session_id, Some(outcome.session_id));
    assert_eq!(claims.expires_at.timestamp(), outcome.expires_at.timestamp());

    let principal = t.engine.authenticate(&outcome.token).await.unwrap();
    assert_eq!(principal.user_id, alice.id);
    assert_eq!(principal.session_id, outcome.session_id);
}

#[tokio::test]
async fn test_authenticate_rejects_logged_out_session() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    let outcome = t.login_ok("alice", "pw").await;
    t.engine.logout(&alice.id, &outcome.session_id).await.unwrap();

    let err = t.engine.authenticate(&outcome.token).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::SessionInvalid(InvalidSession::NotLive)
    ));
}

#[tokio::test]
async fn test_authenticate_rejects_token_without_session() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    let now = chrono::Utc::now();
    let token = t
        .codec
        .encoder()
        .encode(&sessiond_auth::Claims {
            sub: alice.id,
            sid: None,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::minutes(5)).timestamp(),
            jti: uuid::Uuid::new_v4(),
        })
        .unwrap();

    let err = t.engine.authenticate(&token).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::SessionInvalid(InvalidSession::NoSession)
    ));
    assert_eq!(err.code(), "invalid_token_no_session");
}

#[tokio::test]
async fn test_authenticate_rejects_garbage() {
    let t = TestEngine::new(2);
    let err = t.engine.authenticate("not.a.jwt").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::SessionInvalid(InvalidSession::BadToken)
    ));
}

#[tokio::test]
async fn test_fast_store_write_failure_aborts_without_ledger_row() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    t.cache.fail_create.store(true, Ordering::SeqCst);

    let err = t.engine.login("alice", "pw", client()).await.unwrap_err();
    assert!(matches!(err, SessionError::Internal(_)));
    assert_eq!(t.accounts.session_count(), 0);
    assert_eq!(t.cache.count(&alice.id).await.unwrap(), 0);
    assert!(t.jobs.of_type("session:expire").await.is_empty());
}

#[tokio::test]
async fn test_ledger_insert_failure_leaves_live_record() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    t.ledger.fail_insert.store(true, Ordering::SeqCst);

    let err = t.engine.login("alice", "pw", client()).await.unwrap_err();
    assert!(matches!(err, SessionError::Internal(_)));

    // Accepted inconsistency: the live record is already visible.
    let members = t.cache.members(&alice.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert!(t.engine.is_valid(&alice.id, &members[0]).await.unwrap());
}

#[tokio::test]
async fn test_ban_marker_lookup_failure_fails_closed() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    t.cache.fail_ban_lookup.store(true, Ordering::SeqCst);

    let err = t.engine.login("alice", "pw", client()).await.unwrap_err();
    assert!(matches!(err, SessionError::Internal(_)));
    assert_eq!(t.cache.count(&alice.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_job_queue_outage_degrades_but_login_succeeds() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    t.jobs.fail(true);

    let outcome = t.engine.login("alice", "pw", client()).await.unwrap();

    let steps: Vec<_> = outcome.degraded.iter().map(|d| d.step).collect();
    assert_eq!(
        steps,
        vec![BestEffortStep::ScheduleExpiry, BestEffortStep::EnqueueAudit]
    );
    assert!(t.engine.is_valid(&alice.id, &outcome.session_id).await.unwrap());
}

#[tokio::test]
async fn test_eviction_failure_does_not_abort_login() {
    let t = TestEngine::new(1);
    let alice = t.create_user("alice", "pw").await;
    t.login_ok("alice", "pw").await;
    t.cache.fail_count.store(true, Ordering::SeqCst);

    let outcome = t.engine.login("alice", "pw", client()).await.unwrap();

    assert_eq!(outcome.evicted, None);
    assert_eq!(outcome.degraded[0].step, BestEffortStep::Evict);
    // Overshoot of the cap is tolerated until the next login.
    t.cache.fail_count.store(false, Ordering::SeqCst);
    assert_eq!(t.cache.count(&alice.id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_eviction_ledger_failure_is_reported() {
    let t = TestEngine::new(1);
    let alice = t.create_user("alice", "pw").await;
    let first = t.login_ok("alice", "pw").await;
    t.ledger.fail_revoke.store(true, Ordering::SeqCst);

    let second = t.engine.login("alice", "pw", client()).await.unwrap();

    assert_eq!(second.evicted, Some(first.session_id));
    assert_eq!(second.degraded[0].step, BestEffortStep::LedgerRevoke);
    assert!(!t.engine.is_valid(&alice.id, &first.session_id).await.unwrap());
    assert!(!t.ledger_row(&first.session_id).await.is_revoked());
}

#[tokio::test]
async fn test_cancelled_login_may_leave_live_record() {
    let t = TestEngine::new(2);
    let alice = t.create_user("alice", "pw").await;
    *t.ledger.insert_delay.lock().await = Some(Duration::from_millis(200));

    let result = tokio::time::timeout(
        Duration::from_millis(50),
        t.engine.login("alice", "pw", client()),
    )
    .await;
    assert!(result.is_err(), "login should have been cancelled");

    // No rollback: the live record written before cancellation survives
    // and is left to its TTL.
    let members = t.cache.members(&alice.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert!(t.cache.get(&members[0]).await.unwrap().is_some());
    assert_eq!(t.accounts.session_count(), 0);
    assert!(t.jobs.jobs().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_logins_all_succeed() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;

    let logins = (0..8).map(|_| t.engine.login("alice", "pw", client()));
    let results = futures::future::join_all(logins).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(t.cache.count(&alice.id).await.unwrap(), 8);
}
