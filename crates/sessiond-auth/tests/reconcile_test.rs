//! Integration tests for the worker-facing reconciliation operations.

mod helpers;

use std::sync::atomic::Ordering;

use sessiond_auth::session::ExpireOutcome;
use sessiond_core::traits::SessionCache;
use sessiond_core::types::id::SessionId;
use sessiond_core::types::session::{LiveSession, RevokedBy};
use sessiond_database::AccountStore;
use sessiond_entity::audit::LoginReason;
use sessiond_entity::job::{LoginAuditPayload, SessionExpirePayload};

use helpers::{TestEngine, client};

fn expire_payload(session_id: SessionId, user_id: sessiond_core::types::id::UserId) -> SessionExpirePayload {
    SessionExpirePayload {
        session_id,
        user_id,
    }
}

#[tokio::test]
async fn test_expiry_job_removes_live_session() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;
    let outcome = t.login_ok("alice", "pw").await;

    let result = t
        .engine
        .handle_session_expire(&expire_payload(outcome.session_id, alice.id))
        .await
        .unwrap();

    assert_eq!(result, ExpireOutcome::Expired);
    assert!(!t.engine.is_valid(&alice.id, &outcome.session_id).await.unwrap());
    assert_eq!(t.cache.count(&alice.id).await.unwrap(), 0);
    assert_eq!(
        t.ledger_row(&outcome.session_id).await.revoked_by(),
        Some(RevokedBy::SystemExpire)
    );
}

#[tokio::test]
async fn test_expiry_job_after_logout_is_a_no_op_success() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;
    let outcome = t.login_ok("alice", "pw").await;
    t.engine.logout(&alice.id, &outcome.session_id).await.unwrap();

    let payload = expire_payload(outcome.session_id, alice.id);
    let first = t.engine.handle_session_expire(&payload).await.unwrap();
    let second = t.engine.handle_session_expire(&payload).await.unwrap();

    assert_eq!(first, ExpireOutcome::AlreadyGone);
    assert_eq!(second, ExpireOutcome::AlreadyGone);
    // The logout actor is preserved.
    assert_eq!(
        t.ledger_row(&outcome.session_id).await.revoked_by(),
        Some(RevokedBy::User)
    );
}

#[tokio::test]
async fn test_expiry_job_sweeps_index_after_store_ttl() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;
    let stale = LiveSession {
        session_id: SessionId::new(),
        user_id: alice.id,
        created_at: chrono::Utc::now() - chrono::Duration::hours(2),
        expires_at: chrono::Utc::now() - chrono::Duration::hours(1),
        client: client(),
    };
    t.cache.create(&stale).await.unwrap();

    let result = t
        .engine
        .handle_session_expire(&expire_payload(stale.session_id, alice.id))
        .await
        .unwrap();

    assert_eq!(result, ExpireOutcome::AlreadyGone);
    assert_eq!(t.cache.count(&alice.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_expiry_job_ledger_failure_leaves_record_for_retry() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;
    let outcome = t.login_ok("alice", "pw").await;
    let payload = expire_payload(outcome.session_id, alice.id);

    t.ledger.fail_revoke.store(true, Ordering::SeqCst);
    assert!(t.engine.handle_session_expire(&payload).await.is_err());
    assert!(t.engine.is_valid(&alice.id, &outcome.session_id).await.unwrap());

    t.ledger.fail_revoke.store(false, Ordering::SeqCst);
    assert_eq!(
        t.engine.handle_session_expire(&payload).await.unwrap(),
        ExpireOutcome::Expired
    );
    assert!(!t.engine.is_valid(&alice.id, &outcome.session_id).await.unwrap());
    assert_eq!(
        t.ledger_row(&outcome.session_id).await.revoked_by(),
        Some(RevokedBy::SystemExpire)
    );
}

#[tokio::test]
async fn test_expiry_job_leaves_ledger_alone_when_record_is_gone() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;
    let outcome = t.login_ok("alice", "pw").await;

    // Logout removes the live record but its ledger write is lost.
    t.ledger.fail_revoke.store(true, Ordering::SeqCst);
    let logout = t.engine.logout(&alice.id, &outcome.session_id).await.unwrap();
    assert_eq!(logout.degraded.len(), 1);
    t.ledger.fail_revoke.store(false, Ordering::SeqCst);

    let result = t
        .engine
        .handle_session_expire(&expire_payload(outcome.session_id, alice.id))
        .await
        .unwrap();

    assert_eq!(result, ExpireOutcome::AlreadyGone);
    assert!(!t.ledger_row(&outcome.session_id).await.is_revoked());
}

#[tokio::test]
async fn test_record_login_event_writes_each_attempt_once() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;

    let payload = LoginAuditPayload::new(
        Some(alice.id),
        "alice",
        LoginReason::WrongPassword,
        &client(),
    );
    t.engine.record_login_event(payload.clone()).await.unwrap();
    t.engine.record_login_event(payload.clone()).await.unwrap();

    let events = t.accounts.login_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, payload.event_id);
    assert_eq!(events[0].created_at, payload.occurred_at);
    assert_eq!(events[0].reason, "wrong_password");
    assert_eq!(events[0].user_id, Some(alice.id));
    assert!(!events[0].success);
    assert_eq!(events[0].ip, "203.0.113.7");

    // A second attempt is a separate fact.
    let retry = LoginAuditPayload::new(Some(alice.id), "alice", LoginReason::Success, &client());
    t.engine.record_login_event(retry).await.unwrap();
    assert_eq!(t.accounts.login_events().await.len(), 2);
}

#[tokio::test]
async fn test_reconcile_restores_missing_marker_and_kicks() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;
    let live = t.login_ok("alice", "pw").await;

    // Durable flag set behind the engine's back.
    t.accounts.set_banned(&alice.id, true).await.unwrap();

    let report = t.engine.reconcile_ban_markers().await.unwrap();

    assert_eq!(report.markers_set, 1);
    assert_eq!(report.sessions_kicked, 1);
    assert!(t.cache.has_ban_marker(&alice.id).await.unwrap());
    assert!(!t.engine.is_valid(&alice.id, &live.session_id).await.unwrap());
}

#[tokio::test]
async fn test_reconcile_clears_stale_marker() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;
    t.cache.set_ban_marker(&alice.id).await.unwrap();

    let report = t.engine.reconcile_ban_markers().await.unwrap();

    assert_eq!(report.markers_cleared, 1);
    assert!(!t.cache.has_ban_marker(&alice.id).await.unwrap());
    t.login_ok("alice", "pw").await;
}

#[tokio::test]
async fn test_reconcile_is_quiet_when_consistent() {
    let t = TestEngine::new(0);
    let alice = t.create_user("alice", "pw").await;
    t.engine.ban_user(&alice.id).await.unwrap();

    let report = t.engine.reconcile_ban_markers().await.unwrap();
    assert_eq!(report, Default::default());
}
