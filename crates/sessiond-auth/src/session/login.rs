//! The login flow.

use chrono::Utc;
use tracing::{error, info, warn};

use sessiond_core::error::AppError;
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::{ClientMeta, LiveSession, RevokedBy};
use sessiond_entity::audit::LoginReason;
use sessiond_entity::job::{JobPayload, LoginAuditPayload, SessionExpirePayload};
use sessiond_entity::session::NewSessionRecord;

use super::engine::SessionEngine;
use super::error::SessionError;
use super::outcome::{BestEffortStep, DegradedStep, LoginOutcome};

impl SessionEngine {
    /// Authenticate `username` and issue a new session.
    ///
    /// Steps, stopping at the first failure:
    ///
    /// 1. Resolve the user
    /// 2. Check the durable ban flag, then the fast-store ban marker
    /// 3. Verify the credential
    /// 4. Evict the oldest session if the cap is reached (best-effort)
    /// 5. Write the live record and index entry atomically (fatal)
    /// 6. Insert the ledger row (fatal, live record stays)
    /// 7. Schedule the deferred expiry job (best-effort)
    /// 8. Enqueue the audit fact (best-effort)
    /// 9. Issue the bearer token
    ///
    /// Every classified failure also enqueues an audit fact.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client: ClientMeta,
    ) -> Result<LoginOutcome, SessionError> {
        let mut degraded = Vec::new();

        let Some(user) = self.accounts.find_by_username(username).await? else {
            self.audit_login(
                None,
                username,
                LoginReason::UserNotFound,
                &client,
                &mut degraded,
            )
            .await;
            return Err(SessionError::InvalidCredentials);
        };

        if user.is_banned {
            self.audit_login(
                Some(user.id),
                username,
                LoginReason::UserBannedDb,
                &client,
                &mut degraded,
            )
            .await;
            return Err(SessionError::UserBanned);
        }

        // A marker lookup failure must not let a banned user through.
        if self.cache.has_ban_marker(&user.id).await? {
            self.audit_login(
                Some(user.id),
                username,
                LoginReason::UserBannedCache,
                &client,
                &mut degraded,
            )
            .await;
            return Err(SessionError::UserBanned);
        }

        if !self.verifier.verify(&user.password_hash, password).await? {
            self.audit_login(
                Some(user.id),
                username,
                LoginReason::WrongPassword,
                &client,
                &mut degraded,
            )
            .await;
            return Err(SessionError::InvalidCredentials);
        }

        let evicted = self.enforce_session_cap(&user.id, &mut degraded).await;

        let now = Utc::now();
        let live = LiveSession {
            session_id: SessionId::new(),
            user_id: user.id,
            created_at: now,
            expires_at: now + self.config.ttl(),
            client,
        };

        self.cache.create(&live).await.map_err(|e| {
            error!(user_id = %user.id, error = %e, "Failed to write live session");
            SessionError::Internal(e)
        })?;

        self.ledger.insert(&NewSessionRecord::from(&live)).await.map_err(|e| {
            error!(
                user_id = %user.id,
                session_id = %live.session_id,
                error = %e,
                "Failed to insert ledger row, live session left to expire"
            );
            SessionError::Internal(e)
        })?;

        self.schedule_expiry(&live, &mut degraded).await;
        self.audit_login(
            Some(user.id),
            username,
            LoginReason::Success,
            &live.client,
            &mut degraded,
        )
        .await;

        let token = self
            .tokens
            .issue(&user.id, &live.session_id, live.expires_at)?;

        info!(
            user_id = %user.id,
            session_id = %live.session_id,
            expires_at = %live.expires_at,
            degraded = degraded.len(),
            "Login successful"
        );

        Ok(LoginOutcome {
            user,
            session_id: live.session_id,
            expires_at: live.expires_at,
            token,
            evicted,
            degraded,
        })
    }

    /// Evict the single oldest session when the user is at the cap.
    ///
    /// Concurrent logins may briefly overshoot the cap; the next login
    /// corrects it.
    async fn enforce_session_cap(
        &self,
        user_id: &UserId,
        degraded: &mut Vec<DegradedStep>,
    ) -> Option<SessionId> {
        if !self.config.cap_enabled() {
            return None;
        }

        match self.evict_oldest(user_id).await {
            Ok(Some((session_id, steps))) => {
                info!(user_id = %user_id, session_id = %session_id, "Evicted oldest session");
                degraded.extend(steps);
                Some(session_id)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Session eviction failed, continuing login");
                degraded.push(DegradedStep {
                    step: BestEffortStep::Evict,
                    error: e,
                });
                None
            }
        }
    }

    async fn evict_oldest(
        &self,
        user_id: &UserId,
    ) -> Result<Option<(SessionId, Vec<DegradedStep>)>, AppError> {
        let count = self.cache.count(user_id).await?;
        if count < u64::from(self.config.max_sessions_per_user) {
            return Ok(None);
        }

        let Some(oldest) = self.cache.oldest(user_id).await? else {
            return Ok(None);
        };

        let outcome = self.revoke(user_id, &oldest, RevokedBy::SystemLimit).await?;
        Ok(Some((oldest, outcome.degraded)))
    }

    async fn schedule_expiry(&self, live: &LiveSession, degraded: &mut Vec<DegradedStep>) {
        let payload = SessionExpirePayload {
            session_id: live.session_id,
            user_id: live.user_id,
        };

        let result = match payload.to_value() {
            Ok(value) => {
                self.jobs
                    .schedule_at(SessionExpirePayload::JOB_TYPE, value, live.expires_at)
                    .await
            }
            Err(e) => Err(AppError::from(e)),
        };

        if let Err(e) = result {
            warn!(
                session_id = %live.session_id,
                error = %e,
                "Failed to schedule session expiry, relying on store TTL"
            );
            degraded.push(DegradedStep {
                step: BestEffortStep::ScheduleExpiry,
                error: e,
            });
        }
    }

    async fn audit_login(
        &self,
        user_id: Option<UserId>,
        username: &str,
        reason: LoginReason,
        client: &ClientMeta,
        degraded: &mut Vec<DegradedStep>,
    ) {
        let payload = LoginAuditPayload::new(user_id, username, reason, client);

        let result = match payload.to_value() {
            Ok(value) => self.jobs.enqueue(LoginAuditPayload::JOB_TYPE, value).await,
            Err(e) => Err(AppError::from(e)),
        };

        if let Err(e) = result {
            warn!(username = %username, reason = %reason, error = %e, "Failed to enqueue login audit");
            degraded.push(DegradedStep {
                step: BestEffortStep::EnqueueAudit,
                error: e,
            });
        }
    }
}
