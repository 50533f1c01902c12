//! Administrative operations: list, kick, ban, unban.

use tracing::{info, warn};

use sessiond_core::error::AppError;
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::RevokedBy;

use super::engine::SessionEngine;
use super::error::SessionError;
use super::outcome::{ActiveSession, KickAllOutcome, RevokeOutcome};

impl SessionEngine {
    /// Live sessions of `user_id`, oldest first.
    ///
    /// Index entries whose live record has already expired are skipped.
    pub async fn list_active_sessions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ActiveSession>, SessionError> {
        let members = self.cache.members(user_id).await?;
        let mut sessions = Vec::with_capacity(members.len());

        for session_id in members {
            let Some(live) = self.cache.get(&session_id).await? else {
                continue;
            };
            if !live.is_owned_by(user_id) {
                continue;
            }
            sessions.push(ActiveSession {
                session_id: live.session_id,
                created_at: live.created_at,
                expires_at: live.expires_at,
                client: live.client,
            });
        }

        Ok(sessions)
    }

    /// Terminate one session on behalf of an administrator.
    pub async fn kick_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<RevokeOutcome, SessionError> {
        let outcome = self.revoke(user_id, session_id, RevokedBy::AdminKick).await?;
        info!(user_id = %user_id, session_id = %session_id, "Session kicked");
        Ok(outcome)
    }

    /// Terminate every indexed session of `user_id`.
    ///
    /// A failure on one member does not stop the others; failures are
    /// collected on the outcome.
    pub async fn kick_all_sessions(&self, user_id: &UserId) -> Result<KickAllOutcome, SessionError> {
        let members = self.cache.members(user_id).await?;
        let mut outcome = KickAllOutcome::default();

        for session_id in members {
            match self.revoke(user_id, &session_id, RevokedBy::AdminKick).await {
                Ok(revoked) => {
                    outcome.kicked.push(session_id);
                    outcome.degraded.extend(revoked.degraded);
                }
                Err(e) => {
                    warn!(user_id = %user_id, session_id = %session_id, error = %e, "Failed to kick session");
                    outcome.failures.push((session_id, e));
                }
            }
        }

        info!(
            user_id = %user_id,
            kicked = outcome.kicked.len(),
            failed = outcome.failures.len(),
            "Kicked all sessions"
        );
        Ok(outcome)
    }

    /// Ban a user: durable flag, then fast-store marker, then kick all.
    ///
    /// Both ban signals are in place before any session is torn down, so a
    /// login racing the ban is refused.
    pub async fn ban_user(&self, user_id: &UserId) -> Result<KickAllOutcome, SessionError> {
        if !self.accounts.set_banned(user_id, true).await? {
            return Err(AppError::not_found(format!("User {user_id} not found")).into());
        }
        self.cache.set_ban_marker(user_id).await?;
        info!(user_id = %user_id, "User banned");

        self.kick_all_sessions(user_id).await
    }

    /// Lift a ban. Sessions torn down by the ban are not restored.
    pub async fn unban_user(&self, user_id: &UserId) -> Result<(), SessionError> {
        if !self.accounts.set_banned(user_id, false).await? {
            return Err(AppError::not_found(format!("User {user_id} not found")).into());
        }
        self.cache.clear_ban_marker(user_id).await?;
        info!(user_id = %user_id, "User unbanned");
        Ok(())
    }
}
