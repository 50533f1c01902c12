//! Reconciliation operations executed by the background worker.
//!
//! Every handler here tolerates running more than once, late, or not at
//! all. The fast store's own TTL keeps live records correct regardless.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use sessiond_core::result::AppResult;
use sessiond_core::types::id::UserId;
use sessiond_core::types::session::RevokedBy;
use sessiond_entity::audit::CreateLoginEvent;
use sessiond_entity::job::{LoginAuditPayload, SessionExpirePayload};

use super::engine::SessionEngine;
use super::outcome::{BanReconcileReport, ExpireOutcome};

impl SessionEngine {
    /// Deferred expiry of one session.
    ///
    /// When the live record is gone (logout, kick, or the store TTL fired
    /// first) the call succeeds as [`ExpireOutcome::AlreadyGone`] and only
    /// the index entry is swept. The ledger keeps whatever the earlier
    /// teardown wrote.
    ///
    /// Otherwise the ledger row is revoked before the live record is
    /// removed, so a failed ledger write leaves the record in place for the
    /// retry to find.
    pub async fn handle_session_expire(
        &self,
        payload: &SessionExpirePayload,
    ) -> AppResult<ExpireOutcome> {
        let live = self
            .cache
            .get(&payload.session_id)
            .await?
            .filter(|s| s.is_owned_by(&payload.user_id));

        if live.is_none() {
            self.cache
                .remove_from_index(&payload.user_id, &payload.session_id)
                .await?;
            debug!(
                session_id = %payload.session_id,
                user_id = %payload.user_id,
                "Session already gone, index swept"
            );
            return Ok(ExpireOutcome::AlreadyGone);
        }

        let ledger_revoked = self
            .ledger
            .revoke(&payload.session_id, &payload.user_id, RevokedBy::SystemExpire)
            .await?;
        self.cache
            .remove(&payload.user_id, &payload.session_id)
            .await?;

        debug!(
            session_id = %payload.session_id,
            user_id = %payload.user_id,
            ledger_revoked,
            "Session expired"
        );
        Ok(ExpireOutcome::Expired)
    }

    /// Append one login audit fact. Never touches session state.
    pub async fn record_login_event(&self, payload: LoginAuditPayload) -> AppResult<()> {
        let event = CreateLoginEvent::from(payload);
        self.audit.record(&event).await
    }

    /// Bring fast-store ban markers in line with the durable ban flags.
    ///
    /// The durable flag wins. Banned users get a marker and lose any
    /// sessions still indexed; markers without a durable flag are removed.
    pub async fn reconcile_ban_markers(&self) -> AppResult<BanReconcileReport> {
        // Markers first: ban writes the durable flag before the marker, so
        // any marker seen here already has its flag visible below.
        let marked: HashSet<UserId> = self.cache.ban_markers().await?.into_iter().collect();
        let banned: HashSet<UserId> = self.accounts.banned_user_ids().await?.into_iter().collect();
        let mut report = BanReconcileReport::default();

        for user_id in &banned {
            if !marked.contains(user_id) {
                warn!(user_id = %user_id, "Ban marker missing for banned user, restoring");
                self.cache.set_ban_marker(user_id).await?;
                report.markers_set += 1;
            }

            for session_id in self.cache.members(user_id).await? {
                match self.revoke(user_id, &session_id, RevokedBy::AdminKick).await {
                    Ok(_) => report.sessions_kicked += 1,
                    Err(e) => {
                        warn!(
                            user_id = %user_id,
                            session_id = %session_id,
                            error = %e,
                            "Failed to kick banned user's session"
                        );
                    }
                }
            }
        }

        for user_id in marked.difference(&banned) {
            warn!(user_id = %user_id, "Stale ban marker for unbanned user, clearing");
            self.cache.clear_ban_marker(user_id).await?;
            report.markers_cleared += 1;
        }

        if report != BanReconcileReport::default() {
            info!(
                markers_set = report.markers_set,
                markers_cleared = report.markers_cleared,
                sessions_kicked = report.sessions_kicked,
                "Ban markers reconciled"
            );
        }
        Ok(report)
    }
}
