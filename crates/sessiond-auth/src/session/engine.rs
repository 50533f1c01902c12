//! Engine construction, validity checks and logout.

use std::sync::Arc;

use tracing::{debug, info, warn};

use sessiond_core::config::SessionConfig;
use sessiond_core::error::{AppError, ErrorKind};
use sessiond_core::traits::{CredentialVerifier, JobScheduler, SessionCache, TokenCodec};
use sessiond_core::types::id::{SessionId, UserId};
use sessiond_core::types::session::RevokedBy;
use sessiond_database::{AccountStore, LoginAuditLog, SessionLedger};

use super::error::{InvalidSession, SessionError};
use super::outcome::{BestEffortStep, DegradedStep, Principal, RevokeOutcome};

/// Orchestrates the session lifecycle across the fast store and the
/// durable ledger.
///
/// Holds no mutable state of its own. Cloning is cheap and every clone
/// shares the same collaborators.
#[derive(Clone)]
pub struct SessionEngine {
    pub(crate) accounts: Arc<dyn AccountStore>,
    pub(crate) ledger: Arc<dyn SessionLedger>,
    pub(crate) audit: Arc<dyn LoginAuditLog>,
    pub(crate) cache: Arc<dyn SessionCache>,
    pub(crate) verifier: Arc<dyn CredentialVerifier>,
    pub(crate) tokens: Arc<dyn TokenCodec>,
    pub(crate) jobs: Arc<dyn JobScheduler>,
    pub(crate) config: SessionConfig,
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionEngine {
    /// Creates a new engine with all required collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn SessionLedger>,
        audit: Arc<dyn LoginAuditLog>,
        cache: Arc<dyn SessionCache>,
        verifier: Arc<dyn CredentialVerifier>,
        tokens: Arc<dyn TokenCodec>,
        jobs: Arc<dyn JobScheduler>,
        config: SessionConfig,
    ) -> Self {
        Self {
            accounts,
            ledger,
            audit,
            cache,
            verifier,
            tokens,
            jobs,
            config,
        }
    }

    /// The session settings this engine was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether `session_id` is live and owned by `user_id`.
    ///
    /// Only the fast store is consulted. A miss is `Ok(false)`; errors are
    /// reserved for store-access failures.
    pub async fn is_valid(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<bool, SessionError> {
        let live = self.cache.get(session_id).await?;
        Ok(live.is_some_and(|s| s.is_owned_by(user_id)))
    }

    /// Verify a bearer token and resolve it to a live session.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, SessionError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            if e.is(ErrorKind::Authentication) {
                debug!(error = %e, "Bearer token rejected");
                SessionError::SessionInvalid(InvalidSession::BadToken)
            } else {
                SessionError::Internal(e)
            }
        })?;

        let session_id = claims
            .session_id
            .ok_or(SessionError::SessionInvalid(InvalidSession::NoSession))?;

        if !self.is_valid(&claims.user_id, &session_id).await? {
            return Err(SessionError::SessionInvalid(InvalidSession::NotLive));
        }

        Ok(Principal {
            user_id: claims.user_id,
            session_id,
        })
    }

    /// End a session at the owner's request. Idempotent.
    pub async fn logout(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<RevokeOutcome, SessionError> {
        let outcome = self.revoke(user_id, session_id, RevokedBy::User).await?;
        info!(user_id = %user_id, session_id = %session_id, "Logged out");
        Ok(outcome)
    }

    /// Tear down one of `user_id`'s sessions: remove the live record and
    /// index entry in a single fast-store transaction, then mark the ledger
    /// row revoked.
    ///
    /// A live record owned by someone else is left alone; only the stray
    /// entry in `user_id`'s index is dropped. The fast-store step is fatal;
    /// the ledger step is best-effort.
    pub(crate) async fn revoke(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        by: RevokedBy,
    ) -> Result<RevokeOutcome, AppError> {
        let mut outcome = RevokeOutcome::new(*session_id);

        if let Some(live) = self.cache.get(session_id).await? {
            if !live.is_owned_by(user_id) {
                warn!(
                    user_id = %user_id,
                    session_id = %session_id,
                    owner = %live.user_id,
                    revoked_by = %by,
                    "Session belongs to another user, dropping index entry only"
                );
                self.cache.remove_from_index(user_id, session_id).await?;
                return Ok(outcome);
            }
        }

        self.cache.remove(user_id, session_id).await?;

        match self.ledger.revoke(session_id, user_id, by).await {
            Ok(applied) => outcome.ledger_revoked = applied,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    session_id = %session_id,
                    revoked_by = %by,
                    error = %e,
                    "Ledger revoke failed, live record already removed"
                );
                outcome.degraded.push(DegradedStep {
                    step: BestEffortStep::LedgerRevoke,
                    error: e,
                });
            }
        }
        Ok(outcome)
    }
}
