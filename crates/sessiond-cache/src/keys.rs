//! Fast-store key builders.
//!
//! Key names are part of the observable contract: operators inspect them
//! directly. The three key spaces use distinct leading segments so they
//! can never collide.

use sessiond_core::types::id::{SessionId, UserId};

const SESSION: &str = "sess:";
const USER_SESSIONS: &str = "user_sess:";
const BANNED_USER: &str = "banned_user:";

/// Glob matching every ban marker.
pub const BANNED_USER_PATTERN: &str = "banned_user:*";

/// Hash holding one live session record.
pub fn session(session_id: &SessionId) -> String {
    format!("{SESSION}{session_id}")
}

/// Sorted set of a user's live session ids scored by creation time.
pub fn user_sessions(user_id: &UserId) -> String {
    format!("{USER_SESSIONS}{user_id}")
}

/// Presence-only ban marker.
pub fn banned_user(user_id: &UserId) -> String {
    format!("{BANNED_USER}{user_id}")
}

/// Recover the user id from a ban marker key (without any deployment prefix).
pub fn parse_banned_user(key: &str) -> Option<UserId> {
    key.strip_prefix(BANNED_USER)?.parse().ok()
}
