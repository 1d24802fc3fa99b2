use std::sync::Arc;

use agora_db::Database;
use agora_types::UserId;
use agora_types::models::{Identity, Session};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;
use rand_core::{OsRng, RngCore};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::ForumError;

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Issues, resolves and revokes opaque session tokens.
///
/// Expiry is lazy: an expired row stays in storage until it is replaced,
/// invalidated or purged, but it never resolves.
#[derive(Clone)]
pub struct SessionStore {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(db, clock, Duration::hours(DEFAULT_SESSION_TTL_HOURS))
    }

    pub fn with_ttl(db: Arc<Database>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { db, clock, ttl }
    }

    /// Issue an additional session for `user_id`, leaving existing ones alone.
    pub fn create(&self, user_id: UserId) -> Result<Session, ForumError> {
        let session = self.new_session(user_id);
        self.db
            .insert_session(&session.token, user_id, session.expires_at)?;
        debug!("Session issued for user {}", user_id);
        Ok(session)
    }

    /// Issue a session for `user_id` and revoke every other one it had.
    /// Delete and insert commit together.
    pub fn create_exclusive(&self, user_id: UserId) -> Result<Session, ForumError> {
        let session = self.new_session(user_id);
        let revoked = self
            .db
            .replace_sessions(&session.token, user_id, session.expires_at)
            .map_err(ForumError::transaction)?;
        if revoked > 0 {
            debug!("Revoked {} prior session(s) for user {}", revoked, user_id);
        }
        Ok(session)
    }

    /// The identity bound to `token`, or `None` for unknown and expired tokens.
    /// Only a storage fault is an error.
    pub fn resolve(&self, token: &str) -> Result<Option<Identity>, ForumError> {
        let Some(row) = self.db.get_session(token)? else {
            return Ok(None);
        };

        if self.clock.now() > row.expires_at {
            return Ok(None);
        }

        Ok(Some(Identity {
            user_id: row.user_id,
            username: row.username,
        }))
    }

    /// Revoke `token`. Unknown tokens are ignored.
    pub fn invalidate(&self, token: &str) -> Result<(), ForumError> {
        if self.db.delete_session(token)? > 0 {
            debug!("Session invalidated");
        }
        Ok(())
    }

    /// Delete rows whose expiry has passed. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, ForumError> {
        let removed = self.db.delete_sessions_expired_before(self.clock.now())?;
        if removed > 0 {
            info!("Purged {} expired session(s)", removed);
        }
        Ok(removed)
    }

    fn new_session(&self, user_id: UserId) -> Session {
        Session {
            token: generate_token(),
            user_id,
            expires_at: self.clock.now() + self.ttl,
        }
    }
}

/// 256 bits from the OS RNG, base64url without padding (43 chars).
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
