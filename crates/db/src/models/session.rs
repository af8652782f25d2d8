//! Refresh-token session model.

use sqlx::FromRow;

use dataport_core::types::{DbId, Timestamp};

/// A row from the `refresh_tokens` table. Only the SHA-256 hash of the
/// token is stored; the plaintext never touches the database.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RefreshToken {
    /// Whether the token is still usable at `now`.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}
