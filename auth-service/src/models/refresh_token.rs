use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Server-side record for an opaque refresh token.
///
/// The token itself is never stored; entries are keyed by the SHA-256
/// hash of the bearer string, so a dump of the store yields nothing
/// redeemable.
#[derive(Debug, Clone)]
pub struct RefreshTokenEntry {
    /// Owner of this token. Exactly one owner per token; a user may hold
    /// several live tokens at once (one per device).
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenEntry {
    pub fn new(user_id: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            expires_at,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Hash an opaque token into its storage key.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
