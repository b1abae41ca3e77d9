use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

use crate::models::{
    hash_token, Identity, InvitationDetails, RefreshTokenEntry, SpecialTokenEntry,
    SpecialTokenKind,
};
use crate::services::{error::invalid_credentials, JwtService, ServiceError, TokenStore};

/// Token pair returned to clients.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Issues, validates, rotates, and revokes every credential the platform
/// trusts: signed stateless access tokens, opaque server-tracked refresh
/// tokens, and single-use special tokens.
///
/// Access tokens cannot be revoked before their natural expiry; only
/// refresh and special tokens are revocable server-side. That trade-off
/// (stateless verification over instant revocation) is deliberate.
#[derive(Clone)]
pub struct TokenService {
    jwt: JwtService,
    store: Arc<TokenStore>,
    refresh_token_expiry_days: i64,
}

impl TokenService {
    pub fn new(jwt: JwtService, store: Arc<TokenStore>, refresh_token_expiry_days: i64) -> Self {
        Self {
            jwt,
            store,
            refresh_token_expiry_days,
        }
    }

    /// Sign an access token and mint a fresh refresh token for the
    /// identity. The only failure mode is the signing primitive, and key
    /// misconfiguration is already fatal at startup.
    pub fn issue_token_pair(&self, identity: &Identity) -> Result<TokenResponse, ServiceError> {
        let access_token = self.jwt.sign_access_token(identity)?;

        let refresh_token = generate_opaque_token();
        let expires_at = Utc::now() + Duration::days(self.refresh_token_expiry_days);
        self.store.insert_refresh(
            hash_token(&refresh_token),
            RefreshTokenEntry::new(identity.id.clone(), expires_at),
        );

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_token_expiry_seconds(),
        })
    }

    /// Stateless verification of an access token.
    pub fn verify_access_token(
        &self,
        token: &str,
    ) -> Result<crate::services::AccessTokenClaims, ServiceError> {
        self.jwt.verify_access_token(token)
    }

    /// Owner of a live refresh token, if any. Expired entries are deleted
    /// as a side effect of being seen.
    pub fn validate_refresh_token(&self, token: &str) -> Option<String> {
        self.store
            .get_valid_refresh(&hash_token(token))
            .map(|entry| entry.user_id)
    }

    /// Consume the old refresh token and issue a new pair for the same
    /// owner. Claiming the old entry is a single atomic map operation, so
    /// two racing rotations of one token produce at most one child.
    pub fn rotate_refresh_token(
        &self,
        old_token: &str,
        identity: &Identity,
    ) -> Result<TokenResponse, ServiceError> {
        let entry = self
            .store
            .take_refresh_for_owner(&hash_token(old_token), &identity.id)
            .ok_or_else(invalid_credentials)?;

        // Claimed but already past expiry: the lazy delete just happened
        // here instead of in a lookup.
        if entry.is_expired() {
            return Err(invalid_credentials());
        }

        self.issue_token_pair(identity)
    }

    /// Mint a single-use token with the TTL of its kind.
    pub fn issue_special_token(
        &self,
        kind: SpecialTokenKind,
        user_id: Option<String>,
        email: String,
        invitation: Option<InvitationDetails>,
    ) -> (String, DateTime<Utc>) {
        let token = generate_opaque_token();
        let expires_at = Utc::now() + kind.ttl();
        self.store.insert_special(
            hash_token(&token),
            SpecialTokenEntry::new(kind, user_id, email, invitation, expires_at),
        );
        (token, expires_at)
    }

    /// Read-only validity check; repeatable while the token is live.
    pub fn peek_special_token(
        &self,
        token: &str,
        kind: SpecialTokenKind,
    ) -> Option<SpecialTokenEntry> {
        self.store.peek_special(&hash_token(token), kind)
    }

    /// Redeem a single-use token. The entry is removed whether or not the
    /// caller proceeds to act on the payload.
    pub fn consume_special_token(
        &self,
        token: &str,
        kind: SpecialTokenKind,
    ) -> Option<SpecialTokenEntry> {
        self.store.take_special(&hash_token(token), kind)
    }

    /// Drop every server-tracked token the user owns (password change,
    /// logout everywhere). Access tokens already in the wild survive to
    /// their natural expiry.
    pub fn revoke_all_for_user(&self, user_id: &str) -> (usize, usize) {
        let (refresh, special) = self.store.revoke_user(user_id);
        tracing::info!(
            user_id = %user_id,
            refresh_revoked = refresh,
            special_revoked = special,
            "Revoked all server-tracked tokens for user"
        );
        (refresh, special)
    }

    /// Drop pending invitations for an address once one is consumed, so a
    /// stale duplicate can never be redeemed later.
    pub fn revoke_invitations_for_email(&self, email: &str) -> usize {
        self.store.revoke_invitations_for_email(email)
    }

    /// Purge expired entries from both collections.
    pub fn sweep_expired(&self) -> (usize, usize) {
        self.store.sweep_expired()
    }
}

/// 32 bytes of entropy, hex-encoded. Opaque by contract: callers must
/// treat these as bearer secrets, never decode them.
fn generate_opaque_token() -> String {
    let mut rng = rand::thread_rng();
    let token_bytes: [u8; 32] = rng.gen();
    hex::encode(token_bytes)
}
