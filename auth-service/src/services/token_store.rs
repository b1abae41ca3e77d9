use chrono::Utc;
use dashmap::DashMap;

use crate::models::{RefreshTokenEntry, SpecialTokenEntry, SpecialTokenKind};

/// Process-local credential store for server-tracked tokens.
///
/// Keys are SHA-256 hashes of the opaque bearer strings. Each operation
/// is a single atomic map operation; `remove`/`remove_if` on a key is
/// the critical section that makes refresh rotation race-safe. Expired
/// entries are deleted on detection (lazy expiry) in addition to the
/// periodic sweep.
///
/// The store is unreplicated and lives in process memory: every tracked
/// token dies on restart. That is the accepted trade-off, not a bug.
#[derive(Debug, Default)]
pub struct TokenStore {
    refresh: DashMap<String, RefreshTokenEntry>,
    special: DashMap<String, SpecialTokenEntry>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_refresh(&self, key: String, entry: RefreshTokenEntry) {
        self.refresh.insert(key, entry);
    }

    /// Look up a refresh entry, deleting it when found expired.
    pub fn get_valid_refresh(&self, key: &str) -> Option<RefreshTokenEntry> {
        let entry = self.refresh.get(key).map(|e| e.clone())?;
        if entry.is_expired() {
            self.refresh.remove_if(key, |_, e| e.is_expired());
            return None;
        }
        Some(entry)
    }

    /// Atomically claim a refresh entry whose owner matches.
    ///
    /// At most one of N concurrent callers gets the entry; the losers see
    /// `None`. An owner mismatch leaves the entry in place so a guessed
    /// token cannot burn somebody else's session.
    pub fn take_refresh_for_owner(&self, key: &str, owner_id: &str) -> Option<RefreshTokenEntry> {
        self.refresh
            .remove_if(key, |_, e| e.user_id == owner_id)
            .map(|(_, entry)| entry)
    }

    pub fn insert_special(&self, key: String, entry: SpecialTokenEntry) {
        self.special.insert(key, entry);
    }

    /// Read a special entry without consuming it. Kind is checked on
    /// every read; a mismatch reads as absent but leaves the entry alone.
    pub fn peek_special(&self, key: &str, kind: SpecialTokenKind) -> Option<SpecialTokenEntry> {
        let entry = self.special.get(key).map(|e| e.clone())?;
        if entry.is_expired() {
            self.special.remove_if(key, |_, e| e.is_expired());
            return None;
        }
        if entry.kind != kind {
            return None;
        }
        Some(entry)
    }

    /// Unconditionally remove a special entry, returning it only when it
    /// was still live and of the expected kind. The entry is gone either
    /// way: consumption is single-use by contract.
    pub fn take_special(&self, key: &str, kind: SpecialTokenKind) -> Option<SpecialTokenEntry> {
        let (_, entry) = self.special.remove(key)?;
        if entry.is_expired() || entry.kind != kind {
            return None;
        }
        Some(entry)
    }

    /// Delete every refresh and special entry owned by the user.
    /// Returns (refresh, special) deletion counts.
    pub fn revoke_user(&self, user_id: &str) -> (usize, usize) {
        let refresh_before = self.refresh.len();
        self.refresh.retain(|_, e| e.user_id != user_id);
        let special_before = self.special.len();
        self.special
            .retain(|_, e| e.user_id.as_deref() != Some(user_id));
        (
            refresh_before - self.refresh.len(),
            special_before - self.special.len(),
        )
    }

    /// Delete all pending invitation entries issued for an email address.
    pub fn revoke_invitations_for_email(&self, email: &str) -> usize {
        let before = self.special.len();
        self.special
            .retain(|_, e| !(e.kind == SpecialTokenKind::Invitation && e.email == email));
        before - self.special.len()
    }

    /// Purge entries whose expiry has passed at read time. Idempotent and
    /// safe to run concurrently with any other operation. Returns
    /// (refresh, special) deletion counts.
    pub fn sweep_expired(&self) -> (usize, usize) {
        let now = Utc::now();
        let refresh_before = self.refresh.len();
        self.refresh.retain(|_, e| e.expires_at >= now);
        let special_before = self.special.len();
        self.special.retain(|_, e| e.expires_at >= now);
        (
            refresh_before - self.refresh.len(),
            special_before - self.special.len(),
        )
    }
}
