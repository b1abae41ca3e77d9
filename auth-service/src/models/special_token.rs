use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Purpose of a single-use token. Checked on every read so a token
/// issued for one flow can never be redeemed in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialTokenKind {
    PasswordReset,
    EmailVerification,
    Invitation,
}

impl SpecialTokenKind {
    /// Time-to-live for tokens of this kind.
    pub fn ttl(&self) -> Duration {
        match self {
            SpecialTokenKind::PasswordReset => Duration::minutes(15),
            SpecialTokenKind::EmailVerification => Duration::hours(24),
            SpecialTokenKind::Invitation => Duration::days(7),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialTokenKind::PasswordReset => "password_reset",
            SpecialTokenKind::EmailVerification => "email_verification",
            SpecialTokenKind::Invitation => "invitation",
        }
    }
}

/// Extra payload carried by invitation tokens.
#[derive(Debug, Clone)]
pub struct InvitationDetails {
    pub inviter_user_id: String,
    pub inviter_name: String,
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
}

/// Server-side record for a single-use token, keyed by SHA-256 hash of
/// the bearer string.
#[derive(Debug, Clone)]
pub struct SpecialTokenEntry {
    /// Owner, when known at issue time. Invitations have no owner until
    /// the invited user is created on acceptance.
    pub user_id: Option<String>,
    /// Address the token was issued for.
    pub email: String,
    pub kind: SpecialTokenKind,
    pub invitation: Option<InvitationDetails>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SpecialTokenEntry {
    pub fn new(
        kind: SpecialTokenKind,
        user_id: Option<String>,
        email: String,
        invitation: Option<InvitationDetails>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            email,
            kind,
            invitation,
            created_at: Utc::now(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ttls() {
        assert_eq!(SpecialTokenKind::PasswordReset.ttl(), Duration::minutes(15));
        assert_eq!(SpecialTokenKind::EmailVerification.ttl(), Duration::hours(24));
        assert_eq!(SpecialTokenKind::Invitation.ttl(), Duration::days(7));
    }

    #[test]
    fn test_entry_expiry() {
        let entry = SpecialTokenEntry::new(
            SpecialTokenKind::PasswordReset,
            Some("user_1".to_string()),
            "user@example.com".to_string(),
            None,
            Utc::now() - Duration::seconds(1),
        );
        assert!(entry.is_expired());
    }
}
