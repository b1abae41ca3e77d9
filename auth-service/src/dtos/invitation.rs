use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Organization the invitee will join. Defaults to the inviter's own.
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvitationCreatedResponse {
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateInvitationQuery {
    pub token: String,
}

/// Read-only preview returned while an invitation is still pending.
#[derive(Debug, Serialize)]
pub struct InvitationPreview {
    pub email: String,
    pub inviter_name: String,
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInvitationRequest {
    pub token: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
}
