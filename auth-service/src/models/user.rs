use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// User account backing the user-lookup contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            first_name,
            last_name,
            role: Role::User,
            org_id: None,
            branch_id: None,
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User projection safe to return to clients (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for SanitizedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            org_id: user.org_id.clone(),
            branch_id: user.branch_id.clone(),
            verified: user.verified,
            created_at: user.created_at,
        }
    }
}

/// Identity embedded into signed access tokens.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            org_id: user.org_id.clone(),
            branch_id: user.branch_id.clone(),
        }
    }
}
