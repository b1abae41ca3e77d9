use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::{
    middleware::AuthUser,
    models::Role,
    services::{authz, AccessPolicy, AccessTarget, ScopeRule, ServiceError},
    AppState,
};

/// A policy check phrased as a request, for collaborating services that
/// want the same decision this service applies to its own routes.
#[derive(Debug, Deserialize)]
pub struct AuthzCheckRequest {
    pub required_roles: Vec<Role>,
    pub allow_cross_org: Option<bool>,
    pub allow_cross_branch: Option<bool>,
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthzCheckResponse {
    pub allowed: bool,
}

/// Evaluate the caller's claims against a declared policy and target.
/// Always 200; the decision is the payload, not the status.
pub async fn check(
    State(_state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AuthzCheckRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    // Scope is declared as soon as either flag is present; both default
    // to the restrictive setting.
    let scope = match (req.allow_cross_org, req.allow_cross_branch) {
        (None, None) => None,
        (cross_org, cross_branch) => Some(ScopeRule {
            allow_cross_org: cross_org.unwrap_or(false),
            allow_cross_branch: cross_branch.unwrap_or(false),
        }),
    };
    let policy = AccessPolicy {
        roles: req.required_roles,
        scope,
    };
    let target = AccessTarget {
        org_id: req.org_id,
        branch_id: req.branch_id,
    };

    let allowed = authz::decide(&user.0, Some(&policy), &target);
    Ok((StatusCode::OK, Json(AuthzCheckResponse { allowed })))
}
