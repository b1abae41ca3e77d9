use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    dtos::invitation::{AcceptInvitationRequest, CreateInvitationRequest, ValidateInvitationQuery},
    middleware::AuthUser,
    models::Role,
    services::{authz, AccessPolicy, AccessTarget, ServiceError},
    utils::ValidatedJson,
    AppState,
};

/// Invite a user into an organization. Admins and owners only, within
/// their own organization; any branch of it is a valid target.
pub async fn create_invitation(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateInvitationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let policy = AccessPolicy::cross_branch(vec![Role::Admin, Role::Owner]);
    let target = AccessTarget {
        org_id: req.org_id.clone(),
        branch_id: req.branch_id.clone(),
    };
    if !authz::decide(&user.0, Some(&policy), &target) {
        return Err(ServiceError::Forbidden(anyhow::anyhow!(
            "Not allowed to invite into the requested scope"
        )));
    }

    let res = state.auth.create_invitation(&user.0, req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Read-only invitation check for the acceptance page; the token stays
/// redeemable afterwards.
pub async fn validate_invitation(
    State(state): State<AppState>,
    Query(query): Query<ValidateInvitationQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let res = state.auth.validate_invitation(&query.token).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Redeem an invitation, creating the account and opening a session.
pub async fn accept_invitation(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AcceptInvitationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let res = state.auth.accept_invitation(req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}
