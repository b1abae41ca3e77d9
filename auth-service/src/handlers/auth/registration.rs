use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    dtos::auth::{RegisterRequest, VerifyQuery, VerifyResponse},
    services::ServiceError,
    utils::ValidatedJson,
    AppState,
};

/// Register a new account and send the verification email.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let res = state.auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Redeem an email-verification token from the mailed link.
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    state.auth.verify_email(&query.token).await?;
    Ok((
        StatusCode::OK,
        Json(VerifyResponse {
            message: "Email verified successfully".to_string(),
        }),
    ))
}
