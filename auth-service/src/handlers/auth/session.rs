use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::auth::{LoginRequest, RefreshRequest},
    middleware::AuthUser,
    services::ServiceError,
    utils::ValidatedJson,
    AppState,
};

/// Login with email and password.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let res = state.auth.login(req).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Rotate a refresh token into a fresh pair.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let res = state.auth.refresh(&req.refresh_token).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Logout everywhere: revokes every server-tracked token of the caller.
/// The current access token stays valid until its natural expiry.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.auth.logout(&user.0.sub).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Logged out successfully"
        })),
    ))
}
