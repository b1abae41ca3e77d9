use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::auth::{PasswordResetConfirm, PasswordResetRequest},
    services::ServiceError,
    utils::ValidatedJson,
    AppState,
};

/// Request a password-reset email. Responds 200 whether or not the
/// account exists.
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state.auth.request_password_reset(&req.email).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "If the account exists, a reset email has been sent"
        })),
    ))
}

/// Complete a password reset with the mailed token.
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirm>,
) -> Result<impl IntoResponse, ServiceError> {
    state.auth.confirm_password_reset(req).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Password reset successfully"
        })),
    ))
}
