use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::auth::ChangePasswordRequest,
    middleware::AuthUser,
    models::SanitizedUser,
    services::ServiceError,
    utils::ValidatedJson,
    AppState,
};

/// Profile of the calling user.
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let stored = state
        .users
        .find_by_id(&user.0.sub)
        .ok_or_else(|| ServiceError::NotFound(anyhow::anyhow!("User not found")))?;
    Ok((StatusCode::OK, Json(SanitizedUser::from(&stored))))
}

/// Change the caller's password; revokes every live session.
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state.auth.change_password(&user.0.sub, req).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Password changed successfully"
        })),
    ))
}
