use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    services::{AccessTokenClaims, ServiceError},
    AppState,
};

/// Require a valid bearer access token.
///
/// Verified claims land in request extensions for handlers. Everything
/// past this layer deals with 403-style authorization only; the 401
/// cases (missing, malformed, expired, bad signature) end here.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            ServiceError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let claims = state
        .tokens
        .verify_access_token(token)
        .map_err(|_| ServiceError::Unauthorized(anyhow::anyhow!("Invalid or expired token")))?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extractor for the verified claims of the calling user.
pub struct AuthUser(pub AccessTokenClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<AccessTokenClaims>().ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!("Auth claims missing from request extensions"))
        })?;

        Ok(AuthUser(claims.clone()))
    }
}
