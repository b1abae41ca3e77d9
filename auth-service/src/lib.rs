pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::services::{AuthService, ServiceError, TokenService, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<UserStore>,
    pub tokens: TokenService,
    pub auth: AuthService,
}

/// Initialize tracing with an env-filter seeded from the configured
/// level. `RUST_LOG` overrides when set. Call once per process.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn build_router(state: AppState) -> Router {
    // Routes behind bearer authentication. Scoped authorization is
    // decided inside each handler against its declared policy.
    let protected = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/auth/invitations",
            post(handlers::invitation::create_invitation),
        )
        .route("/authz/check", post(handlers::authz::check))
        .route("/users/me", get(handlers::user::get_me))
        .route("/users/me/password", post(handlers::user::change_password))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/verify", get(handlers::auth::verify_email))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/auth/password-reset/request",
            post(handlers::auth::request_password_reset),
        )
        .route(
            "/auth/password-reset/confirm",
            post(handlers::auth::confirm_password_reset),
        )
        .route(
            "/auth/invitations/validate",
            get(handlers::invitation::validate_invitation),
        )
        .route(
            "/auth/invitations/accept",
            post(handlers::invitation::accept_invitation),
        )
        .merge(protected)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|o| o.parse::<HeaderValue>().ok())
                        .collect::<Vec<HeaderValue>>(),
                )
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service liveness.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    })))
}
