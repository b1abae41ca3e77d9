use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;

use auth_service::{
    build_router,
    config::Config,
    init_tracing,
    services::{AuthService, EmailService, JwtService, TokenService, TokenStore, UserStore},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), auth_service::services::ServiceError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = Config::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting token and access-control service"
    );

    // Signing keys are loaded once; misconfiguration stops startup here.
    let jwt = JwtService::new(&config.jwt)?;

    let store = Arc::new(TokenStore::new());
    let tokens = TokenService::new(jwt, store, config.jwt.refresh_token_expiry_days);

    let email = Arc::new(EmailService::new(&config.smtp)?);
    let users = Arc::new(UserStore::new());

    let auth = AuthService::new(
        users.clone(),
        email,
        tokens.clone(),
        config.public_base_url.clone(),
    );

    let state = AppState {
        config: config.clone(),
        users,
        tokens: tokens.clone(),
        auth,
    };

    // Periodic sweep of expired refresh/special tokens. Lazy expiry
    // already hides expired entries; this reclaims the memory.
    let sweep_interval = Duration::from_secs(config.sweep_interval_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        // First tick fires immediately; skip it.
        interval.tick().await;
        loop {
            interval.tick().await;
            let (refresh, special) = tokens.sweep_expired();
            if refresh > 0 || special > 0 {
                tracing::debug!(
                    refresh_purged = refresh,
                    special_purged = special,
                    "Swept expired tokens"
                );
            }
        }
    });

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
