use axum::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use std::time::Duration;

use crate::services::ServiceError;

/// Outbound mail. Delivery is an external collaborator: the token core
/// only hands tokens to this trait and never depends on the outcome
/// beyond surfacing send failures.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_verification_email(
        &self,
        to_email: &str,
        verification_token: &str,
        base_url: &str,
    ) -> Result<(), ServiceError>;

    async fn send_password_reset_email(
        &self,
        to_email: &str,
        reset_token: &str,
        base_url: &str,
    ) -> Result<(), ServiceError>;

    async fn send_invitation_email(
        &self,
        to_email: &str,
        invitation_token: &str,
        inviter_name: &str,
        base_url: &str,
    ) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_address: String,
}

impl EmailService {
    pub fn new(config: &crate::config::SmtpConfig) -> Result<Self, ServiceError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.relay)
            .map_err(|e| ServiceError::Config(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(relay = %config.relay, "Email service initialized");

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
    ) -> Result<(), ServiceError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e: lettre::address::AddressError| {
                        ServiceError::Internal(e.into())
                    })?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| ServiceError::Internal(e.into()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(plain_body.to_string())?;

        // SMTP transport is blocking; keep it off the async runtime.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send email");
                Err(ServiceError::Email(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send_verification_email(
        &self,
        to_email: &str,
        verification_token: &str,
        base_url: &str,
    ) -> Result<(), ServiceError> {
        let link = format!("{}/auth/verify?token={}", base_url, verification_token);
        let body = format!(
            "Welcome to the campus platform!\n\n\
             Please visit the following link to verify your email address:\n\n{}\n\n\
             This link will expire in 24 hours. If you didn't register, ignore this email.",
            link
        );
        self.send_email(to_email, "Verify Your Email Address", &body)
            .await
    }

    async fn send_password_reset_email(
        &self,
        to_email: &str,
        reset_token: &str,
        base_url: &str,
    ) -> Result<(), ServiceError> {
        let link = format!(
            "{}/auth/password-reset/confirm?token={}",
            base_url, reset_token
        );
        let body = format!(
            "We received a request to reset your password.\n\n\
             Visit the following link to set a new password:\n\n{}\n\n\
             This link will expire in 15 minutes. If you didn't request this, ignore this email.",
            link
        );
        self.send_email(to_email, "Reset Your Password", &body).await
    }

    async fn send_invitation_email(
        &self,
        to_email: &str,
        invitation_token: &str,
        inviter_name: &str,
        base_url: &str,
    ) -> Result<(), ServiceError> {
        let link = format!(
            "{}/auth/invitations/accept?token={}",
            base_url, invitation_token
        );
        let body = format!(
            "{} invited you to join their organization on the campus platform.\n\n\
             Visit the following link to accept the invitation and create your account:\n\n{}\n\n\
             This invitation expires in 7 days.",
            inviter_name, link
        );
        self.send_email(to_email, "You've Been Invited", &body).await
    }
}

/// No-op provider for tests and local development.
#[derive(Clone)]
pub struct MockEmailService;

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_verification_email(
        &self,
        _to_email: &str,
        _verification_token: &str,
        _base_url: &str,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        _to_email: &str,
        _reset_token: &str,
        _base_url: &str,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn send_invitation_email(
        &self,
        _to_email: &str,
        _invitation_token: &str,
        _inviter_name: &str,
        _base_url: &str,
    ) -> Result<(), ServiceError> {
        Ok(())
    }
}
