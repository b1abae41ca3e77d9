//! Session flows: the thin orchestration layer over the token core.
//!
//! Combines the user directory, the email collaborator, and the token
//! service. All the hard invariants live below in `TokenService` and
//! `TokenStore`; this layer only sequences them.

use std::sync::Arc;

use crate::dtos::auth::{
    ChangePasswordRequest, LoginRequest, PasswordResetConfirm, RegisterRequest, RegisterResponse,
};
use crate::dtos::invitation::{
    AcceptInvitationRequest, CreateInvitationRequest, InvitationCreatedResponse, InvitationPreview,
};
use crate::models::{Identity, InvitationDetails, SpecialTokenKind, User};
use crate::services::{
    error::{invalid_credentials, invalid_token},
    AccessTokenClaims, EmailProvider, ServiceError, TokenResponse, TokenService, UserStore,
};
use crate::utils::{hash_password, verify_password, Password};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<UserStore>,
    email: Arc<dyn EmailProvider>,
    tokens: TokenService,
    public_base_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<UserStore>,
        email: Arc<dyn EmailProvider>,
        tokens: TokenService,
        public_base_url: String,
    ) -> Self {
        Self {
            users,
            email,
            tokens,
            public_base_url,
        }
    }

    /// Create an account and mail a 24-hour verification token.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, ServiceError> {
        let password_hash = hash_password(&Password::new(req.password))?;
        let user = User::new(
            req.email.to_lowercase(),
            password_hash.into_string(),
            req.first_name,
            req.last_name,
        );
        let user_id = user.id.clone();
        let user_email = user.email.clone();
        self.users.create(user)?;

        let (token, _) = self.tokens.issue_special_token(
            SpecialTokenKind::EmailVerification,
            Some(user_id.clone()),
            user_email.clone(),
            None,
        );
        self.email
            .send_verification_email(&user_email, &token, &self.public_base_url)
            .await?;

        tracing::info!(user_id = %user_id, "User registered");

        Ok(RegisterResponse {
            user_id,
            message: "Registration successful. Please check your email to verify your account."
                .to_string(),
        })
    }

    /// Redeem an email-verification token.
    pub async fn verify_email(&self, token: &str) -> Result<(), ServiceError> {
        let payload = self
            .tokens
            .consume_special_token(token, SpecialTokenKind::EmailVerification)
            .ok_or_else(invalid_token)?;

        let user_id = payload
            .user_id
            .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("Verification token without owner")))?;
        self.users.mark_verified(&user_id)?;

        tracing::info!(user_id = %user_id, "Email verified");
        Ok(())
    }

    /// Password sign-in. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, ServiceError> {
        let user = self
            .users
            .find_by_email(&req.email)
            .ok_or_else(invalid_credentials)?;

        if !verify_password(&Password::new(req.password), &user.password_hash) {
            return Err(invalid_credentials());
        }

        if !user.verified {
            return Err(ServiceError::Forbidden(anyhow::anyhow!(
                "Email not verified"
            )));
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.tokens.issue_token_pair(&Identity::from(&user))
    }

    /// Rotate a refresh token, re-embedding fresh claims from the user
    /// directory. The old token is dead after this, success or not being
    /// decided by the atomic claim inside the token service.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ServiceError> {
        let owner_id = self
            .tokens
            .validate_refresh_token(refresh_token)
            .ok_or_else(invalid_credentials)?;

        let user = self
            .users
            .find_by_id(&owner_id)
            .ok_or_else(invalid_credentials)?;

        self.tokens
            .rotate_refresh_token(refresh_token, &Identity::from(&user))
    }

    /// Logout everywhere: drop every server-tracked token for the caller.
    pub async fn logout(&self, user_id: &str) -> Result<(), ServiceError> {
        self.tokens.revoke_all_for_user(user_id);
        Ok(())
    }

    /// Issue a 15-minute reset token when the account exists. Always
    /// reports success so the endpoint is not an account-existence oracle.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        let Some(user) = self.users.find_by_email(email) else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let (token, _) = self.tokens.issue_special_token(
            SpecialTokenKind::PasswordReset,
            Some(user.id.clone()),
            user.email.clone(),
            None,
        );
        self.email
            .send_password_reset_email(&user.email, &token, &self.public_base_url)
            .await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(())
    }

    /// Redeem a reset token, set the new password, and revoke every live
    /// session of the user.
    pub async fn confirm_password_reset(
        &self,
        req: PasswordResetConfirm,
    ) -> Result<(), ServiceError> {
        let payload = self
            .tokens
            .consume_special_token(&req.token, SpecialTokenKind::PasswordReset)
            .ok_or_else(invalid_token)?;

        let user_id = payload
            .user_id
            .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("Reset token without owner")))?;

        let password_hash = hash_password(&Password::new(req.new_password))?;
        self.users
            .set_password_hash(&user_id, password_hash.into_string())?;
        self.tokens.revoke_all_for_user(&user_id);

        tracing::info!(user_id = %user_id, "Password reset completed");
        Ok(())
    }

    /// Authenticated password change; also a global revoke.
    pub async fn change_password(
        &self,
        user_id: &str,
        req: ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        let user = self
            .users
            .find_by_id(user_id)
            .ok_or_else(invalid_credentials)?;

        if !verify_password(&Password::new(req.current_password), &user.password_hash) {
            return Err(invalid_credentials());
        }

        let password_hash = hash_password(&Password::new(req.new_password))?;
        self.users
            .set_password_hash(user_id, password_hash.into_string())?;
        self.tokens.revoke_all_for_user(user_id);

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Issue a 7-day invitation carrying the inviter's identity and the
    /// org/branch the invitee will join. Authorization is decided by the
    /// calling handler before this runs.
    pub async fn create_invitation(
        &self,
        inviter: &AccessTokenClaims,
        req: CreateInvitationRequest,
    ) -> Result<InvitationCreatedResponse, ServiceError> {
        let email = req.email.to_lowercase();
        if self.users.find_by_email(&email).is_some() {
            return Err(ServiceError::Conflict(anyhow::anyhow!(
                "Email already registered"
            )));
        }

        let details = InvitationDetails {
            inviter_user_id: inviter.sub.clone(),
            inviter_name: format!("{} {}", inviter.first_name, inviter.last_name),
            org_id: req.org_id.or_else(|| inviter.org_id.clone()),
            branch_id: req.branch_id,
        };
        let inviter_name = details.inviter_name.clone();

        let (token, expires_at) = self.tokens.issue_special_token(
            SpecialTokenKind::Invitation,
            None,
            email.clone(),
            Some(details),
        );
        self.email
            .send_invitation_email(&email, &token, &inviter_name, &self.public_base_url)
            .await?;

        tracing::info!(inviter = %inviter.sub, "Invitation issued");

        Ok(InvitationCreatedResponse {
            email,
            expires_at,
            message: "Invitation sent".to_string(),
        })
    }

    /// Read-only invitation check; the token stays redeemable.
    pub async fn validate_invitation(&self, token: &str) -> Result<InvitationPreview, ServiceError> {
        let payload = self
            .tokens
            .peek_special_token(token, SpecialTokenKind::Invitation)
            .ok_or_else(invalid_token)?;

        let details = payload
            .invitation
            .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("Invitation token without details")))?;

        Ok(InvitationPreview {
            email: payload.email,
            inviter_name: details.inviter_name,
            org_id: details.org_id,
            branch_id: details.branch_id,
            expires_at: payload.expires_at,
        })
    }

    /// Redeem an invitation: burn it, drop any sibling invitations for
    /// the same address, create the account bound to the invited
    /// org/branch, and open a session.
    pub async fn accept_invitation(
        &self,
        req: AcceptInvitationRequest,
    ) -> Result<TokenResponse, ServiceError> {
        let payload = self
            .tokens
            .consume_special_token(&req.token, SpecialTokenKind::Invitation)
            .ok_or_else(invalid_token)?;

        let details = payload
            .invitation
            .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("Invitation token without details")))?;

        self.tokens.revoke_invitations_for_email(&payload.email);

        let password_hash = hash_password(&Password::new(req.password))?;
        let mut user = User::new(
            payload.email,
            password_hash.into_string(),
            req.first_name,
            req.last_name,
        );
        user.org_id = details.org_id;
        user.branch_id = details.branch_id;
        // Redeeming the emailed token is proof of address ownership.
        user.verified = true;

        let identity = Identity::from(&user);
        self.users.create(user)?;

        tracing::info!(user_id = %identity.id, inviter = %details.inviter_user_id, "Invitation accepted");
        self.tokens.issue_token_pair(&identity)
    }
}
