use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fs;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::{Identity, Role};
use crate::services::ServiceError;

/// Signs and verifies stateless access tokens.
///
/// Only access tokens are JWTs; refresh and special tokens are opaque
/// random strings tracked server-side. Key misconfiguration is fatal at
/// construction, never per call.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
}

/// Claims carried inside an access token. Immutable once signed;
/// trusted only if signature and expiry both verify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl JwtService {
    /// Create a new JWT service by loading RSA keys from files.
    pub fn new(config: &JwtConfig) -> Result<Self, ServiceError> {
        let private_key_pem = fs::read_to_string(&config.private_key_path).map_err(|e| {
            ServiceError::Config(anyhow::anyhow!(
                "Failed to read private key from {}: {}",
                config.private_key_path,
                e
            ))
        })?;

        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| ServiceError::Config(anyhow::anyhow!("Failed to parse private key: {}", e)))?;

        let public_key_pem = fs::read_to_string(&config.public_key_path).map_err(|e| {
            ServiceError::Config(anyhow::anyhow!(
                "Failed to read public key from {}: {}",
                config.public_key_path,
                e
            ))
        })?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| ServiceError::Config(anyhow::anyhow!("Failed to parse public key: {}", e)))?;

        tracing::info!("JWT service initialized with RS256 keys");

        Ok(Self {
            encoding_key,
            decoding_key,
            access_token_expiry_minutes: config.access_token_expiry_minutes,
        })
    }

    /// Sign an access token embedding the given identity.
    pub fn sign_access_token(&self, identity: &Identity) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            role: identity.role,
            org_id: identity.org_id.clone(),
            branch_id: identity.branch_id.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::RS256);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to encode access token: {}", e)))
    }

    /// Validate signature and expiry, returning the embedded claims.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, ServiceError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| ServiceError::Unauthorized(anyhow::anyhow!("Invalid access token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// Access token lifetime in seconds (returned to clients).
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }
}
