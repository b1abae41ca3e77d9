//! Services layer: the token & access-control core plus the thin
//! session facade that orchestrates it.

mod auth;
pub mod authz;
mod email;
pub mod error;
mod jwt;
mod token_store;
mod tokens;
mod users;

pub use auth::AuthService;
pub use authz::{decide, AccessPolicy, AccessTarget, ScopeRule};
pub use email::{EmailProvider, EmailService, MockEmailService};
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService};
pub use token_store::TokenStore;
pub use tokens::{TokenResponse, TokenService};
pub use users::UserStore;
