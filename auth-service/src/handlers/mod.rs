pub mod auth;
pub mod authz;
pub mod invitation;
pub mod user;
