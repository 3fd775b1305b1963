//! Authentication module entry point.
//!
//! Password hashing, purpose-scoped JWTs and the axum middleware that resolves
//! a bearer token into an [`AuthenticatedAccount`].

pub mod hashing;
pub mod jwt;
pub mod middleware;

pub use hashing::{Argon2Hasher, CredentialHasher, HashError};
pub use jwt::{Claims, JwtTokenService, TokenError, TokenPurpose, TokenService};
pub use middleware::{bearer_token, AuthenticatedAccount};
