//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`),
//! so verification always uses the parameters recorded in the hash rather than
//! the currently configured ones.

use argon2::{
    password_hash::{self, rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use thiserror::Error;

use crate::config::HashingConfig;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("password cannot be empty")]
    EmptyInput,
    #[error("invalid hash format: {0}")]
    MalformedHash(String),
    #[error("failed to hash password: {0}")]
    Hashing(String),
}

/// One-way password hashing capability.
pub trait CredentialHasher: Send + Sync {
    /// Produce a salted hash of `password`.
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// Check `password` against a previously produced hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError>;
}

/// Argon2id hasher with constructor-supplied cost parameters.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(config: &HashingConfig) -> Result<Self, HashError> {
        let params =
            Params::new(config.memory_cost_kib, config.iterations, config.parallelism, None)
                .map_err(|err| HashError::Hashing(format!("invalid Argon2 parameters: {err}")))?;
        Ok(Self { argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) })
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        if password.is_empty() {
            return Err(HashError::EmptyInput);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| HashError::Hashing(err.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| HashError::MalformedHash(err.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(HashError::MalformedHash(err.to_string())),
        }
    }
}
