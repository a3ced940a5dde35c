//! # Password Hashing
//!
//! Argon2id hashing of account passwords. Hashing is CPU-bound, so the async
//! wrappers move the work onto the blocking thread pool.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("Hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Hashes a password into a PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verifies a password against a stored PHC string.
///
/// Verification uses the parameters embedded in the hash itself.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "Failed to parse stored password hash");
        PasswordError::MalformedHash(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash of a throwaway password, checked when a login names no account so
/// that unknown and known emails cost the same Argon2 work.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("fundbridge-no-such-account").ok());

/// Spends one verification on [`DUMMY_HASH`]. The outcome is discarded.
pub fn verify_dummy_password(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?
}

pub async fn verify_dummy_password_blocking(password: String) -> Result<(), PasswordError> {
    Ok(tokio::task::spawn_blocking(move || verify_dummy_password(&password)).await?)
}
