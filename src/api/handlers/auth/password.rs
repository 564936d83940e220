//! Password hashing and verification.
//!
//! Digests are salted bcrypt. Plaintext passwords exist only in the request
//! scope; they are never persisted or logged.

use anyhow::{Context, Result};

/// Hash a plaintext password into a salted, algorithm-tagged digest.
///
/// # Errors
/// Returns an error if the hashing backend fails.
pub fn hash(plaintext: &str) -> Result<String> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST).context("failed to hash password")
}

/// Verify a plaintext password against a stored digest.
///
/// # Errors
/// Returns an error if the digest is not a valid bcrypt string.
pub fn verify(plaintext: &str, digest: &str) -> Result<bool> {
    bcrypt::verify(plaintext, digest).context("failed to verify password")
}
