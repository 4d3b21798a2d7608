//! Credential hashing for ChatZone.
//!
//! Admin and moderator credentials are stored as Argon2id PHC strings.
//! Verification is still an exact match on the plaintext.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use rand_core::OsRng;
use thiserror::Error;

/// Maximum credential length.
pub const MAX_CREDENTIAL_LENGTH: usize = 128;

/// Credential-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Credential is empty.
    #[error("credential must not be empty")]
    Empty,

    /// Credential is too long.
    #[error("credential must be at most {MAX_CREDENTIAL_LENGTH} characters")]
    TooLong,

    /// Hashing failed.
    #[error("credential hashing failed: {0}")]
    HashError(String),

    /// Stored hash is not a valid PHC string.
    #[error("invalid credential hash format")]
    InvalidHash,

    /// Credential does not match.
    #[error("credential verification failed")]
    VerificationFailed,
}

/// Argon2id with 19 MiB memory, 2 iterations, 1 lane.
fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params =
        Params::new(19 * 1024, 2, 1, None).map_err(|e| PasswordError::HashError(e.to_string()))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Validate credential requirements.
///
/// # Examples
///
/// ```
/// use chatzone::auth::validate_credential;
///
/// assert!(validate_credential("").is_err());
/// assert!(validate_credential("pw").is_ok());
/// ```
pub fn validate_credential(credential: &str) -> Result<(), PasswordError> {
    if credential.is_empty() {
        return Err(PasswordError::Empty);
    }
    if credential.chars().count() > MAX_CREDENTIAL_LENGTH {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}

/// Hash a credential using Argon2id.
///
/// # Examples
///
/// ```
/// use chatzone::auth::hash_credential;
///
/// let hash = hash_credential("pw").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_credential(credential: &str) -> Result<String, PasswordError> {
    validate_credential(credential)?;

    let salt = SaltString::generate(&mut OsRng);
    let hash = create_argon2()?
        .hash_password(credential.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a credential against a stored hash.
pub fn verify_credential(credential: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    // Parameters come from the parsed hash
    Argon2::default()
        .verify_password(credential.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::VerificationFailed)
}
