//! Password hashing with bcrypt at a fixed cost.

use std::sync::OnceLock;

use thiserror::Error;

/// bcrypt work factor. Fixed so verification latency stays predictable.
pub const PASSWORD_HASH_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum PasswordError {
    /// The plaintext does not match the stored digest.
    #[error("Password does not match")]
    Mismatch,
    /// The digest could not be produced or parsed.
    #[error("Password hashing failed: {0}")]
    HashingError(String),
}

impl From<bcrypt::BcryptError> for PasswordError {
    fn from(e: bcrypt::BcryptError) -> Self {
        PasswordError::HashingError(e.to_string())
    }
}

/// Hash a plaintext password into a salted bcrypt digest.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(password, PASSWORD_HASH_COST)?)
}

/// Check a plaintext password against a stored digest.
pub fn verify_password(digest: &str, password: &str) -> Result<(), PasswordError> {
    if bcrypt::verify(password, digest)? {
        Ok(())
    } else {
        Err(PasswordError::Mismatch)
    }
}

/// Run [`hash_password`] on the blocking pool.
pub async fn spawn_hash_password(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::HashingError(e.to_string()))?
}

/// Run [`verify_password`] on the blocking pool.
pub async fn spawn_verify_password(digest: String, password: String) -> Result<(), PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&digest, &password))
        .await
        .map_err(|e| PasswordError::HashingError(e.to_string()))?
}

/// Digest checked against when no stored digest exists.
static DUMMY_DIGEST: OnceLock<String> = OnceLock::new();

/// Spend one bcrypt operation at [`PASSWORD_HASH_COST`] and discard the result.
///
/// Lets a lookup miss take as long as a real password check.
pub fn burn_password_check(password: &str) {
    match DUMMY_DIGEST.get() {
        Some(digest) => {
            let _ = verify_password(digest, password);
        }
        None => {
            if let Ok(digest) = hash_password(password) {
                let _ = DUMMY_DIGEST.set(digest);
            }
        }
    }
}

/// Run [`burn_password_check`] on the blocking pool.
pub async fn spawn_burn_password_check(password: String) {
    if let Err(e) = tokio::task::spawn_blocking(move || burn_password_check(&password)).await {
        tracing::error!(error = %e, "Dummy password check panicked");
    }
}
