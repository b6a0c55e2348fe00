//! bcrypt password hashing, run off the async executor.

use super::AuthError;

/// Hashes a password with the given bcrypt cost.
///
/// # Errors
/// Returns [`AuthError::Hashing`] if bcrypt fails or the worker panics.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Checks a password against a stored bcrypt hash.
///
/// # Errors
/// Returns [`AuthError::Hashing`] if the stored hash is malformed.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}
