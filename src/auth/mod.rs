//! Authentication: password hashing, signed bearer tokens, password reset
//! codes and Google ID token verification.

mod google;
mod otp;
mod password;
mod token;

pub use google::{GoogleIdentity, GoogleVerifier, TokenInfo, validate_token_info};
pub use otp::{OtpError, OtpRecord, generate_otp, hash_otp};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenPurpose, TokenService};

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token failed signature, expiry or format checks.
    #[error("Invalid or expired token")]
    InvalidToken(String),

    /// Token is valid but was issued for a different flow.
    #[error("Token cannot be used for this operation")]
    WrongPurpose,

    /// Identifier or password did not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password reset code rejected.
    #[error(transparent)]
    Otp(#[from] OtpError),

    /// No Google client id configured.
    #[error("Google sign-in is not configured")]
    GoogleNotConfigured,

    /// Google refused the ID token or its claims did not check out.
    #[error("Google token rejected: {0}")]
    GoogleRejected(String),

    /// Google tokeninfo endpoint unreachable or returned garbage.
    #[error("Google verification failed: {0}")]
    GoogleUnavailable(String),

    /// bcrypt failure.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Token encoding failure.
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Authenticated caller, attached to request extensions by the bearer
/// middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User id.
    pub id: i32,
    /// Email at the time the token was issued.
    pub email: String,
}
