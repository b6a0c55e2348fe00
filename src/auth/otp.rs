//! One-time password reset codes.

use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use thiserror::Error;

/// Reasons a reset code is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    /// No code outstanding for this email.
    #[error("No OTP requested for this email")]
    NotRequested,
    /// Code lifetime elapsed.
    #[error("OTP has expired")]
    Expired,
    /// Attempt budget spent.
    #[error("Too many attempts, request a new OTP")]
    TooManyAttempts,
    /// Wrong code.
    #[error("Invalid OTP")]
    Mismatch,
}

/// Generates a zero-padded six digit code.
#[must_use]
pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

/// Hashes a code, salted with the lower-cased email it was issued to.
#[must_use]
pub fn hash_otp(email: &str, otp: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    hasher.update(b":");
    hasher.update(otp.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stored reset code.
#[derive(Debug, Clone, FromRow)]
pub struct OtpRecord {
    /// SHA-256 of email and code.
    pub otp_hash: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Failed guesses so far.
    pub attempts: i32,
}

impl OtpRecord {
    /// Checks a candidate code.
    ///
    /// # Errors
    /// Returns the first failing condition: attempt budget, expiry, mismatch.
    pub fn check(
        &self,
        email: &str,
        candidate: &str,
        now: DateTime<Utc>,
        max_attempts: i32,
    ) -> Result<(), OtpError> {
        if self.attempts >= max_attempts {
            return Err(OtpError::TooManyAttempts);
        }
        if now >= self.expires_at {
            return Err(OtpError::Expired);
        }
        let candidate_hash = hash_otp(email, candidate);
        if !constant_time_eq(candidate_hash.as_bytes(), self.otp_hash.as_bytes()) {
            return Err(OtpError::Mismatch);
        }
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
