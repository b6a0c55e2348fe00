//! HS256 bearer tokens.

use super::{AuthError, GoogleIdentity};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Regular authenticated session.
    Session,
    /// Short-lived token bridging Google sign-in and account completion.
    GoogleSignup,
}

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id for sessions, Google subject for signup tokens.
    pub sub: String,
    /// Email address.
    pub email: String,
    /// Display name, carried by signup tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Intended use.
    pub purpose: TokenPurpose,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// Parses the subject as a user id.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidToken`] if the subject is not numeric.
    pub fn user_id(&self) -> Result<i32, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))
    }
}

/// Issues and verifies signed tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl: Duration,
    signup_ttl: Duration,
}

impl TokenService {
    /// Creates a token service.
    #[must_use]
    pub fn new(secret: &str, session_ttl: Duration, signup_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            session_ttl,
            signup_ttl,
        }
    }

    /// Issues a session token for a user.
    ///
    /// # Errors
    /// Returns [`AuthError::Signing`] if encoding fails.
    pub fn issue_session(&self, user_id: i32, email: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        self.sign(&Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: None,
            purpose: TokenPurpose::Session,
            iat: now,
            exp: now + self.session_ttl.as_secs() as i64,
        })
    }

    /// Issues the temporary token handed out when a Google user has no account yet.
    ///
    /// # Errors
    /// Returns [`AuthError::Signing`] if encoding fails.
    pub fn issue_signup(&self, identity: &GoogleIdentity) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        self.sign(&Claims {
            sub: identity.sub.clone(),
            email: identity.email.clone(),
            name: Some(identity.name.clone()),
            purpose: TokenPurpose::GoogleSignup,
            iat: now,
            exp: now + self.signup_ttl.as_secs() as i64,
        })
    }

    /// Verifies signature and expiry and checks the token purpose.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidToken`] or [`AuthError::WrongPurpose`].
    pub fn verify(&self, token: &str, expected: TokenPurpose) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::InvalidToken("token expired".to_string()),
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        if data.claims.purpose != expected {
            return Err(AuthError::WrongPurpose);
        }

        Ok(data.claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            "test-secret",
            Duration::from_secs(3600),
            Duration::from_secs(900),
        )
    }

    #[test]
    fn test_session_token_roundtrip() {
        let tokens = service();
        let token = tokens.issue_session(42, "ada@example.com").expect("issue");

        let claims = tokens.verify(&token, TokenPurpose::Session).expect("verify");
        assert_eq!(claims.user_id().expect("numeric sub"), 42);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(claims.name.is_none());
    }

    #[test]
    fn test_signup_token_not_accepted_as_session() {
        let tokens = service();
        let identity = GoogleIdentity {
            sub: "google-123".to_string(),
            email: "grace@example.com".to_string(),
            name: "Grace".to_string(),
        };
        let token = tokens.issue_signup(&identity).expect("issue");

        assert!(matches!(
            tokens.verify(&token, TokenPurpose::Session),
            Err(AuthError::WrongPurpose)
        ));

        let claims = tokens
            .verify(&token, TokenPurpose::GoogleSignup)
            .expect("verify");
        assert_eq!(claims.sub, "google-123");
        assert_eq!(claims.name.as_deref(), Some("Grace"));
        assert_eq!(claims.exp - claims.iat, 900);
        assert!(claims.user_id().is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let token = tokens
            .sign(&Claims {
                sub: "1".to_string(),
                email: "old@example.com".to_string(),
                name: None,
                purpose: TokenPurpose::Session,
                iat: now - 7200,
                exp: now - 3600,
            })
            .expect("sign");

        assert!(matches!(
            tokens.verify(&token, TokenPurpose::Session),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = service().issue_session(1, "a@example.com").expect("issue");
        let other = TokenService::new(
            "another-secret",
            Duration::from_secs(3600),
            Duration::from_secs(900),
        );

        assert!(matches!(
            other.verify(&token, TokenPurpose::Session),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(service().verify("not.a.jwt", TokenPurpose::Session).is_err());
    }
}
