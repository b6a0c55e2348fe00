//! Google ID token verification through the tokeninfo endpoint.

use super::AuthError;
use serde::Deserialize;
use std::time::Duration;

/// Claims returned by the tokeninfo endpoint (only the ones we read).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    /// Audience (OAuth client id).
    pub aud: String,
    /// Stable Google account id.
    pub sub: String,
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
    /// Either `"true"`/`"false"` or a JSON boolean.
    #[serde(default)]
    pub email_verified: Option<serde_json::Value>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

impl TokenInfo {
    fn email_verified(&self) -> bool {
        match &self.email_verified {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

/// Verified Google identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    /// Google subject.
    pub sub: String,
    /// Verified email.
    pub email: String,
    /// Display name, falling back to the email local part.
    pub name: String,
}

/// Validates tokeninfo claims against the configured client id.
///
/// # Errors
/// Returns [`AuthError::GoogleRejected`] on audience mismatch or missing/unverified email.
pub fn validate_token_info(info: TokenInfo, client_id: &str) -> Result<GoogleIdentity, AuthError> {
    if info.aud != client_id {
        return Err(AuthError::GoogleRejected("audience mismatch".to_string()));
    }
    if !info.email_verified() {
        return Err(AuthError::GoogleRejected("email not verified".to_string()));
    }
    let email = info
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AuthError::GoogleRejected("email missing".to_string()))?
        .to_lowercase();

    let name = info
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    Ok(GoogleIdentity {
        sub: info.sub,
        email,
        name,
    })
}

/// Verifies Google ID tokens.
#[derive(Debug, Clone)]
pub struct GoogleVerifier {
    client: reqwest::Client,
    tokeninfo_url: String,
    client_id: Option<String>,
}

impl GoogleVerifier {
    /// Creates a verifier. Without a client id every verification fails with
    /// [`AuthError::GoogleNotConfigured`].
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(tokeninfo_url: &str, client_id: Option<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            tokeninfo_url: tokeninfo_url.to_string(),
            client_id,
        })
    }

    /// Returns true when a client id is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some()
    }

    /// Verifies an ID token and returns the identity it asserts.
    ///
    /// # Errors
    /// Returns [`AuthError`] if not configured, rejected, or the provider is unreachable.
    pub async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or(AuthError::GoogleNotConfigured)?;

        let query = serde_urlencoded::to_string([("id_token", id_token)])
            .map_err(|e| AuthError::GoogleUnavailable(e.to_string()))?;
        let url = format!("{}?{}", self.tokeninfo_url, query);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AuthError::GoogleUnavailable(e.to_string()))?;

        let status = resp.status();
        if status.is_client_error() {
            return Err(AuthError::GoogleRejected(format!(
                "provider answered {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(AuthError::GoogleUnavailable(format!(
                "provider answered {}",
                status.as_u16()
            )));
        }

        let info: TokenInfo = resp
            .json()
            .await
            .map_err(|e| AuthError::GoogleUnavailable(e.to_string()))?;

        validate_token_info(info, client_id)
    }
}
