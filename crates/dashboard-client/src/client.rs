//! HTTP client for the dashboard API.

use crate::error::Error;
use crate::types::*;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;


/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "http://localhost:5001").
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the Fundamentals Dashboard API.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: Url,
}

impl DashboardClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// Creates a new client with default configuration.
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be built.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::new(ClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    /// Builds an endpoint URL from percent-encoded path segments and an optional query.
    pub(crate) fn endpoint<Q: Serialize>(
        &self,
        segments: &[&str],
        query: Option<&Q>,
    ) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            path.pop_if_empty().extend(segments);
        }
        if let Some(query) = query {
            let encoded = serde_urlencoded::to_string(query)
                .map_err(|e| Error::Json(serde::ser::Error::custom(e)))?;
            if !encoded.is_empty() {
                url.set_query(Some(&encoded));
            }
        }
        Ok(url)
    }

    fn path(&self, segments: &[&str]) -> Result<Url, Error> {
        self.endpoint::<()>(segments, None)
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Performs a health check.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn health_check(&self) -> Result<HealthResponse, Error> {
        let resp = self.client.get(self.path(&["health"])?).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Companies
    // ========================================================================

    /// Lists all companies.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_companies(&self) -> Result<Vec<Company>, Error> {
        let resp = self
            .client
            .get(self.path(&["api", "companies"])?)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Gets the composite ranking, for the server's default year when `year` is `None`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_rankings(&self, year: Option<i32>) -> Result<Vec<RankedCompany>, Error> {
        let url = self.endpoint(&["api", "companies1"], year.map(|y| [("year", y)]).as_ref())?;
        let resp = self.client.get(url).send().await?;
        self.handle_response(resp).await
    }

    /// Gets EPS figures for every company.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn companies_with_metrics(
        &self,
        year: Option<i32>,
    ) -> Result<Vec<CompanyEpsRow>, Error> {
        let url = self.endpoint(
            &["api", "companies-with-metrics"],
            year.map(|y| [("year", y)]).as_ref(),
        )?;
        let resp = self.client.get(url).send().await?;
        self.handle_response(resp).await
    }

    /// Gets key ratios of a company.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn company_key_ratios(&self, company_id: i32) -> Result<Vec<KeyRatio>, Error> {
        let id = company_id.to_string();
        let url = self.path(&["api", "company", &id, "metrics"])?;
        let resp = self.client.get(url).send().await?;
        self.handle_response(resp).await
    }

    /// Gets the last five years of a metric for a company, both by name.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn company_metric_history(
        &self,
        company: &str,
        metric: &str,
    ) -> Result<MetricHistoryResponse, Error> {
        let url = self.path(&["api", "company", company, "metric", metric])?;
        let resp = self.client.get(url).send().await?;
        self.handle_response(resp).await
    }

    /// Gets company suggestions for a search fragment.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn search_suggestions(&self, q: &str) -> Result<Vec<SearchSuggestion>, Error> {
        let url = self.endpoint(&["api", "search-suggestions"], Some(&[("q", q)]))?;
        let resp = self.client.get(url).send().await?;
        self.handle_response(resp).await
    }

    /// Submits feedback.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<MessageResponse, Error> {
        let resp = self
            .client
            .post(self.path(&["api", "feedback"])?)
            .json(request)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Sends a chat command and returns the reply text.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn chat(&self, message: &str) -> Result<String, Error> {
        let resp = self
            .client
            .post(self.path(&["chat"])?)
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?;
        let reply: ChatResponse = self.handle_response(resp).await?;
        Ok(reply.response)
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Registers a user.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, Error> {
        self.post_auth("signup", request).await
    }

    /// Signs in with email or phone.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn signin(&self, request: &SigninRequest) -> Result<AuthResponse, Error> {
        self.post_auth("signin", request).await
    }

    /// Signs in with a Google ID token.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn google_signin(&self, credential: &str) -> Result<GoogleSigninResponse, Error> {
        self.post_auth("google-signin", &serde_json::json!({ "credential": credential }))
            .await
    }

    /// Completes a Google signup.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn google_signup_complete(
        &self,
        request: &GoogleSignupCompleteRequest,
    ) -> Result<AuthResponse, Error> {
        self.post_auth("google-signup-complete", request).await
    }

    /// Asks for a password reset code to be emailed.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, Error> {
        self.post_auth("request-password-reset", &serde_json::json!({ "email": email }))
            .await
    }

    /// Checks a reset code without consuming it.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<MessageResponse, Error> {
        self.post_auth("verify-otp", &serde_json::json!({ "email": email, "otp": otp }))
            .await
    }

    /// Sets a new password with a reset code.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn reset_password_with_otp(
        &self,
        request: &ResetPasswordWithOtpRequest,
    ) -> Result<MessageResponse, Error> {
        self.post_auth("reset-password-with-otp", request).await
    }

    /// Gets the user a session token belongs to.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn me(&self, token: &str) -> Result<MeResponse, Error> {
        let resp = self
            .client
            .get(self.path(&["api", "auth", "me"])?)
            .bearer_auth(token)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn post_auth<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self
            .client
            .post(self.path(&["api", "auth", action])?)
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    async fn handle_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let text = resp.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (Some(body.code), body.error),
            Err(_) => (None, text),
        };

        if status.as_u16() == 404 {
            Err(Error::NotFound(message))
        } else {
            Err(Error::Api {
                status: status.as_u16(),
                code,
                message,
            })
        }
    }
}
