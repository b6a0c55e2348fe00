//! Request and response models for the REST API.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Generic acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Company Data
// ============================================================================

/// Query parameters carrying an optional fiscal year.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct YearQuery {
    /// Fiscal year, e.g. `2024`. Blank or absent means the configured default.
    #[serde(default)]
    pub year: Option<String>,
}

/// Query parameters for search suggestions.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Fragment of a company name or symbol.
    #[serde(default)]
    pub q: Option<String>,
}

/// Earnings per share figures of a company for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CompanyEpsRow {
    /// Company id.
    pub company_id: i32,
    /// Company name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: Option<String>,
    /// Basic EPS.
    #[serde(rename = "Basic_eps")]
    pub basic_eps: Option<f64>,
    /// Diluted EPS.
    #[serde(rename = "Diluted_EPS")]
    pub diluted_eps: Option<f64>,
    /// Cash EPS.
    #[serde(rename = "Cash_EPS")]
    pub cash_eps: Option<f64>,
    /// Fiscal year of the figures.
    pub fiscal_year: i32,
}

/// One key ratio value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KeyRatio {
    /// Metric display name.
    pub name: String,
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Reported value.
    pub value: Option<f64>,
}

/// A metric value in one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricPoint {
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Reported value.
    pub value: Option<f64>,
}

/// Recent history of one metric for one company.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricHistoryResponse {
    /// Company name.
    #[serde(rename = "companyName")]
    pub company_name: String,
    /// Metric name as stored.
    #[serde(rename = "metricName")]
    pub metric_name: String,
    /// Values, newest year first.
    pub values: Vec<MetricPoint>,
}

/// Search suggestion entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchSuggestion {
    /// Company id.
    pub company_id: i32,
    /// Company name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: Option<String>,
}

/// Feedback submission.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct FeedbackRequest {
    /// Rating from 1 to 5.
    pub rating: i64,
    /// Free text.
    #[serde(default)]
    pub feedback: Option<String>,
}

// ============================================================================
// Chat
// ============================================================================

/// Chat message.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ChatRequest {
    /// Free text command, e.g. `top companies 2023`.
    #[serde(default)]
    pub message: Option<String>,
}

/// Chat reply.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    /// Reply text.
    pub response: String,
}

// ============================================================================
// Authentication
// ============================================================================

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    /// User id.
    pub id: i32,
    /// Full name.
    pub fullname: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
}

/// Account creation request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignupRequest {
    /// Full name.
    #[serde(default)]
    pub fullname: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Plain password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Sign-in request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SigninRequest {
    /// Email or phone.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Plain password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Outcome message.
    pub message: String,
    /// Session bearer token.
    pub token: String,
    /// Authenticated user.
    pub user: UserSummary,
}

/// Google sign-in request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct GoogleSigninRequest {
    /// Google ID token.
    #[serde(default)]
    pub credential: Option<String>,
}

/// Google sign-in outcome.
///
/// Known accounts receive a session token and user; new ones receive a
/// short-lived `tempToken` to finish registration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GoogleSigninResponse {
    /// Outcome message.
    pub message: String,
    /// True when the account must still be completed.
    pub needs_signup: bool,
    /// Session token for existing users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Existing user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    /// Signup token for new users.
    #[serde(
        rename = "tempToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub temp_token: Option<String>,
    /// Verified Google email.
    pub email: String,
    /// Google display name.
    pub name: String,
}

/// Completes a Google-initiated signup.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct GoogleSignupCompleteRequest {
    /// Token returned by Google sign-in.
    #[serde(rename = "tempToken", default)]
    pub temp_token: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Plain password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Asks for a reset code.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PasswordResetRequest {
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
}

/// Checks a reset code.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct VerifyOtpRequest {
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
    /// Six digit code.
    #[serde(default)]
    pub otp: Option<String>,
}

/// Sets a new password with a reset code.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ResetPasswordWithOtpRequest {
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
    /// Six digit code.
    #[serde(default)]
    pub otp: Option<String>,
    /// New plain password.
    #[serde(rename = "newPassword", default)]
    pub new_password: Option<String>,
}

/// Current user response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    /// Authenticated user.
    pub user: UserSummary,
}
