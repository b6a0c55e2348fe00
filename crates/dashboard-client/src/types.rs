//! Request and response types for the dashboard API.

use serde::{Deserialize, Serialize};


// ============================================================================
// Common
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Generic acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Outcome message.
    pub message: String,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error message.
    pub error: String,
    /// Error code.
    pub code: String,
}

// ============================================================================
// Companies
// ============================================================================

/// Company record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Company id.
    pub company_id: i32,
    /// Company name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: Option<String>,
    /// Last synced share price.
    pub share_price: Option<f64>,
    /// Last synced market capitalisation.
    pub market_cap: Option<f64>,
}

/// A company's position in the composite ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCompany {
    /// 1-based rank.
    pub rank: u32,
    /// Company id.
    pub company_id: i32,
    /// Company name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: Option<String>,
    /// Latest share price.
    pub share_price: Option<f64>,
    /// Latest market capitalisation.
    pub market_cap: Option<f64>,
    /// Composite score.
    pub score: f64,
    /// Metrics averaged into the score.
    pub metrics_scored: u32,
    /// Fiscal year.
    pub fiscal_year: i32,
}

/// EPS figures of a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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
    /// Fiscal year.
    pub fiscal_year: i32,
}

/// One key ratio value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRatio {
    /// Metric name.
    pub name: String,
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Value.
    pub value: Option<f64>,
}

/// A metric value in one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Value.
    pub value: Option<f64>,
}

/// Recent history of one metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricHistoryResponse {
    /// Company name.
    #[serde(rename = "companyName")]
    pub company_name: String,
    /// Metric name.
    #[serde(rename = "metricName")]
    pub metric_name: String,
    /// Values, newest year first.
    pub values: Vec<MetricPoint>,
}

/// Search suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSuggestion {
    /// Company id.
    pub company_id: i32,
    /// Company name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: Option<String>,
}

/// Feedback submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Rating from 1 to 5.
    pub rating: i64,
    /// Free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Command text.
    pub message: String,
}

/// Chat reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Reply text.
    pub response: String,
}

// ============================================================================
// Authentication
// ============================================================================

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User id.
    pub id: i32,
    /// Full name.
    pub fullname: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: Option<String>,
}

/// Registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Full name.
    pub fullname: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: String,
    /// Password.
    pub password: String,
}

/// Sign-in request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninRequest {
    /// Email or phone.
    pub identifier: String,
    /// Password.
    pub password: String,
}

/// Successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Outcome message.
    pub message: String,
    /// Session token.
    pub token: String,
    /// User.
    pub user: UserSummary,
}

/// Google sign-in outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSigninResponse {
    /// Outcome message.
    pub message: String,
    /// True when registration must be completed.
    pub needs_signup: bool,
    /// Session token for known users.
    #[serde(default)]
    pub token: Option<String>,
    /// Known user.
    #[serde(default)]
    pub user: Option<UserSummary>,
    /// Signup token for new users.
    #[serde(rename = "tempToken", default)]
    pub temp_token: Option<String>,
    /// Google email.
    pub email: String,
    /// Google display name.
    pub name: String,
}

/// Completes a Google signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSignupCompleteRequest {
    /// Token from Google sign-in.
    #[serde(rename = "tempToken")]
    pub temp_token: String,
    /// Phone.
    pub phone: String,
    /// Password.
    pub password: String,
}

/// Resets a password with an emailed code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordWithOtpRequest {
    /// Email.
    pub email: String,
    /// Six digit code.
    pub otp: String,
    /// New password.
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Current user response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    /// User.
    pub user: UserSummary,
}
