//! Database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Company record.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Company {
    /// Unique identifier.
    pub company_id: i32,
    /// Company name.
    pub name: String,
    /// Exchange ticker, without suffix.
    pub symbol: Option<String>,
    /// Last synced share price.
    pub share_price: Option<f64>,
    /// Last synced market capitalisation.
    pub market_cap: Option<f64>,
}

/// Registered user.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    /// Unique identifier.
    pub id: i32,
    /// Full name.
    pub fullname: String,
    /// Lower-cased email.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// bcrypt hash.
    pub password: String,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One company's metric value for a given year, keyed by display name.
#[derive(Debug, Clone, FromRow)]
pub struct CompanyMetricValue {
    /// Company id.
    pub company_id: i32,
    /// Metric display name.
    pub metric_name: String,
    /// Reported value.
    pub value: Option<f64>,
}

/// A company's metric value in one fiscal year.
#[derive(Debug, Clone, FromRow)]
pub struct NamedMetricValue {
    /// Metric display name.
    pub name: String,
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Reported value.
    pub value: Option<f64>,
}

/// Yearly value of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct YearValue {
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Reported value.
    pub value: Option<f64>,
}

/// Company with a symbol the sync job can look up.
#[derive(Debug, Clone, FromRow)]
pub struct SyncableCompany {
    /// Company id.
    pub company_id: i32,
    /// Company name.
    pub name: String,
    /// Symbol as stored.
    pub symbol: String,
}
