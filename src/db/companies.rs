//! Company and metric queries.

use super::schema::{Company, CompanyMetricValue, NamedMetricValue, YearValue};
use crate::ranking::MetricRow;
use sqlx::PgPool;

/// Lists every company by name.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn list_companies(pool: &PgPool) -> Result<Vec<Company>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT company_id, name, symbol, share_price::float8 AS share_price,
               market_cap::float8 AS market_cap
        FROM companies
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Loads the scorer input for one fiscal year.
///
/// Rows come back ordered by company then metric so that ranking ties
/// resolve the same way on every call.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_ranking_rows(pool: &PgPool, year: i32) -> Result<Vec<MetricRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT c.company_id,
               c.name AS company_name,
               c.symbol,
               c.share_price::float8 AS share_price,
               c.market_cap::float8 AS market_cap,
               m.name AS metric_name,
               v.value::float8 AS value,
               v.fiscal_year
        FROM metric_values v
        JOIN companies c ON c.company_id = v.company_id
        JOIN financial_metrics m ON m.metric_id = v.metric_id
        WHERE v.fiscal_year = $1
        ORDER BY c.company_id, m.metric_id
        "#,
    )
    .bind(year)
    .fetch_all(pool)
    .await
}

/// Every metric value reported for `year`, across all companies.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_year_values(
    pool: &PgPool,
    year: i32,
) -> Result<Vec<CompanyMetricValue>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT v.company_id, m.name AS metric_name, v.value::float8 AS value
        FROM metric_values v
        JOIN financial_metrics m ON m.metric_id = v.metric_id
        WHERE v.fiscal_year = $1
        ORDER BY v.company_id, m.metric_id
        "#,
    )
    .bind(year)
    .fetch_all(pool)
    .await
}

/// All metric values of a company, newest year first.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_company_values(
    pool: &PgPool,
    company_id: i32,
) -> Result<Vec<NamedMetricValue>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT m.name, v.fiscal_year, v.value::float8 AS value
        FROM metric_values v
        JOIN financial_metrics m ON m.metric_id = v.metric_id
        WHERE v.company_id = $1
        ORDER BY v.fiscal_year DESC, m.metric_id
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await
}

/// Finds a company id by exact name.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_company_id(pool: &PgPool, name: &str) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT company_id FROM companies WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
}

/// Finds a metric by case-insensitive name, returning its id and stored name.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_metric(pool: &PgPool, name: &str) -> Result<Option<(i32, String)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT metric_id, name
        FROM financial_metrics
        WHERE LOWER(name) = LOWER($1)
        ORDER BY metric_id
        LIMIT 1
        "#,
    )
    .bind(name.trim())
    .fetch_optional(pool)
    .await
}

/// Most recent `limit` yearly values of a metric for a company.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_metric_history(
    pool: &PgPool,
    company_id: i32,
    metric_id: i32,
    limit: i64,
) -> Result<Vec<YearValue>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT fiscal_year, value::float8 AS value
        FROM metric_values
        WHERE company_id = $1 AND metric_id = $2
        ORDER BY fiscal_year DESC
        LIMIT $3
        "#,
    )
    .bind(company_id)
    .bind(metric_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Metric values for `year` of every company whose name contains `company`,
/// case-insensitively.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_company_year_values(
    pool: &PgPool,
    company: &str,
    year: i32,
) -> Result<Vec<NamedMetricValue>, sqlx::Error> {
    let pattern = format!("%{}%", escape_like(company.trim()));
    sqlx::query_as(
        r#"
        SELECT m.name, v.fiscal_year, v.value::float8 AS value
        FROM metric_values v
        JOIN financial_metrics m ON m.metric_id = v.metric_id
        JOIN companies c ON c.company_id = v.company_id
        WHERE c.name ILIKE $1 ESCAPE '\' AND v.fiscal_year = $2
        ORDER BY c.company_id, m.metric_id
        "#,
    )
    .bind(pattern)
    .bind(year)
    .fetch_all(pool)
    .await
}

/// Companies whose name or symbol contains `query`, case-insensitively.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn search_companies(
    pool: &PgPool,
    query: &str,
    limit: i64,
) -> Result<Vec<Company>, sqlx::Error> {
    let pattern = format!("%{}%", escape_like(query));
    sqlx::query_as(
        r#"
        SELECT company_id, name, symbol, share_price::float8 AS share_price,
               market_cap::float8 AS market_cap
        FROM companies
        WHERE name ILIKE $1 ESCAPE '\' OR symbol ILIKE $1 ESCAPE '\'
        ORDER BY name
        LIMIT $2
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Escapes `%`, `_` and the escape character itself for a LIKE pattern.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("tata"), "tata");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\x"), "c:\\\\x");
    }
}
