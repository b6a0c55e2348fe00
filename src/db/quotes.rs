//! Quote sync persistence.

use super::schema::SyncableCompany;
use sqlx::PgPool;

/// Companies that have a non-blank symbol.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn load_syncable_companies(pool: &PgPool) -> Result<Vec<SyncableCompany>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT company_id, name, symbol
        FROM companies
        WHERE symbol IS NOT NULL AND BTRIM(symbol) <> ''
        ORDER BY company_id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Records a quote snapshot and updates the company's latest figures.
///
/// Both writes share one transaction.
///
/// # Errors
/// Returns an error if either write fails.
pub async fn store_quote(
    pool: &PgPool,
    company_id: i32,
    symbol: &str,
    share_price: Option<f64>,
    market_cap: Option<f64>,
    currency: Option<&str>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO company_quotes (company_id, symbol, share_price, market_cap, currency)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(company_id)
    .bind(symbol)
    .bind(share_price)
    .bind(market_cap)
    .bind(currency)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE companies
        SET share_price = COALESCE($2, share_price),
            market_cap = COALESCE($3, market_cap)
        WHERE company_id = $1
        "#,
    )
    .bind(company_id)
    .bind(share_price)
    .bind(market_cap)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}
