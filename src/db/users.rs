//! User and password reset queries.

use super::schema::UserRow;
use crate::auth::OtpRecord;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

const USER_COLUMNS: &str = "id, fullname, email, phone, password, created_at";

/// Finds a user by email (case-insensitive) or phone.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_user_by_identifier(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM users WHERE LOWER(email) = LOWER($1) OR phone = $1 ORDER BY id LIMIT 1",
        USER_COLUMNS
    );
    sqlx::query_as(&sql)
        .bind(identifier.trim())
        .fetch_optional(pool)
        .await
}

/// Finds a user by email.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
        USER_COLUMNS
    );
    sqlx::query_as(&sql)
        .bind(email.trim())
        .fetch_optional(pool)
        .await
}

/// Finds a user by id.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_user_by_id(pool: &PgPool, id: i32) -> Result<Option<UserRow>, sqlx::Error> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    sqlx::query_as(&sql).bind(id).fetch_optional(pool).await
}

/// Returns true if the email or phone is already registered.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn user_exists(pool: &PgPool, email: &str, phone: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) OR phone = $2)",
    )
    .bind(email)
    .bind(phone)
    .fetch_one(pool)
    .await
}

/// Inserts a user and returns the stored row.
///
/// # Errors
/// Returns an error if the insert fails, including unique violations.
pub async fn create_user(
    pool: &PgPool,
    fullname: &str,
    email: &str,
    phone: &str,
    password_hash: &str,
) -> Result<UserRow, sqlx::Error> {
    let sql = format!(
        "INSERT INTO users (fullname, email, phone, password) VALUES ($1, $2, $3, $4) RETURNING {}",
        USER_COLUMNS
    );
    sqlx::query_as(&sql)
        .bind(fullname)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .fetch_one(pool)
        .await
}

/// Replaces a user's password hash.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn update_password(
    conn: &mut PgConnection,
    email: &str,
    password_hash: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password = $1 WHERE LOWER(email) = LOWER($2)")
        .bind(password_hash)
        .bind(email)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Stores a fresh reset code for `email`, replacing any previous one.
///
/// # Errors
/// Returns an error if the upsert fails.
pub async fn upsert_otp(
    pool: &PgPool,
    email: &str,
    otp_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO password_reset_otps (email, otp_hash, expires_at, attempts, created_at)
        VALUES ($1, $2, $3, 0, NOW())
        ON CONFLICT (email) DO UPDATE
        SET otp_hash = EXCLUDED.otp_hash,
            expires_at = EXCLUDED.expires_at,
            attempts = 0,
            created_at = NOW()
        "#,
    )
    .bind(email)
    .bind(otp_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Loads and row-locks the outstanding reset code for `email`.
///
/// The lock is held until the surrounding transaction ends, so checks of
/// the same code run one at a time and see each other's attempt counts.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn lock_otp(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Option<OtpRecord>, sqlx::Error> {
    sqlx::query_as(
        "SELECT otp_hash, expires_at, attempts FROM password_reset_otps WHERE email = $1 FOR UPDATE",
    )
    .bind(email)
    .fetch_optional(conn)
    .await
}

/// Counts a failed guess against the reset code.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn increment_otp_attempts(conn: &mut PgConnection, email: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE password_reset_otps SET attempts = attempts + 1 WHERE email = $1")
        .bind(email)
        .execute(conn)
        .await?;
    Ok(())
}

/// Removes the reset code for `email`, returning whether one existed.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn delete_otp(conn: &mut PgConnection, email: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM password_reset_otps WHERE email = $1")
        .bind(email)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
