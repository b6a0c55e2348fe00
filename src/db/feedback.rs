//! Feedback persistence.

use sqlx::PgPool;

/// Stores a feedback entry and returns its id.
///
/// # Errors
/// Returns an error if the insert fails.
pub async fn insert_feedback(
    pool: &PgPool,
    rating: i16,
    feedback: Option<&str>,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO feedback (rating, feedback) VALUES ($1, $2) RETURNING id")
        .bind(rating)
        .bind(feedback)
        .fetch_one(pool)
        .await
}
