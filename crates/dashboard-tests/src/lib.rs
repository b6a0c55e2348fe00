//! Integration tests for the Fundamentals Dashboard API.
//!
//! These tests require the API server to be running against a seeded
//! database. Configure the server URL via the `API_BASE_URL` environment
//! variable (default: `http://localhost:5001`) and run them with
//! `cargo test -p dashboard-tests -- --ignored`.

use dashboard_client::{ClientConfig, DashboardClient};
use std::time::Duration;

/// Gets the API base URL from environment or uses default.
#[must_use]
pub fn get_api_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:5001".to_string())
}

/// Creates a test client configured for the API.
///
/// # Errors
/// Returns error if client creation fails.
pub fn create_test_client() -> Result<DashboardClient, dashboard_client::Error> {
    DashboardClient::new(ClientConfig {
        base_url: get_api_url(),
        timeout: Duration::from_secs(10),
    })
}

/// Generates a unique email address so repeated runs do not collide.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    let (ts, counter) = unique_suffix();
    format!("{}_{}_{}@example.com", prefix, ts, counter)
}

/// Generates a unique ten digit phone number.
#[must_use]
pub fn unique_phone() -> String {
    let (ts, counter) = unique_suffix();
    format!("9{:09}", (ts.wrapping_mul(31).wrapping_add(counter)) % 1_000_000_000)
}

fn unique_suffix() -> (u64, u64) {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    (ts, COUNTER.fetch_add(1, Ordering::Relaxed))
}
