//! HTTP client library for the Fundamentals Dashboard API.
//!
//! This crate provides a typed HTTP client for the dashboard backend: company
//! data, rankings, feedback and the authentication flows.
//!
//! # Example
//!
//! ```no_run
//! use dashboard_client::{ClientConfig, DashboardClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dashboard_client::Error> {
//!     let client = DashboardClient::new(ClientConfig {
//!         base_url: "http://localhost:5001".into(),
//!         timeout: Duration::from_secs(30),
//!     })?;
//!
//!     let ranking = client.get_rankings(Some(2024)).await?;
//!     for company in ranking.iter().take(5) {
//!         println!("{} {} {:.3}", company.rank, company.name, company.score);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{ClientConfig, DashboardClient};
pub use error::Error;
pub use types::*;
