//! Application state management.

use crate::auth::{GoogleVerifier, TokenService};
use crate::config::Config;
use crate::db::DatabasePool;
use crate::mail::{MailError, Mailer};
use crate::ranking::RankingCache;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Errors building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    /// SMTP settings rejected.
    #[error("mailer setup failed: {0}")]
    Mail(#[from] MailError),
    /// Outbound HTTP client could not be built.
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database pool.
    pub db: DatabasePool,
    /// Application configuration.
    pub config: Arc<Config>,
    /// Per-year ranking cache.
    pub rankings: Arc<RankingCache>,
    /// Bearer token issuer and verifier.
    pub tokens: Arc<TokenService>,
    /// Outgoing email.
    pub mailer: Mailer,
    /// Google ID token verifier.
    pub google: Arc<GoogleVerifier>,
}

impl AppState {
    /// Creates the application state from configuration.
    ///
    /// # Errors
    /// Returns an error if the mailer or the Google HTTP client cannot be built.
    pub fn from_config(config: Config, db: DatabasePool) -> Result<Self, StateError> {
        let mailer = Mailer::from_config(config.smtp.as_ref())?;
        if matches!(mailer, Mailer::Log(_)) {
            warn!("No [smtp] section configured, reset codes will only be logged");
        }

        let google = GoogleVerifier::new(
            &config.auth.google_tokeninfo_url,
            config.auth.google_client_id.clone(),
        )?;
        if !google.is_configured() {
            info!("Google sign-in disabled (no client id)");
        }

        let tokens = TokenService::new(
            &config.auth.jwt_secret,
            Duration::from_secs(config.auth.token_ttl_secs),
            Duration::from_secs(config.auth.signup_token_ttl_secs),
        );

        Ok(Self {
            db,
            rankings: Arc::new(RankingCache::new(config.ranking.cache_ttl())),
            tokens: Arc::new(tokens),
            mailer,
            google: Arc::new(google),
            config: Arc::new(config),
        })
    }
}
