//! Yahoo Finance quote endpoint client.

use super::{Quote, QuoteSource, SyncError};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponseData,
}

#[derive(Debug, Deserialize)]
struct QuoteResponseData {
    #[serde(default)]
    result: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    symbol: String,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "marketCap")]
    market_cap: Option<f64>,
    currency: Option<String>,
}

/// Parses a quote endpoint body and picks the entry for `symbol`.
pub(crate) fn parse_quote(body: &str, symbol: &str) -> Result<Quote, SyncError> {
    let envelope: QuoteEnvelope = serde_json::from_str(body).map_err(|e| SyncError::Provider {
        symbol: symbol.to_string(),
        message: format!("malformed response: {}", e),
    })?;

    envelope
        .quote_response
        .result
        .into_iter()
        .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
        .map(|q| Quote {
            price: q.regular_market_price,
            market_cap: q.market_cap,
            currency: q.currency,
        })
        .ok_or_else(|| SyncError::Provider {
            symbol: symbol.to_string(),
            message: "symbol not found".to_string(),
        })
}

/// Longest body accepted as a crumb.
const MAX_CRUMB_LEN: usize = 100;

const REFERER: &str = "https://finance.yahoo.com/";

/// Extracts a crumb from a crumb endpoint body.
///
/// Rejects empty bodies, HTML error pages and rate-limit notices.
pub(crate) fn parse_crumb(body: &str) -> Option<String> {
    let body = body.trim();
    let valid = !body.is_empty()
        && body.len() < MAX_CRUMB_LEN
        && !body.contains(char::is_whitespace)
        && !body.starts_with('<');
    valid.then(|| body.to_string())
}

/// Builds the quote request URL, with the crumb when one is held.
pub(crate) fn quote_request_url(
    base_url: &str,
    symbol: &str,
    crumb: Option<&str>,
) -> Result<String, serde_urlencoded::ser::Error> {
    let mut params = vec![("symbols", symbol)];
    if let Some(crumb) = crumb {
        params.push(("crumb", crumb));
    }
    Ok(format!("{}?{}", base_url, serde_urlencoded::to_string(params)?))
}

/// Endpoints of the cookie and crumb handshake.
#[derive(Debug, Clone)]
struct Session {
    cookie_url: String,
    crumb_url: String,
}

/// HTTP client for the quote endpoint.
///
/// With a session configured, the client visits the cookie endpoint once,
/// keeps the cookie in its jar and sends the cached crumb with every quote
/// request. A 401 or 403 answer drops the crumb and retries once with a
/// fresh one.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    session: Option<Session>,
    crumb: Arc<Mutex<Option<String>>>,
}

impl QuoteClient {
    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fundamentals-dashboard/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            session: None,
            crumb: Arc::new(Mutex::new(None)),
        })
    }

    /// Enables the cookie and crumb handshake.
    ///
    /// An empty URL leaves the handshake disabled.
    #[must_use]
    pub fn with_session(mut self, cookie_url: &str, crumb_url: &str) -> Self {
        self.session = (!cookie_url.is_empty() && !crumb_url.is_empty()).then(|| Session {
            cookie_url: cookie_url.to_string(),
            crumb_url: crumb_url.to_string(),
        });
        self
    }

    /// Returns the cached crumb, fetching one when none is held or when the
    /// held one equals `rejected`.
    ///
    /// Concurrent callers wait on the same lock, so one handshake serves them all.
    async fn crumb(&self, rejected: Option<&str>) -> Result<Option<String>, String> {
        let Some(session) = &self.session else {
            return Ok(None);
        };

        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_deref()
            && Some(crumb) != rejected
        {
            return Ok(Some(crumb.to_string()));
        }
        *cached = None;

        // The cookie endpoint answers 404 but still sets the session cookie.
        self.client
            .get(&session.cookie_url)
            .header("referer", REFERER)
            .send()
            .await
            .map_err(|e| format!("session cookie request failed: {}", e))?;

        let resp = self
            .client
            .get(&session.crumb_url)
            .header("referer", REFERER)
            .send()
            .await
            .map_err(|e| format!("crumb request failed: {}", e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("crumb request returned status {}", status.as_u16()));
        }
        let body = resp.text().await.map_err(|e| e.to_string())?;
        let crumb = parse_crumb(&body).ok_or_else(|| "crumb response was not a crumb".to_string())?;

        debug!("Obtained quote provider crumb");
        *cached = Some(crumb.clone());
        Ok(Some(crumb))
    }

    async fn send(&self, symbol: &str, crumb: Option<&str>) -> Result<reqwest::Response, String> {
        let url = quote_request_url(&self.base_url, symbol, crumb).map_err(|e| e.to_string())?;
        self.client
            .get(&url)
            .header("referer", REFERER)
            .send()
            .await
            .map_err(|e| e.to_string())
    }

    async fn request(&self, symbol: &str) -> Result<Quote, SyncError> {
        let provider_error = |message: String| SyncError::Provider {
            symbol: symbol.to_string(),
            message,
        };

        let crumb = self.crumb(None).await.map_err(provider_error)?;
        let mut resp = self
            .send(symbol, crumb.as_deref())
            .await
            .map_err(provider_error)?;

        if self.session.is_some()
            && matches!(
                resp.status(),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            )
        {
            debug!(symbol, status = resp.status().as_u16(), "Crumb rejected, refreshing");
            let fresh = self
                .crumb(crumb.as_deref())
                .await
                .map_err(provider_error)?;
            resp = self
                .send(symbol, fresh.as_deref())
                .await
                .map_err(provider_error)?;
        }

        let status = resp.status();
        if !status.is_success() {
            return Err(provider_error(format!("status {}", status.as_u16())));
        }

        let body = resp.text().await.map_err(|e| provider_error(e.to_string()))?;
        parse_quote(&body, symbol)
    }
}

impl QuoteSource for QuoteClient {
    async fn fetch(&self, symbol: &str) -> Result<Quote, SyncError> {
        tokio::time::timeout(self.timeout, self.request(symbol))
            .await
            .map_err(|_| SyncError::Timeout {
                symbol: symbol.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
    }
}
