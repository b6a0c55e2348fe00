//! Share price and market cap sync from an external quote provider.
//!
//! [`run_sync`] fetches a quote for every company with a symbol, a bounded
//! number at a time, and stores each result. A failing company is recorded
//! in the [`SyncReport`] and never stops the batch.

mod yahoo;

pub use yahoo::QuoteClient;

use crate::db::{self, DatabasePool, SyncableCompany};
use futures::stream::{self, StreamExt};
use std::future::Future;
use thiserror::Error;
use tracing::{info, warn};

/// Failures listed in the summary log.
const MAX_REPORTED_FAILURES: usize = 10;

/// Per-company sync error types.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Symbol blank after trimming.
    #[error("empty symbol")]
    EmptySymbol,
    /// Provider did not answer in time.
    #[error("request for symbol {symbol} timed out after {timeout_ms}ms")]
    Timeout {
        /// Normalised symbol.
        symbol: String,
        /// Configured timeout.
        timeout_ms: u64,
    },
    /// Provider error or unusable response.
    #[error("failed to fetch data for symbol {symbol}: {message}")]
    Provider {
        /// Normalised symbol.
        symbol: String,
        /// Detail.
        message: String,
    },
    /// Storing the quote failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Latest figures for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Regular market price.
    pub price: Option<f64>,
    /// Market capitalisation.
    pub market_cap: Option<f64>,
    /// Quote currency.
    pub currency: Option<String>,
}

/// Where quotes come from.
pub trait QuoteSource {
    /// Fetches the quote for a normalised symbol.
    fn fetch(&self, symbol: &str) -> impl Future<Output = Result<Quote, SyncError>>;
}

/// Where quotes go.
pub trait QuoteSink {
    /// Persists a quote for a company.
    fn store(
        &self,
        company: &SyncableCompany,
        symbol: &str,
        quote: &Quote,
    ) -> impl Future<Output = Result<(), SyncError>>;
}

impl QuoteSink for DatabasePool {
    async fn store(
        &self,
        company: &SyncableCompany,
        symbol: &str,
        quote: &Quote,
    ) -> Result<(), SyncError> {
        db::store_quote(
            self.pool(),
            company.company_id,
            symbol,
            quote.price,
            quote.market_cap,
            quote.currency.as_deref(),
        )
        .await?;
        Ok(())
    }
}

/// Trims and upper-cases a symbol and appends the exchange suffix unless present.
///
/// # Errors
/// Returns [`SyncError::EmptySymbol`] for a blank symbol.
pub fn normalize_symbol(symbol: &str, suffix: &str) -> Result<String, SyncError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(SyncError::EmptySymbol);
    }
    let suffix = suffix.trim().to_uppercase();
    if suffix.is_empty() || symbol.ends_with(&suffix) {
        Ok(symbol)
    } else {
        Ok(format!("{}{}", symbol, suffix))
    }
}

/// One company that failed to sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// Company id.
    pub company_id: i32,
    /// Symbol as stored.
    pub symbol: String,
    /// Error message.
    pub error: String,
}

/// Outcome of a sync run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Companies attempted.
    pub total: usize,
    /// Companies updated.
    pub succeeded: usize,
    /// Companies that failed, in completion order.
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// Logs the totals and the first few failures.
    pub fn log_summary(&self) {
        info!(
            total = self.total,
            succeeded = self.succeeded,
            failed = self.failures.len(),
            "Quote sync finished"
        );
        for failure in self.failures.iter().take(MAX_REPORTED_FAILURES) {
            warn!(
                company_id = failure.company_id,
                symbol = %failure.symbol,
                "{}",
                failure.error
            );
        }
    }
}

async fn sync_company<S, K>(
    source: &S,
    sink: &K,
    company: &SyncableCompany,
    suffix: &str,
) -> Result<Quote, SyncError>
where
    S: QuoteSource,
    K: QuoteSink,
{
    let symbol = normalize_symbol(&company.symbol, suffix)?;
    let quote = source.fetch(&symbol).await?;
    sink.store(company, &symbol, &quote).await?;
    info!(
        company = %company.name,
        symbol = %symbol,
        price = ?quote.price,
        market_cap = ?quote.market_cap,
        "Quote stored"
    );
    Ok(quote)
}

/// Syncs every company with at most `concurrency` requests in flight.
pub async fn run_sync<S, K>(
    source: &S,
    sink: &K,
    companies: Vec<SyncableCompany>,
    suffix: &str,
    concurrency: usize,
) -> SyncReport
where
    S: QuoteSource,
    K: QuoteSink,
{
    let mut report = SyncReport {
        total: companies.len(),
        ..SyncReport::default()
    };

    let mut results = stream::iter(companies.iter())
        .map(|company| async move { (company, sync_company(source, sink, company, suffix).await) })
        .buffer_unordered(concurrency.max(1));

    while let Some((company, result)) = results.next().await {
        match result {
            Ok(_) => report.succeeded += 1,
            Err(e) => {
                report.failures.push(SyncFailure {
                    company_id: company.company_id,
                    symbol: company.symbol.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeSource {
        quotes: HashMap<String, f64>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeSource {
        fn new(quotes: &[(&str, f64)]) -> Self {
            Self {
                quotes: quotes.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl QuoteSource for FakeSource {
        async fn fetch(&self, symbol: &str) -> Result<Quote, SyncError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.quotes
                .get(symbol)
                .map(|price| Quote {
                    price: Some(*price),
                    market_cap: Some(price * 1000.0),
                    currency: Some("INR".to_string()),
                })
                .ok_or_else(|| SyncError::Provider {
                    symbol: symbol.to_string(),
                    message: "symbol not found".to_string(),
                })
        }
    }

    #[derive(Default)]
    struct MemorySink {
        stored: Mutex<Vec<(i32, String)>>,
    }

    impl QuoteSink for MemorySink {
        async fn store(
            &self,
            company: &SyncableCompany,
            symbol: &str,
            _quote: &Quote,
        ) -> Result<(), SyncError> {
            self.stored
                .lock()
                .push((company.company_id, symbol.to_string()));
            Ok(())
        }
    }

    fn company(id: i32, symbol: &str) -> SyncableCompany {
        SyncableCompany {
            company_id: id,
            name: format!("Company {}", id),
            symbol: symbol.to_string(),
        }
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" tcs ", ".NS").expect("ok"), "TCS.NS");
        assert_eq!(normalize_symbol("INFY.NS", ".NS").expect("ok"), "INFY.NS");
        assert_eq!(normalize_symbol("infy.ns", ".NS").expect("ok"), "INFY.NS");
        assert_eq!(normalize_symbol("AAPL", "").expect("ok"), "AAPL");
        assert!(matches!(
            normalize_symbol("   ", ".NS"),
            Err(SyncError::EmptySymbol)
        ));
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let source = FakeSource::new(&[("TCS.NS", 3900.0), ("INFY.NS", 1500.0)]);
        let sink = MemorySink::default();
        let companies = vec![
            company(1, "TCS"),
            company(2, "MISSING"),
            company(3, " "),
            company(4, "infy"),
        ];

        let report = run_sync(&source, &sink, companies, ".NS", 2).await;

        assert_eq!(report.total, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failures.len(), 2);

        let mut failed: Vec<i32> = report.failures.iter().map(|f| f.company_id).collect();
        failed.sort_unstable();
        assert_eq!(failed, vec![2, 3]);

        let mut stored = sink.stored.lock().clone();
        stored.sort();
        assert_eq!(
            stored,
            vec![(1, "TCS.NS".to_string()), (4, "INFY.NS".to_string())]
        );
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let symbols: Vec<String> = (0..12).map(|i| format!("S{}.NS", i)).collect();
        let quotes: Vec<(&str, f64)> = symbols.iter().map(|s| (s.as_str(), 1.0)).collect();
        let source = FakeSource::new(&quotes);
        let sink = MemorySink::default();
        let companies = (0..12).map(|i| company(i, &format!("S{}", i))).collect();

        let report = run_sync(&source, &sink, companies, ".NS", 3).await;

        assert_eq!(report.succeeded, 12);
        assert!(source.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let source = FakeSource::new(&[]);
        let sink = MemorySink::default();
        let report = run_sync(&source, &sink, Vec::new(), ".NS", 5).await;
        assert_eq!(report.total, 0);
        assert!(report.failures.is_empty());
    }
}
