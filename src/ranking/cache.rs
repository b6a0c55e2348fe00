//! Per-year ranking cache.

use super::RankedCompany;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedRanking {
    stored_at: Instant,
    ranking: Arc<Vec<RankedCompany>>,
}

/// In-memory rankings keyed by fiscal year with a fixed time-to-live.
///
/// Map guards are never held across an `.await`: two concurrent misses for the
/// same year may both compute, and the later insert wins.
#[derive(Debug)]
pub struct RankingCache {
    ttl: Duration,
    entries: DashMap<i32, CachedRanking>,
}

impl RankingCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Returns the cached ranking for `year` if it is still fresh.
    #[must_use]
    pub fn get(&self, year: i32) -> Option<Arc<Vec<RankedCompany>>> {
        let fresh = self.entries.get(&year).and_then(|entry| {
            (entry.stored_at.elapsed() < self.ttl).then(|| Arc::clone(&entry.ranking))
        });

        if fresh.is_none() {
            self.entries
                .remove_if(&year, |_, entry| entry.stored_at.elapsed() >= self.ttl);
        }

        fresh
    }

    /// Stores a ranking for `year`, replacing any previous one.
    pub fn insert(&self, year: i32, ranking: Vec<RankedCompany>) -> Arc<Vec<RankedCompany>> {
        let ranking = Arc::new(ranking);
        self.entries.insert(
            year,
            CachedRanking {
                stored_at: Instant::now(),
                ranking: Arc::clone(&ranking),
            },
        );
        ranking
    }

    /// Returns the fresh cached ranking or computes, stores and returns a new one.
    ///
    /// Errors from `compute` are returned as-is and nothing is cached.
    ///
    /// # Errors
    /// Propagates the error of `compute`.
    pub async fn get_or_try_compute<F, Fut, E>(
        &self,
        year: i32,
        compute: F,
    ) -> Result<Arc<Vec<RankedCompany>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<RankedCompany>, E>>,
    {
        if let Some(ranking) = self.get(year) {
            debug!(year, "ranking cache hit");
            return Ok(ranking);
        }

        debug!(year, "ranking cache miss");
        let ranking = compute().await?;
        Ok(self.insert(year, ranking))
    }

    /// Number of cached years, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ranked(company_id: i32, score: f64) -> RankedCompany {
        RankedCompany {
            rank: 1,
            company_id,
            name: format!("Company {}", company_id),
            symbol: None,
            share_price: None,
            market_cap: None,
            score,
            metrics_scored: 1,
            fiscal_year: 2024,
        }
    }

    #[tokio::test]
    async fn test_second_request_within_ttl_is_served_from_cache() {
        let cache = RankingCache::new(Duration::from_secs(3600));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let compute = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec![ranked(1, 0.75)])
        };

        let first = cache.get_or_try_compute(2024, compute).await.expect("first");
        let second = cache
            .get_or_try_compute(2024, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(vec![ranked(2, 0.1)])
            })
            .await
            .expect("second");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            serde_json::to_string(&*first).expect("json"),
            serde_json::to_string(&*second).expect("json")
        );
    }

    #[tokio::test]
    async fn test_years_are_cached_independently() {
        let cache = RankingCache::new(Duration::from_secs(3600));

        cache
            .get_or_try_compute(2023, || async { Ok::<_, String>(vec![ranked(1, 0.5)]) })
            .await
            .expect("2023");
        let other = cache
            .get_or_try_compute(2024, || async { Ok::<_, String>(vec![ranked(2, 0.9)]) })
            .await
            .expect("2024");

        assert_eq!(other[0].company_id, 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_is_recomputed() {
        let cache = RankingCache::new(Duration::ZERO);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            cache
                .get_or_try_compute(2024, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(vec![ranked(1, 0.5)])
                })
                .await
                .expect("compute");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.get(2024).is_none());
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = RankingCache::new(Duration::from_secs(3600));

        let failed = cache
            .get_or_try_compute(2024, || async { Err::<Vec<RankedCompany>, _>("db down") })
            .await;
        assert_eq!(failed, Err("db down"));
        assert!(cache.is_empty());

        let ok = cache
            .get_or_try_compute(2024, || async { Ok::<_, &str>(vec![ranked(1, 0.5)]) })
            .await
            .expect("recovered");
        assert_eq!(ok.len(), 1);
    }
}
