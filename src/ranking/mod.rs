//! Composite company ranking.
//!
//! Metric values for one fiscal year are min-max normalized per canonical
//! metric, averaged per company and sorted into a 1-based ranking. Computed
//! rankings are kept in a per-year in-memory cache.

mod cache;
mod metrics;
mod scorer;

pub use cache::RankingCache;
pub use metrics::{MetricDirection, canonical_metric_key, metric_direction};
pub use scorer::{MetricRow, RankedCompany, score_companies};
