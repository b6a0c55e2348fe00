//! Min-max composite scoring.

use super::metrics::{MetricDirection, canonical_metric_key, metric_direction};
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;
use utoipa::ToSchema;

/// Score given to every company when a metric has no spread.
const FLAT_METRIC_SCORE: f64 = 0.5;

/// One (company, metric) value for the requested fiscal year.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MetricRow {
    /// Company id.
    pub company_id: i32,
    /// Company name.
    pub company_name: String,
    /// Ticker symbol.
    pub symbol: Option<String>,
    /// Latest share price.
    pub share_price: Option<f64>,
    /// Latest market capitalisation.
    pub market_cap: Option<f64>,
    /// Free-text metric name.
    pub metric_name: String,
    /// Reported value.
    pub value: Option<f64>,
    /// Fiscal year.
    pub fiscal_year: i32,
}

/// A company's position in the composite ranking.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RankedCompany {
    /// 1-based rank.
    pub rank: u32,
    /// Company id.
    pub company_id: i32,
    /// Company name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: Option<String>,
    /// Latest share price.
    pub share_price: Option<f64>,
    /// Latest market capitalisation.
    pub market_cap: Option<f64>,
    /// Composite score in `[0, 1]`.
    pub score: f64,
    /// Number of metrics averaged into the score.
    pub metrics_scored: u32,
    /// Fiscal year the score refers to.
    pub fiscal_year: i32,
}

struct Observation {
    company: usize,
    key: String,
    value: f64,
    direction: MetricDirection,
}

#[derive(Clone, Copy)]
struct Bounds {
    min: f64,
    max: f64,
}

impl Bounds {
    fn normalize(self, value: f64, direction: MetricDirection) -> f64 {
        let score = if self.max == self.min {
            FLAT_METRIC_SCORE
        } else {
            (value - self.min) / (self.max - self.min)
        };
        match direction {
            MetricDirection::HigherIsBetter => score,
            MetricDirection::LowerIsBetter => 1.0 - score,
        }
    }
}

/// Scores and ranks companies from one year's metric rows.
///
/// Companies appear once each, ordered by descending composite score; ties
/// keep the order in which companies first appear in `rows`. Unscored
/// metrics, NULL and non-finite values are skipped. When several rows of a
/// company map to the same canonical key, the last one counts. A company
/// with nothing scorable keeps a score of 0.0.
#[must_use]
pub fn score_companies(rows: &[MetricRow]) -> Vec<RankedCompany> {
    let mut companies: Vec<RankedCompany> = Vec::new();
    let mut index: HashMap<i32, usize> = HashMap::new();
    let mut observations: Vec<Observation> = Vec::with_capacity(rows.len());
    let mut slots: HashMap<(usize, String), usize> = HashMap::new();

    for row in rows {
        let company = *index.entry(row.company_id).or_insert_with(|| {
            companies.push(RankedCompany {
                rank: 0,
                company_id: row.company_id,
                name: row.company_name.clone(),
                symbol: row.symbol.clone(),
                share_price: row.share_price,
                market_cap: row.market_cap,
                score: 0.0,
                metrics_scored: 0,
                fiscal_year: row.fiscal_year,
            });
            companies.len() - 1
        });

        let Some(value) = row.value.filter(|v| v.is_finite()) else {
            continue;
        };
        let key = canonical_metric_key(&row.metric_name);
        let Some(direction) = metric_direction(&key) else {
            continue;
        };

        match slots.get(&(company, key.clone())) {
            Some(&slot) => observations[slot].value = value,
            None => {
                slots.insert((company, key.clone()), observations.len());
                observations.push(Observation {
                    company,
                    key,
                    value,
                    direction,
                });
            }
        }
    }

    let mut bounds: HashMap<&str, Bounds> = HashMap::new();
    for obs in &observations {
        bounds
            .entry(obs.key.as_str())
            .and_modify(|b| {
                b.min = b.min.min(obs.value);
                b.max = b.max.max(obs.value);
            })
            .or_insert(Bounds {
                min: obs.value,
                max: obs.value,
            });
    }

    let mut sums = vec![0.0_f64; companies.len()];
    for obs in &observations {
        let b = bounds[obs.key.as_str()];
        sums[obs.company] += b.normalize(obs.value, obs.direction);
        companies[obs.company].metrics_scored += 1;
    }

    for (company, sum) in companies.iter_mut().zip(sums) {
        if company.metrics_scored > 0 {
            company.score = sum / f64::from(company.metrics_scored);
        }
    }

    // sort_by is stable, so equal scores keep first-appearance order
    companies.sort_by(|a, b| b.score.total_cmp(&a.score));
    for (position, company) in companies.iter_mut().enumerate() {
        company.rank = position as u32 + 1;
    }

    companies
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(company_id: i32, metric: &str, value: Option<f64>) -> MetricRow {
        MetricRow {
            company_id,
            company_name: format!("Company {}", company_id),
            symbol: Some(format!("C{}", company_id)),
            share_price: Some(100.0),
            market_cap: Some(1_000_000.0),
            metric_name: metric.to_string(),
            value,
            fiscal_year: 2024,
        }
    }

    fn score_of(ranked: &[RankedCompany], company_id: i32) -> f64 {
        ranked
            .iter()
            .find(|c| c.company_id == company_id)
            .map(|c| c.score)
            .expect("company present")
    }

    #[test]
    fn test_two_companies_single_metric() {
        let ranked = score_companies(&[row(1, "ROE", Some(10.0)), row(2, "ROE", Some(20.0))]);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].company_id, 2);
        assert_eq!(ranked[0].score, 1.0);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].company_id, 1);
        assert_eq!(ranked[1].score, 0.0);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_flat_metric_scores_half() {
        let ranked = score_companies(&[row(1, "ROE", Some(7.0)), row(2, "ROE", Some(7.0))]);
        assert!(ranked.iter().all(|c| c.score == 0.5));

        let single = score_companies(&[row(1, "Debt Ratio", Some(0.3))]);
        assert_eq!(single[0].score, 0.5);
    }

    #[test]
    fn test_lower_is_better_is_complement() {
        let values = [3.0, 8.0, 11.0, 20.0];
        let higher: Vec<MetricRow> = values
            .iter()
            .enumerate()
            .map(|(i, v)| row(i as i32 + 1, "ROA", Some(*v)))
            .collect();
        let lower: Vec<MetricRow> = values
            .iter()
            .enumerate()
            .map(|(i, v)| row(i as i32 + 1, "Debt Ratio", Some(*v)))
            .collect();

        let higher = score_companies(&higher);
        let lower = score_companies(&lower);

        for id in 1..=values.len() as i32 {
            let expected = 1.0 - score_of(&higher, id);
            assert!((score_of(&lower, id) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_composite_is_mean_with_omission() {
        let ranked = score_companies(&[
            row(1, "ROE", Some(10.0)),
            row(1, "Debt Ratio", Some(0.8)),
            row(2, "ROE", Some(20.0)),
            row(2, "Debt Ratio", Some(0.2)),
            row(3, "ROE", Some(15.0)),
        ]);

        // company 1: roe 0.0, debt 0.0 -> 0.0
        // company 2: roe 1.0, debt 1.0 -> 1.0
        // company 3: roe 0.5 only -> 0.5
        assert_eq!(score_of(&ranked, 1), 0.0);
        assert_eq!(score_of(&ranked, 2), 1.0);
        assert_eq!(score_of(&ranked, 3), 0.5);

        let third = ranked.iter().find(|c| c.company_id == 3).expect("present");
        assert_eq!(third.metrics_scored, 1);
        assert_eq!(third.rank, 2);
    }

    #[test]
    fn test_unscored_and_missing_values_ignored() {
        let ranked = score_companies(&[
            row(1, "ROE", Some(10.0)),
            row(1, "PE Ratio", Some(5.0)),
            row(2, "ROE", Some(20.0)),
            row(2, "PE Ratio", Some(50.0)),
            row(3, "ROE", None),
            row(3, "ROE", Some(f64::NAN)),
        ]);

        assert_eq!(ranked.len(), 3);
        assert_eq!(score_of(&ranked, 1), 0.0);
        assert_eq!(score_of(&ranked, 2), 1.0);

        let third = ranked.iter().find(|c| c.company_id == 3).expect("present");
        assert_eq!(third.metrics_scored, 0);
        assert_eq!(third.score, 0.0);
    }

    #[test]
    fn test_aliases_pool_into_one_metric() {
        let ranked = score_companies(&[
            row(1, "Return on Equity (ROE) (%)", Some(10.0)),
            row(2, "ROE", Some(30.0)),
            row(3, " roe ", Some(20.0)),
        ]);

        assert_eq!(score_of(&ranked, 1), 0.0);
        assert_eq!(score_of(&ranked, 2), 1.0);
        assert_eq!(score_of(&ranked, 3), 0.5);
    }

    #[test]
    fn test_duplicate_canonical_metric_counts_once() {
        let ranked = score_companies(&[
            row(1, "ROE", Some(10.0)),
            row(1, "Return on Equity", Some(30.0)),
            row(1, "Debt Ratio", Some(0.9)),
            row(2, "ROE", Some(20.0)),
            row(2, "Debt Ratio", Some(0.1)),
        ]);

        let first = ranked.iter().find(|c| c.company_id == 1).expect("present");
        assert_eq!(first.metrics_scored, 2);
        // roe 30 is the max (1.0), debt 0.9 is the worst (0.0)
        assert_eq!(first.score, 0.5);

        let second = ranked.iter().find(|c| c.company_id == 2).expect("present");
        assert_eq!(second.metrics_scored, 2);
        // roe 20 of [20, 30] -> 0.0, debt 0.1 -> 1.0
        assert_eq!(second.score, 0.5);
    }

    #[test]
    fn test_duplicate_keeps_last_finite_value() {
        let ranked = score_companies(&[
            row(1, "ROE", Some(50.0)),
            row(1, "Return on Equity (%)", Some(10.0)),
            row(1, "ROE (%)", None),
            row(2, "ROE", Some(20.0)),
        ]);

        // company 1 counts 10, so the overwritten 50 does not widen the range
        assert_eq!(ranked[0].company_id, 2);
        assert_eq!(ranked[0].score, 1.0);
        assert_eq!(ranked[1].score, 0.0);
        assert_eq!(ranked[1].metrics_scored, 1);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = score_companies(&[
            row(5, "ROE", Some(1.0)),
            row(3, "ROE", Some(1.0)),
            row(9, "ROE", Some(1.0)),
        ]);

        let order: Vec<i32> = ranked.iter().map(|c| c.company_id).collect();
        assert_eq!(order, vec![5, 3, 9]);
    }

    #[test]
    fn test_ranks_are_dense_sequence() {
        let rows: Vec<MetricRow> = (1..=25)
            .flat_map(|id| {
                vec![
                    row(id, "ROE", Some(f64::from(id % 7))),
                    row(id, "Current Ratio (x)", Some(f64::from(id % 4))),
                    row(id, "Net Debt/Equity (x)", Some(f64::from(id % 5))),
                ]
            })
            .collect();

        let ranked = score_companies(&rows);
        let ranks: Vec<u32> = ranked.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, (1..=25).collect::<Vec<u32>>());

        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for company in &ranked {
            assert!((0.0..=1.0).contains(&company.score));
        }
    }

    #[test]
    fn test_company_fields_carried() {
        let ranked = score_companies(&[row(4, "ROE", Some(1.0))]);
        let company = &ranked[0];
        assert_eq!(company.name, "Company 4");
        assert_eq!(company.symbol.as_deref(), Some("C4"));
        assert_eq!(company.share_price, Some(100.0));
        assert_eq!(company.market_cap, Some(1_000_000.0));
        assert_eq!(company.fiscal_year, 2024);
    }

    #[test]
    fn test_empty_input() {
        assert!(score_companies(&[]).is_empty());
    }
}
