//! Canonical metric keys and their scoring direction.

/// Whether larger raw values are preferable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDirection {
    /// Larger is better (margins, returns, coverage).
    HigherIsBetter,
    /// Smaller is better (leverage, tax, NPA).
    LowerIsBetter,
}

/// Display names (lower-cased) mapped to canonical keys.
const METRIC_ALIASES: &[(&str, &str)] = &[
    ("earnings per share", "eps"),
    ("basic eps", "basic_eps"),
    ("basic eps (rs.)", "basic_eps"),
    ("basic eps (₹)", "basic_eps"),
    ("basic earnings", "basic_eps"),
    ("basic earnings per share", "basic_eps"),
    ("diluted eps", "diluted_eps"),
    ("diluted eps (rs.)", "diluted_eps"),
    ("diluted eps (₹)", "diluted_eps"),
    ("diluted earnings per share", "diluted_eps"),
    ("cash eps", "cash_eps"),
    ("cash eps (rs.)", "cash_eps"),
    ("cash eps (₹)", "cash_eps"),
    ("book value / share", "book_value_share"),
    ("book value/share (₹)", "book_value_share"),
    ("book value per share", "book_value_share"),
    ("dividend / share", "dividend_share"),
    ("dividend/share (₹)", "dividend_share"),
    ("revenue from operations / share", "revenue_from_operations_share"),
    ("revenue from operations/share (₹)", "revenue_from_operations_share"),
    ("pbdit / share", "pbdit_share"),
    ("pbdit/share (₹)", "pbdit_share"),
    ("pbit / share", "pbit_share"),
    ("pbit/share (₹)", "pbit_share"),
    ("pbt / share", "pbt_share"),
    ("pbt/share (₹)", "pbt_share"),
    ("net profit / share", "net_profit_share"),
    ("net profit/share (₹)", "net_profit_share"),
    ("gross profit margin", "gross_profit_margin"),
    ("gross profit margin (%)", "gross_profit_margin"),
    ("net profit margin", "net_profit_margin"),
    ("net profit margin (%)", "net_profit_margin"),
    ("operating profit margin", "operating_profit_margin"),
    ("operating profit margin (%)", "operating_profit_margin"),
    ("ebit margin", "ebit_margin"),
    ("ebit margin (%)", "ebit_margin"),
    ("ebitda margin", "ebitda_margin"),
    ("ebitda margin (%)", "ebitda_margin"),
    ("return on equity", "roe"),
    ("return on equity (roe) (%)", "roe"),
    ("roe (%)", "roe"),
    ("return on assets", "roa"),
    ("return on assets (roa) (%)", "roa"),
    ("roa (%)", "roa"),
    ("return on capital employed", "roce"),
    ("return on capital employed (roce) (%)", "roce"),
    ("roce (%)", "roce"),
    ("return on investment", "return_on_investment"),
    ("retention ratio", "retention_ratio"),
    ("retention ratio (%)", "retention_ratio"),
    ("current ratio", "current_ratio_x"),
    ("current ratio (x)", "current_ratio_x"),
    ("quick ratio", "quick_ratio_x"),
    ("quick ratio (x)", "quick_ratio_x"),
    ("cash ratio", "cash_ratio_x"),
    ("cash ratio (x)", "cash_ratio_x"),
    ("interest coverage ratio", "interest_coverage_ratio_x"),
    ("interest coverage ratio (x)", "interest_coverage_ratio_x"),
    ("shareholders equity ratio", "shareholder_equity_ratio"),
    ("shareholder equity ratio", "shareholder_equity_ratio"),
    ("shareholder equity ratio (%)", "shareholder_equity_ratio"),
    ("altman z score", "altman_z_score"),
    ("altman z-score", "altman_z_score"),
    ("operating leverage ratio (x)", "operating_leverage_ratio_x"),
    ("asset turnover ratio", "asset_turnover_ratio"),
    ("asset turnover ratio (%)", "asset_turnover_ratio"),
    ("inventory turnover ratio", "inventory_turnover_ratio"),
    ("receivables turnover ratio", "receivables_turnover_ratio"),
    ("payables turnover ratio", "payables_turnover_ratio"),
    ("debt/equity", "total_debt_equity_x"),
    ("debt / equity (x)", "total_debt_equity_x"),
    ("total debt / equity (x)", "total_debt_equity_x"),
    ("total debt/equity (x)", "total_debt_equity_x"),
    ("debt ratio", "debt_ratio"),
    ("long term debt / equity (x)", "long_term_debt_equity_x"),
    ("long-term debt/equity (x)", "long_term_debt_equity_x"),
    ("short term debt / equity (x)", "short_term_debt_equity_x"),
    ("short-term debt/equity (x)", "short_term_debt_equity_x"),
    ("net debt / equity (x)", "net_debt_equity_x"),
    ("net debt/equity (x)", "net_debt_equity_x"),
    ("effective tax rate", "effective_tax_rate"),
    ("effective tax rate (%)", "effective_tax_rate"),
    ("cost to income ratio", "cost_to_income_ratio"),
    ("nonperforming assets ratio", "nonperforming_assets_ratio"),
    ("gross npa ratio", "gross_npa_ratio"),
    ("net npa ratio", "net_npa_ratio"),
];

const HIGHER_IS_BETTER: &[&str] = &[
    "basic_eps",
    "diluted_eps",
    "cash_eps",
    "book_value_share",
    "dividend_share",
    "revenue_from_operations_share",
    "pbdit_share",
    "pbit_share",
    "pbt_share",
    "net_profit_share",
    "gross_profit_margin",
    "net_profit_margin",
    "operating_profit_margin",
    "ebit_margin",
    "ebitda_margin",
    "return_on_investment",
    "roe",
    "roa",
    "roce",
    "retention_ratio",
    "current_ratio_x",
    "quick_ratio_x",
    "cash_ratio_x",
    "interest_coverage_ratio_x",
    "shareholder_equity_ratio",
    "altman_z_score",
    "operating_leverage_ratio_x",
    "asset_turnover_ratio",
    "inventory_turnover_ratio",
    "receivables_turnover_ratio",
    "payables_turnover_ratio",
];

const LOWER_IS_BETTER: &[&str] = &[
    "total_debt_equity_x",
    "debt_ratio",
    "long_term_debt_equity_x",
    "short_term_debt_equity_x",
    "net_debt_equity_x",
    "effective_tax_rate",
    "cost_to_income_ratio",
    "nonperforming_assets_ratio",
    "gross_npa_ratio",
    "net_npa_ratio",
];

/// Phrases rewritten inside longer names, applied in order.
const PHRASE_REPLACEMENTS: &[(&str, &str)] = &[
    ("earnings per share", "eps"),
    ("basic earnings per share", "basic_eps"),
    ("basic earnings", "basic_eps"),
    ("diluted earnings per share", "diluted_eps"),
    ("cash eps", "cash_eps"),
    ("book value / share", "book_value_share"),
    ("book value per share", "book_value_share"),
    ("dividend / share", "dividend_share"),
    ("revenue from operations / share", "revenue_from_operations_share"),
    ("pbdit / share", "pbdit_share"),
    ("pbit / share", "pbit_share"),
    ("pbt / share", "pbt_share"),
    ("net profit / share", "net_profit_share"),
    ("gross profit margin", "gross_profit_margin"),
    ("operating profit margin", "operating_profit_margin"),
    ("net profit margin", "net_profit_margin"),
    ("ebit margin", "ebit_margin"),
    ("ebitda margin", "ebitda_margin"),
    ("return on equity", "roe"),
    ("return on assets", "roa"),
    ("return on capital employed", "roce"),
    ("return on investment", "return_on_investment"),
    ("retention ratio", "retention_ratio"),
    ("inventory turnover ratio", "inventory_turnover_ratio"),
    ("receivables turnover ratio", "receivables_turnover_ratio"),
    ("payables turnover ratio", "payables_turnover_ratio"),
    ("shareholders equity ratio", "shareholder_equity_ratio"),
    ("altman z score", "altman_z_score"),
    ("cash ratio (x)", "cash_ratio_x"),
    ("current ratio (x)", "current_ratio_x"),
    ("quick ratio (x)", "quick_ratio_x"),
    ("interest coverage ratio (x)", "interest_coverage_ratio_x"),
    ("operating leverage ratio (x)", "operating_leverage_ratio_x"),
    ("asset turnover ratio", "asset_turnover_ratio"),
    ("long term debt / equity (x)", "long_term_debt_equity_x"),
    ("short term debt / equity (x)", "short_term_debt_equity_x"),
    ("net debt / equity (x)", "net_debt_equity_x"),
    ("total debt / equity (x)", "total_debt_equity_x"),
    ("debt / equity (x)", "total_debt_equity_x"),
    ("debt ratio", "debt_ratio"),
    ("effective tax rate (%)", "effective_tax_rate"),
    ("cost to income ratio", "cost_to_income_ratio"),
    ("gross npa ratio", "gross_npa_ratio"),
    ("net npa ratio", "net_npa_ratio"),
];

/// Characters treated as word separators before snake-casing.
const SEPARATORS: &[char] = &['₹', '(', ')', '%', '/', '-'];

/// Maps a free-text metric name to its canonical key.
///
/// A trimmed, lower-cased name that is a known alias maps straight to its
/// key. Anything else has known phrases rewritten in place, then unit and
/// punctuation characters dropped and the words joined with `_`, so
/// `"Return on Equity (%)"` becomes `roe` and `"PE Ratio"` becomes
/// `pe_ratio`.
#[must_use]
pub fn canonical_metric_key(name: &str) -> String {
    let normalized = name.trim().to_lowercase();
    if let Some((_, key)) = METRIC_ALIASES.iter().find(|(alias, _)| *alias == normalized) {
        return (*key).to_string();
    }

    let rewritten = PHRASE_REPLACEMENTS
        .iter()
        .fold(normalized, |name, (phrase, key)| {
            if name.contains(phrase) {
                name.replace(phrase, key)
            } else {
                name
            }
        });

    snake_case(&rewritten)
}

fn snake_case(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();

    spaced
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("_")
        .trim_matches('_')
        .to_string()
}

/// Scoring direction of a canonical key, `None` if the metric is not scored.
#[must_use]
pub fn metric_direction(key: &str) -> Option<MetricDirection> {
    if HIGHER_IS_BETTER.contains(&key) {
        Some(MetricDirection::HigherIsBetter)
    } else if LOWER_IS_BETTER.contains(&key) {
        Some(MetricDirection::LowerIsBetter)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_lookup_ignores_case_and_padding() {
        assert_eq!(canonical_metric_key("  Return on Equity (ROE) (%) "), "roe");
        assert_eq!(canonical_metric_key("Total Debt/Equity (x)"), "total_debt_equity_x");
        assert_eq!(canonical_metric_key("Basic EPS (Rs.)"), "basic_eps");
        assert_eq!(canonical_metric_key("Debt/Equity"), "total_debt_equity_x");
    }

    #[test]
    fn test_unknown_names_are_snake_cased() {
        assert_eq!(canonical_metric_key("ROE"), "roe");
        assert_eq!(canonical_metric_key(" PE Ratio "), "pe_ratio");
        assert_eq!(canonical_metric_key("Price to Book (x)"), "price_to_book_x");
        assert_eq!(canonical_metric_key("EV/EBITDA"), "ev_ebitda");
        assert_eq!(canonical_metric_key(""), "");
    }

    #[test]
    fn test_unit_suffix_variants_are_scored() {
        assert_eq!(canonical_metric_key("Debt Ratio (%)"), "debt_ratio");
        assert_eq!(canonical_metric_key("Return on Equity (%)"), "roe");
        assert_eq!(canonical_metric_key("Net Profit Margin(%)"), "net_profit_margin");
        assert_eq!(
            canonical_metric_key("Net Debt / Equity (x)"),
            "net_debt_equity_x"
        );

        for name in ["Debt Ratio (%)", "Return on Equity (%)", "Net Profit Margin(%)"] {
            assert!(
                metric_direction(&canonical_metric_key(name)).is_some(),
                "{name} not scored"
            );
        }
    }

    #[test]
    fn test_direction_sets() {
        assert_eq!(metric_direction("roe"), Some(MetricDirection::HigherIsBetter));
        assert_eq!(
            metric_direction("debt_ratio"),
            Some(MetricDirection::LowerIsBetter)
        );
        assert_eq!(metric_direction("pe_ratio"), None);
        assert_eq!(metric_direction("eps"), None);
    }

    #[test]
    fn test_every_alias_target_is_lowercase_snake_case() {
        for (alias, key) in METRIC_ALIASES {
            assert_eq!(*alias, alias.to_lowercase(), "alias {alias} not lower-case");
            assert!(
                key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "key {key} is not snake case"
            );
        }
    }

    #[test]
    fn test_direction_sets_are_disjoint() {
        for key in HIGHER_IS_BETTER {
            assert!(!LOWER_IS_BETTER.contains(key), "{key} in both sets");
        }
    }
}
