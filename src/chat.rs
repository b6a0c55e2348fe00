//! Keyword commands answered by the `/chat` endpoint.
//!
//! A message is matched against a fixed set of phrases and answered from the
//! company data. Nothing here touches the database; [`parse`] picks the
//! command and the `format_*` functions render the reply text.

use crate::db::NamedMetricValue;
use crate::ranking::{RankedCompany, canonical_metric_key};

/// Reply to a blank message.
pub const EMPTY_MESSAGE_REPLY: &str = "Please type something.";

/// Reply when no command matches.
pub const UNSUPPORTED_REPLY: &str = "Sorry, I can only answer: list companies, top companies \
     [year], all scores [year], summary of <company> [year], or <company> <metric> [year].";

/// Companies shown by the listing command.
pub const LIST_LIMIT: usize = 20;
/// Entries shown by the score table.
pub const ALL_SCORES_LIMIT: usize = 20;
/// Entries shown by the top companies command.
pub const TOP_LIMIT: usize = 10;

/// A recognised chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Blank input.
    Empty,
    /// First companies by name.
    ListCompanies,
    /// Score table for a year.
    AllScores { year: i32 },
    /// Best companies of a year.
    TopCompanies { year: i32 },
    /// Every metric of companies matching `company`.
    Summary { company: String, year: i32 },
    /// `<company> <metric>` text still to be matched against company names.
    Lookup { text: String, year: i32 },
    /// Nothing matched.
    Unsupported,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || !b.is_ascii()
}

fn is_year_token(token: &str) -> bool {
    token.len() == 4 && token.starts_with("20") && token.bytes().all(|b| b.is_ascii_digit())
}

/// First standalone `20xx` number in `text`.
pub(crate) fn find_year(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    (0..bytes.len().saturating_sub(3)).find_map(|i| {
        let candidate = &bytes[i..i + 4];
        let standalone = (i == 0 || !is_word_byte(bytes[i - 1]))
            && (i + 4 == bytes.len() || !is_word_byte(bytes[i + 4]));
        (standalone
            && candidate.starts_with(b"20")
            && candidate.iter().all(u8::is_ascii_digit))
        .then(|| {
            candidate
                .iter()
                .fold(0, |year, digit| year * 10 + i32::from(digit - b'0'))
        })
    })
}

/// Chooses the command for `message`.
///
/// Phrase commands are checked in order on the lower-cased text. The year is
/// the first standalone `20xx` number, else `default_year`; for a lookup a
/// trailing year token takes precedence. A trailing year is removed from the
/// company of a summary and from lookup text.
#[must_use]
pub fn parse(message: &str, default_year: i32) -> ChatCommand {
    let message = message.trim();
    if message.is_empty() {
        return ChatCommand::Empty;
    }

    let lower = message.to_lowercase();
    let year = find_year(&lower).unwrap_or(default_year);

    if lower.contains("list companies") || lower.contains("show companies") {
        return ChatCommand::ListCompanies;
    }
    if lower.contains("all scores") || lower.contains("company scores") {
        return ChatCommand::AllScores { year };
    }
    if lower.contains("top 10 companies") || lower.contains("top companies") {
        return ChatCommand::TopCompanies { year };
    }
    if lower.starts_with("summary of") {
        let mut words: Vec<&str> = message.split_whitespace().skip(2).collect();
        if words.last().is_some_and(|w| is_year_token(w)) {
            words.pop();
        }
        if words.is_empty() {
            return ChatCommand::Unsupported;
        }
        return ChatCommand::Summary {
            company: words.join(" "),
            year,
        };
    }

    let tokens: Vec<&str> = message.split_whitespace().collect();
    match tokens.as_slice() {
        [] | [_] => ChatCommand::Unsupported,
        [rest @ .., last] if is_year_token(last) => ChatCommand::Lookup {
            text: rest.join(" "),
            year: last.parse().unwrap_or(year),
        },
        _ => ChatCommand::Lookup {
            text: message.to_string(),
            year,
        },
    }
}

/// Splits lookup text into a known company name and the metric after it.
///
/// Longer names are tried first so that a name which prefixes another does
/// not shadow it. Returns `None` when no name prefixes the text or nothing
/// follows the name.
#[must_use]
pub fn match_company<'a>(text: &'a str, companies: &'a [String]) -> Option<(&'a str, &'a str)> {
    let mut names: Vec<&String> = companies.iter().collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));

    names.into_iter().find_map(|name| {
        let head = text.get(..name.len())?;
        if !head.eq_ignore_ascii_case(name) {
            return None;
        }
        let metric = text[name.len()..].trim();
        (!metric.is_empty()).then_some((name.as_str(), metric))
    })
}

/// Capitalises the first letter of each alphabetic run.
pub(crate) fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

/// Lists the first [`LIST_LIMIT`] company names.
#[must_use]
pub fn format_company_list(names: &[String]) -> String {
    if names.is_empty() {
        return "No companies found.".to_string();
    }
    let shown = &names[..names.len().min(LIST_LIMIT)];
    let lines: Vec<String> = shown.iter().map(|name| format!("- {}", name)).collect();
    format!(
        "Companies (showing first {}):\n{}",
        shown.len(),
        lines.join("\n")
    )
}

/// Renders the best `limit` scored companies of a ranking under `heading`.
///
/// Companies without any scored metric are left out.
#[must_use]
pub fn format_scores(ranking: &[RankedCompany], year: i32, limit: usize, heading: &str) -> String {
    let lines: Vec<String> = ranking
        .iter()
        .filter(|company| company.metrics_scored > 0)
        .take(limit)
        .map(|company| format!("- {}: {:.4}", company.name, company.score))
        .collect();

    if lines.is_empty() {
        return format!("No scores found for {}.", year);
    }
    format!("{} ({}):\n{}", heading, year, lines.join("\n"))
}

/// Canonical key to (stored name, value), keeping the first position of a key
/// and the last value reported for it.
fn by_canonical_key(rows: &[NamedMetricValue]) -> Vec<(String, &str, Option<f64>)> {
    let mut entries: Vec<(String, &str, Option<f64>)> = Vec::new();
    for row in rows {
        let key = canonical_metric_key(&row.name);
        match entries.iter_mut().find(|(k, _, _)| *k == key) {
            Some(entry) => {
                entry.1 = row.name.as_str();
                entry.2 = row.value;
            }
            None => entries.push((key, row.name.as_str(), row.value)),
        }
    }
    entries
}

/// Lists every metric of a company for a year under canonical keys.
#[must_use]
pub fn format_summary(company: &str, year: i32, rows: &[NamedMetricValue]) -> String {
    if rows.is_empty() {
        return format!("No data found for {} in {}.", company, year);
    }
    let lines: Vec<String> = by_canonical_key(rows)
        .into_iter()
        .map(|(key, _, value)| format!("- {}: {}", key, format_value(value)))
        .collect();
    format!(
        "Summary of {} ({}):\n{}",
        title_case(company),
        year,
        lines.join("\n")
    )
}

/// Answers a single metric of a company.
///
/// An exact canonical match wins; otherwise the first key that contains the
/// requested one, or is contained by it.
#[must_use]
pub fn format_company_metric(
    company: &str,
    metric: &str,
    year: i32,
    rows: &[NamedMetricValue],
) -> String {
    if rows.is_empty() {
        return format!("No data found for {} in {}.", company, year);
    }

    let entries = by_canonical_key(rows);
    let needle = canonical_metric_key(metric);
    let found = entries
        .iter()
        .find(|(key, _, _)| *key == needle)
        .or_else(|| {
            entries
                .iter()
                .find(|(key, _, _)| key.contains(&needle) || needle.contains(key.as_str()))
        });

    match found {
        Some((_, name, value)) => format!(
            "{} - {} in {}: {}",
            title_case(company),
            name,
            year,
            format_value(*value)
        ),
        None => format!("Metric '{}' not found for {} in {}.", metric, company, year),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, value: Option<f64>) -> NamedMetricValue {
        NamedMetricValue {
            name: name.to_string(),
            fiscal_year: 2024,
            value,
        }
    }

    fn ranked(name: &str, score: f64, metrics_scored: u32) -> RankedCompany {
        RankedCompany {
            rank: 0,
            company_id: 0,
            name: name.to_string(),
            symbol: None,
            share_price: None,
            market_cap: None,
            score,
            metrics_scored,
            fiscal_year: 2024,
        }
    }

    #[test]
    fn test_find_year() {
        assert_eq!(find_year("top companies 2023"), Some(2023));
        assert_eq!(find_year("2022 and 2021"), Some(2022));
        assert_eq!(find_year("fy2023 numbers"), None);
        assert_eq!(find_year("12023"), None);
        assert_eq!(find_year("1999"), None);
        assert_eq!(find_year("(2021)"), Some(2021));
        assert_eq!(find_year(""), None);
    }

    #[test]
    fn test_parse_phrase_commands() {
        assert_eq!(parse("   ", 2024), ChatCommand::Empty);
        assert_eq!(parse("Please list companies", 2024), ChatCommand::ListCompanies);
        assert_eq!(
            parse("all scores 2022", 2024),
            ChatCommand::AllScores { year: 2022 }
        );
        assert_eq!(
            parse("Top 10 companies", 2024),
            ChatCommand::TopCompanies { year: 2024 }
        );
        assert_eq!(
            parse("Summary of Tata Motors 2023", 2024),
            ChatCommand::Summary {
                company: "Tata Motors".to_string(),
                year: 2023
            }
        );
    }

    #[test]
    fn test_parse_lookup_strips_trailing_year() {
        assert_eq!(
            parse("Infosys ROE 2022", 2024),
            ChatCommand::Lookup {
                text: "Infosys ROE".to_string(),
                year: 2022
            }
        );
        assert_eq!(
            parse("Infosys current ratio", 2024),
            ChatCommand::Lookup {
                text: "Infosys current ratio".to_string(),
                year: 2024
            }
        );
        assert_eq!(parse("hello", 2024), ChatCommand::Unsupported);
        assert_eq!(parse("summary of 2023", 2024), ChatCommand::Unsupported);
    }

    #[test]
    fn test_match_company_prefers_longest_name() {
        let companies = vec!["Tata".to_string(), "Tata Motors".to_string()];

        assert_eq!(
            match_company("tata motors roe", &companies),
            Some(("Tata Motors", "roe"))
        );
        assert_eq!(
            match_company("Tata Debt Ratio", &companies),
            Some(("Tata", "Debt Ratio"))
        );
        assert_eq!(match_company("Tata Motors", &companies), None);
        assert_eq!(match_company("Wipro roe", &companies), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("tata motors"), "Tata Motors");
        assert_eq!(title_case("HDFC bank-ltd"), "Hdfc Bank-Ltd");
    }

    #[test]
    fn test_format_scores_skips_unscored() {
        let ranking = vec![
            ranked("Alpha", 0.91234, 3),
            ranked("Beta", 0.5, 1),
            ranked("Gamma", 0.0, 0),
        ];

        assert_eq!(
            format_scores(&ranking, 2024, 1, "Top 10 Companies"),
            "Top 10 Companies (2024):\n- Alpha: 0.9123"
        );
        assert!(!format_scores(&ranking, 2024, 10, "Scores").contains("Gamma"));
        assert_eq!(
            format_scores(&[ranked("Gamma", 0.0, 0)], 2021, 10, "Scores"),
            "No scores found for 2021."
        );
    }

    #[test]
    fn test_format_company_list() {
        let names: Vec<String> = (0..25).map(|i| format!("Company {:02}", i)).collect();
        let reply = format_company_list(&names);

        assert!(reply.starts_with("Companies (showing first 20):\n- Company 00"));
        assert!(!reply.contains("Company 20"));
        assert_eq!(format_company_list(&[]), "No companies found.");
    }

    #[test]
    fn test_summary_merges_canonical_aliases() {
        let rows = vec![
            row("Return on Equity (%)", Some(12.0)),
            row("Current Ratio (X)", None),
            row("ROE", Some(14.5)),
        ];

        assert_eq!(
            format_summary("infosys", 2024, &rows),
            "Summary of Infosys (2024):\n- roe: 14.5\n- current_ratio_x: n/a"
        );
        assert_eq!(
            format_summary("nobody", 2020, &[]),
            "No data found for nobody in 2020."
        );
    }

    #[test]
    fn test_company_metric_exact_then_partial() {
        let rows = vec![
            row("Total Debt/Equity (X)", Some(0.4)),
            row("Return on Equity (%)", Some(12.0)),
        ];

        assert_eq!(
            format_company_metric("Infosys", "roe", 2024, &rows),
            "Infosys - Return on Equity (%) in 2024: 12"
        );
        assert_eq!(
            format_company_metric("Infosys", "debt equity", 2024, &rows),
            "Infosys - Total Debt/Equity (X) in 2024: 0.4"
        );
        assert_eq!(
            format_company_metric("Infosys", "book value", 2024, &rows),
            "Metric 'book value' not found for Infosys in 2024."
        );
    }
}
