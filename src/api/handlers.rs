//! Company data request handlers.

use crate::chat::{self, ChatCommand};
use crate::db::{self, Company, CompanyMetricValue, NamedMetricValue};
use crate::error::ApiError;
use crate::models::{
    ChatRequest, ChatResponse, CompanyEpsRow, FeedbackRequest, HealthResponse, KeyRatio, MessageResponse, MetricHistoryResponse,
    MetricPoint, SearchQuery, SearchSuggestion, YearQuery,
};
use crate::ranking::{RankedCompany, canonical_metric_key, score_companies};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Years of history returned by the metric endpoint.
const METRIC_HISTORY_YEARS: i64 = 5;

/// Canonical keys shown on the company overview.
const KEY_RATIO_KEYS: &[&str] = &["roe", "total_debt_equity_x", "current_ratio_x"];

/// Accepted fiscal year range.
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// Resolves the `year` query parameter.
///
/// Absent or blank means `default`.
pub(crate) fn resolve_year(raw: Option<&str>, default: i32) -> Result<i32, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };

    match raw.parse::<i32>() {
        Ok(year) if (MIN_YEAR..=MAX_YEAR).contains(&year) => Ok(year),
        _ => Err(ApiError::InvalidRequest(format!(
            "Invalid year: {}. Expected a fiscal year such as 2024",
            raw
        ))),
    }
}

/// Builds one EPS row per company from a year's metric values.
///
/// The first value seen for a canonical key wins.
pub(crate) fn pivot_eps(
    companies: Vec<Company>,
    values: &[CompanyMetricValue],
    year: i32,
) -> Vec<CompanyEpsRow> {
    let mut by_company: HashMap<i32, [Option<f64>; 3]> = HashMap::new();

    for value in values {
        let slot = match canonical_metric_key(&value.metric_name).as_str() {
            "basic_eps" => 0,
            "diluted_eps" => 1,
            "cash_eps" => 2,
            _ => continue,
        };
        let entry = by_company.entry(value.company_id).or_default();
        if entry[slot].is_none() {
            entry[slot] = value.value;
        }
    }

    companies
        .into_iter()
        .map(|company| {
            let [basic_eps, diluted_eps, cash_eps] =
                by_company.get(&company.company_id).copied().unwrap_or_default();
            CompanyEpsRow {
                company_id: company.company_id,
                name: company.name,
                symbol: company.symbol,
                basic_eps,
                diluted_eps,
                cash_eps,
                fiscal_year: year,
            }
        })
        .collect()
}

/// Keeps the overview ratios, preserving row order.
pub(crate) fn select_key_ratios(rows: Vec<NamedMetricValue>) -> Vec<KeyRatio> {
    rows.into_iter()
        .filter(|row| KEY_RATIO_KEYS.contains(&canonical_metric_key(&row.name).as_str()))
        .map(|row| KeyRatio {
            name: row.name,
            fiscal_year: row.fiscal_year,
            value: row.value,
        })
        .collect()
}

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Companies
// ============================================================================

/// List all companies.
#[utoipa::path(
    get,
    path = "/api/companies",
    responses(
        (status = 200, description = "All companies", body = Vec<Company>),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    ),
    tag = "Companies"
)]
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Company>>, ApiError> {
    let companies = db::list_companies(state.db.pool()).await?;
    Ok(Json(companies))
}

/// Composite ranking of companies for a fiscal year.
#[utoipa::path(
    get,
    path = "/api/companies1",
    params(YearQuery),
    responses(
        (status = 200, description = "Companies ranked by composite score", body = Vec<RankedCompany>),
        (status = 400, description = "Invalid year", body = crate::error::ErrorResponse),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    ),
    tag = "Companies"
)]
pub async fn get_rankings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<RankedCompany>>, ApiError> {
    let year = resolve_year(query.year.as_deref(), state.config.ranking.default_year)?;
    let ranking = ranking_for_year(&state, year).await?;
    Ok(Json(ranking.as_ref().clone()))
}

/// Cached ranking of `year`, computed on a miss.
async fn ranking_for_year(
    state: &AppState,
    year: i32,
) -> Result<Arc<Vec<RankedCompany>>, ApiError> {
    state
        .rankings
        .get_or_try_compute(year, || async {
            let rows = db::fetch_ranking_rows(state.db.pool(), year).await?;
            let ranked = score_companies(&rows);
            info!(year, rows = rows.len(), companies = ranked.len(), "Computed ranking");
            Ok::<_, ApiError>(ranked)
        })
        .await
}

/// EPS figures of every company for a fiscal year.
#[utoipa::path(
    get,
    path = "/api/companies-with-metrics",
    params(YearQuery),
    responses(
        (status = 200, description = "EPS per company", body = Vec<CompanyEpsRow>),
        (status = 400, description = "Invalid year", body = crate::error::ErrorResponse),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    ),
    tag = "Companies"
)]
pub async fn companies_with_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<CompanyEpsRow>>, ApiError> {
    let year = resolve_year(query.year.as_deref(), state.config.ranking.default_year)?;

    let companies = db::list_companies(state.db.pool()).await?;
    let values = db::fetch_year_values(state.db.pool(), year).await?;

    Ok(Json(pivot_eps(companies, &values, year)))
}

/// Key ratios of a company.
#[utoipa::path(
    get,
    path = "/api/company/{company}/metrics",
    params(
        ("company" = i32, Path, description = "Company id")
    ),
    responses(
        (status = 200, description = "ROE, debt/equity and current ratio by year", body = Vec<KeyRatio>),
        (status = 400, description = "Non-numeric company id", body = crate::error::ErrorResponse)
    ),
    tag = "Companies"
)]
pub async fn company_key_ratios(
    State(state): State<Arc<AppState>>,
    Path(company): Path<String>,
) -> Result<Json<Vec<KeyRatio>>, ApiError> {
    let company_id: i32 = company
        .trim()
        .parse()
        .map_err(|_| ApiError::InvalidRequest(format!("Invalid company id: {}", company)))?;

    let rows = db::fetch_company_values(state.db.pool(), company_id).await?;
    Ok(Json(select_key_ratios(rows)))
}

/// Recent history of one metric for a company.
#[utoipa::path(
    get,
    path = "/api/company/{company}/metric/{metric}",
    params(
        ("company" = String, Path, description = "Exact company name"),
        ("metric" = String, Path, description = "Metric name, case-insensitive")
    ),
    responses(
        (status = 200, description = "Last five fiscal years, newest first", body = MetricHistoryResponse),
        (status = 404, description = "Company, metric or data not found", body = crate::error::ErrorResponse)
    ),
    tag = "Companies"
)]
pub async fn company_metric_history(
    State(state): State<Arc<AppState>>,
    Path((company, metric)): Path<(String, String)>,
) -> Result<Json<MetricHistoryResponse>, ApiError> {
    let pool = state.db.pool();

    let company_id = db::find_company_id(pool, &company)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    let (metric_id, metric_name) = db::find_metric(pool, &metric)
        .await?
        .ok_or_else(|| ApiError::NotFound("Metric not found".to_string()))?;

    let values = db::fetch_metric_history(pool, company_id, metric_id, METRIC_HISTORY_YEARS).await?;
    if values.is_empty() {
        return Err(ApiError::NotFound(
            "No data found for this metric".to_string(),
        ));
    }

    Ok(Json(MetricHistoryResponse {
        company_name: company,
        metric_name,
        values: values
            .into_iter()
            .map(|v| MetricPoint {
                fiscal_year: v.fiscal_year,
                value: v.value,
            })
            .collect(),
    }))
}

/// Company name and symbol suggestions.
#[utoipa::path(
    get,
    path = "/api/search-suggestions",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching companies by name", body = Vec<SearchSuggestion>)
    ),
    tag = "Companies"
)]
pub async fn search_suggestions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchSuggestion>>, ApiError> {
    let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(Json(Vec::new()));
    };

    let companies =
        db::search_companies(state.db.pool(), q, state.config.search.suggestion_limit).await?;
    debug!(query = q, matches = companies.len(), "Search suggestions");

    Ok(Json(
        companies
            .into_iter()
            .map(|c| SearchSuggestion {
                company_id: c.company_id,
                name: c.name,
                symbol: c.symbol,
            })
            .collect(),
    ))
}

// ============================================================================
// Chat
// ============================================================================

/// Answer a keyword chat command from the company data.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply text", body = ChatResponse),
        (status = 500, description = "Database error", body = crate::error::ErrorResponse)
    ),
    tag = "Chat"
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = body.message.unwrap_or_default();
    let command = chat::parse(&message, state.config.ranking.default_year);
    debug!(?command, "Chat command");

    let pool = state.db.pool();
    let response = match command {
        ChatCommand::Empty => chat::EMPTY_MESSAGE_REPLY.to_string(),
        ChatCommand::ListCompanies => {
            let names = company_names(&state).await?;
            chat::format_company_list(&names)
        }
        ChatCommand::AllScores { year } => {
            let ranking = ranking_for_year(&state, year).await?;
            let heading = format!("Top {} Company Scores", chat::ALL_SCORES_LIMIT);
            chat::format_scores(&ranking, year, chat::ALL_SCORES_LIMIT, &heading)
        }
        ChatCommand::TopCompanies { year } => {
            let ranking = ranking_for_year(&state, year).await?;
            let heading = format!("Top {} Companies", chat::TOP_LIMIT);
            chat::format_scores(&ranking, year, chat::TOP_LIMIT, &heading)
        }
        ChatCommand::Summary { company, year } => {
            let rows = db::fetch_company_year_values(pool, &company, year).await?;
            chat::format_summary(&company, year, &rows)
        }
        ChatCommand::Lookup { text, year } => {
            let names = company_names(&state).await?;
            match chat::match_company(&text, &names) {
                Some((company, metric)) => {
                    let rows = db::fetch_company_year_values(pool, company, year).await?;
                    chat::format_company_metric(company, metric, year, &rows)
                }
                None => chat::UNSUPPORTED_REPLY.to_string(),
            }
        }
        ChatCommand::Unsupported => chat::UNSUPPORTED_REPLY.to_string(),
    };

    Ok(Json(ChatResponse { response }))
}

async fn company_names(state: &AppState) -> Result<Vec<String>, ApiError> {
    let companies = db::list_companies(state.db.pool()).await?;
    Ok(companies.into_iter().map(|c| c.name).collect())
}

// ============================================================================
// Feedback
// ============================================================================

/// Submit feedback.
#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 201, description = "Feedback stored", body = MessageResponse),
        (status = 400, description = "Rating out of range", body = crate::error::ErrorResponse)
    ),
    tag = "Feedback"
)]
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let rating = i16::try_from(body.rating)
        .ok()
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| ApiError::InvalidRequest("Rating must be between 1 and 5".to_string()))?;

    let text = body
        .feedback
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let id = db::insert_feedback(state.db.pool(), rating, text).await?;
    info!(id, rating, "Feedback received");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Feedback submitted successfully")),
    ))
}
