//! Fundamentals Dashboard Backend Server
//!
//! REST API server for company fundamentals, composite rankings and user accounts.

use anyhow::Context;
use fundamentals_dashboard_backend::api::create_router;
use fundamentals_dashboard_backend::config::{Config, DEV_JWT_SECRET};
use fundamentals_dashboard_backend::db::DatabasePool;
use fundamentals_dashboard_backend::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use fundamentals_dashboard_backend::db::Company;
use fundamentals_dashboard_backend::error::ErrorResponse;
use fundamentals_dashboard_backend::models::{
    AuthResponse, ChatRequest, ChatResponse, CompanyEpsRow, FeedbackRequest, GoogleSigninRequest, GoogleSigninResponse,
    GoogleSignupCompleteRequest, HealthResponse, KeyRatio, MeResponse, MessageResponse,
    MetricHistoryResponse, MetricPoint, PasswordResetRequest, ResetPasswordWithOtpRequest,
    SearchSuggestion, SigninRequest, SignupRequest, UserSummary, VerifyOtpRequest,
};
use fundamentals_dashboard_backend::ranking::RankedCompany;

/// Registers the bearer security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        fundamentals_dashboard_backend::api::handlers::health_check,
        fundamentals_dashboard_backend::api::handlers::list_companies,
        fundamentals_dashboard_backend::api::handlers::get_rankings,
        fundamentals_dashboard_backend::api::handlers::companies_with_metrics,
        fundamentals_dashboard_backend::api::handlers::company_key_ratios,
        fundamentals_dashboard_backend::api::handlers::company_metric_history,
        fundamentals_dashboard_backend::api::handlers::search_suggestions,
        fundamentals_dashboard_backend::api::handlers::chat,
        fundamentals_dashboard_backend::api::handlers::submit_feedback,
        fundamentals_dashboard_backend::api::auth_handlers::signup,
        fundamentals_dashboard_backend::api::auth_handlers::signin,
        fundamentals_dashboard_backend::api::auth_handlers::me,
        fundamentals_dashboard_backend::api::auth_handlers::google_signin,
        fundamentals_dashboard_backend::api::auth_handlers::google_signup_complete,
        fundamentals_dashboard_backend::api::auth_handlers::request_password_reset,
        fundamentals_dashboard_backend::api::auth_handlers::verify_otp,
        fundamentals_dashboard_backend::api::auth_handlers::reset_password_with_otp,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            MessageResponse,
            Company,
            RankedCompany,
            CompanyEpsRow,
            KeyRatio,
            MetricPoint,
            MetricHistoryResponse,
            SearchSuggestion,
            ChatRequest,
            ChatResponse,
            FeedbackRequest,
            UserSummary,
            SignupRequest,
            SigninRequest,
            AuthResponse,
            MeResponse,
            GoogleSigninRequest,
            GoogleSigninResponse,
            GoogleSignupCompleteRequest,
            PasswordResetRequest,
            VerifyOtpRequest,
            ResetPasswordWithOtpRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Companies", description = "Company data and rankings"),
        (name = "Auth", description = "Accounts, sessions and password reset"),
        (name = "Chat", description = "Keyword chat commands"),
        (name = "Feedback", description = "User feedback"),
    ),
    info(
        title = "Fundamentals Dashboard API",
        version = "0.1.0",
        description = "REST API for company fundamentals and composite rankings",
        license(name = "MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::from_env_and_file(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;

    if config.auth.jwt_secret == DEV_JWT_SECRET {
        warn!("Using the built-in development JWT secret, set JWT_SECRET in production");
    }

    let db = DatabasePool::new(&config.database)
        .await
        .context("connecting to database")?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    let host = config.server.host.clone();
    let port = config.server.port;

    let state = Arc::new(AppState::from_config(config, db)?);

    info!(
        "Starting Fundamentals Dashboard Backend on {}:{}",
        host, port
    );
    info!(
        "Swagger UI available at http://{}:{}/swagger-ui/",
        host, port
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = create_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start the server
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
