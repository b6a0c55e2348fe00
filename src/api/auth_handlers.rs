//! Authentication request handlers.

use crate::auth::{
    AuthError, AuthUser, OtpError, TokenPurpose, generate_otp, hash_otp, hash_password,
    verify_password,
};
use crate::db::{self, UserRow};
use crate::error::ApiError;
use crate::mail::OutgoingMail;
use crate::models::{
    AuthResponse, GoogleSigninRequest, GoogleSigninResponse, GoogleSignupCompleteRequest,
    MeResponse, MessageResponse, PasswordResetRequest, ResetPasswordWithOtpRequest,
    SigninRequest, SignupRequest, UserSummary, VerifyOtpRequest,
};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{info, warn};

impl From<UserRow> for UserSummary {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            fullname: row.fullname,
            email: row.email,
            phone: row.phone,
        }
    }
}

/// Returns the trimmed value or a 400 naming the missing field.
pub(crate) fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest(format!("{} is required", field)))
}

/// Returns a password exactly as sent, rejecting a missing or blank one.
pub(crate) fn required_password<'a>(
    value: &'a Option<String>,
    field: &str,
) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidRequest(format!("{} is required", field)))
}

/// Trims and lower-cases an email, rejecting obviously malformed ones.
pub(crate) fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ApiError::InvalidRequest(format!(
            "Invalid email address: {}",
            email
        ))),
    }
}

fn conflict_on_unique(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::Conflict("User with email or phone already exists".to_string())
        }
        _ => ApiError::from(err),
    }
}

fn session_response(
    state: &AppState,
    message: &str,
    user: UserRow,
) -> Result<AuthResponse, ApiError> {
    let token = state.tokens.issue_session(user.id, &user.email)?;
    Ok(AuthResponse {
        message: message.to_string(),
        token,
        user: user.into(),
    })
}

/// Checks a reset code, counting a wrong guess against the attempt budget.
///
/// `conn` must be inside a transaction: the code row stays locked until it
/// ends, so parallel guesses are checked one after another.
async fn check_otp(
    conn: &mut PgConnection,
    email: &str,
    otp: &str,
    max_attempts: i32,
) -> Result<(), ApiError> {
    let record = db::lock_otp(conn, email)
        .await?
        .ok_or(AuthError::Otp(OtpError::NotRequested))?;

    match record.check(email, otp, Utc::now(), max_attempts) {
        Err(OtpError::Mismatch) => {
            db::increment_otp_attempts(conn, email).await?;
            Err(AuthError::Otp(OtpError::Mismatch).into())
        }
        checked => checked.map_err(|e| AuthError::Otp(e).into()),
    }
}

// ============================================================================
// Email and Password
// ============================================================================

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 409, description = "Email or phone already registered", body = crate::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let fullname = required(&body.fullname, "fullname")?;
    let email = normalize_email(required(&body.email, "email")?)?;
    let phone = required(&body.phone, "phone")?;
    let password = required_password(&body.password, "password")?;

    let pool = state.db.pool();
    if db::user_exists(pool, &email, phone).await? {
        return Err(ApiError::Conflict(
            "User with email or phone already exists".to_string(),
        ));
    }

    let hash = hash_password(password.to_string(), state.config.auth.bcrypt_cost).await?;
    let user = db::create_user(pool, fullname, &email, phone, &hash)
        .await
        .map_err(conflict_on_unique)?;
    info!(user_id = user.id, "User registered");

    let response = session_response(&state, "User registered successfully", user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Sign in with email or phone.
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Unknown user or wrong password", body = crate::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn signin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SigninRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let identifier = required(&body.identifier, "identifier")?;
    let password = required_password(&body.password, "password")?;

    let user = db::find_user_by_identifier(state.db.pool(), identifier)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password.to_string(), user.password.clone()).await? {
        warn!(user_id = user.id, "Rejected sign-in");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(Json(session_response(&state, "Login successful", user)?))
}

/// Current user.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Authenticated user", body = MeResponse),
        (status = 401, description = "Missing or invalid bearer token", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>, ApiError> {
    let user = db::find_user_by_id(state.db.pool(), auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse { user: user.into() }))
}

// ============================================================================
// Google
// ============================================================================

/// Sign in with a Google ID token.
#[utoipa::path(
    post,
    path = "/api/auth/google-signin",
    request_body = GoogleSigninRequest,
    responses(
        (status = 200, description = "Session for a known user, or a signup token", body = GoogleSigninResponse),
        (status = 400, description = "Token rejected or Google sign-in not configured", body = crate::error::ErrorResponse),
        (status = 502, description = "Google unreachable", body = crate::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn google_signin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GoogleSigninRequest>,
) -> Result<Json<GoogleSigninResponse>, ApiError> {
    let credential = required(&body.credential, "credential")?;
    let identity = state.google.verify(credential).await?;

    match db::find_user_by_email(state.db.pool(), &identity.email).await? {
        Some(user) => {
            let token = state.tokens.issue_session(user.id, &user.email)?;
            info!(user_id = user.id, "Google sign-in");
            Ok(Json(GoogleSigninResponse {
                message: "Login successful".to_string(),
                needs_signup: false,
                token: Some(token),
                user: Some(user.into()),
                temp_token: None,
                email: identity.email,
                name: identity.name,
            }))
        }
        None => {
            let temp_token = state.tokens.issue_signup(&identity)?;
            Ok(Json(GoogleSigninResponse {
                message: "Complete your signup".to_string(),
                needs_signup: true,
                token: None,
                user: None,
                temp_token: Some(temp_token),
                email: identity.email,
                name: identity.name,
            }))
        }
    }
}

/// Finish registering a Google user.
#[utoipa::path(
    post,
    path = "/api/auth/google-signup-complete",
    request_body = GoogleSignupCompleteRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid or expired signup token", body = crate::error::ErrorResponse),
        (status = 409, description = "Email or phone already registered", body = crate::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn google_signup_complete(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GoogleSignupCompleteRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let temp_token = required(&body.temp_token, "tempToken")?;
    let phone = required(&body.phone, "phone")?;
    let password = required_password(&body.password, "password")?;

    let claims = state.tokens.verify(temp_token, TokenPurpose::GoogleSignup)?;
    let email = normalize_email(&claims.email)?;
    let fullname = claims
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let pool = state.db.pool();
    if db::user_exists(pool, &email, phone).await? {
        return Err(ApiError::Conflict(
            "User with email or phone already exists".to_string(),
        ));
    }

    let hash = hash_password(password.to_string(), state.config.auth.bcrypt_cost).await?;
    let user = db::create_user(pool, &fullname, &email, phone, &hash)
        .await
        .map_err(conflict_on_unique)?;
    info!(user_id = user.id, "Google user registered");

    let response = session_response(&state, "User registered successfully", user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

// ============================================================================
// Password Reset
// ============================================================================

/// Email a password reset code.
#[utoipa::path(
    post,
    path = "/api/auth/request-password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 404, description = "No account for this email", body = crate::error::ErrorResponse),
        (status = 502, description = "Mail delivery failed", body = crate::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = normalize_email(required(&body.email, "email")?)?;
    let pool = state.db.pool();

    if db::find_user_by_email(pool, &email).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let ttl = state.config.auth.otp_ttl_secs;
    let otp = generate_otp();
    let expires_at = Utc::now() + chrono::Duration::seconds(ttl as i64);
    db::upsert_otp(pool, &email, &hash_otp(&email, &otp), expires_at).await?;

    state
        .mailer
        .send(&OutgoingMail::password_reset(&email, &otp, ttl.div_ceil(60)))
        .await?;
    info!("Password reset code issued");

    Ok(Json(MessageResponse::new("OTP sent to your email")))
}

/// Check a reset code without consuming it.
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code valid", body = MessageResponse),
        (status = 400, description = "Code missing, expired, wrong or out of attempts", body = crate::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = normalize_email(required(&body.email, "email")?)?;
    let otp = required(&body.otp, "otp")?;

    let mut tx = state.db.pool().begin().await?;
    let checked = check_otp(&mut tx, &email, otp, state.config.auth.otp_max_attempts).await;
    tx.commit().await?;
    checked?;

    Ok(Json(MessageResponse::new("OTP verified")))
}

/// Set a new password with a reset code.
#[utoipa::path(
    post,
    path = "/api/auth/reset-password-with-otp",
    request_body = ResetPasswordWithOtpRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Code missing, expired, wrong or out of attempts", body = crate::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn reset_password_with_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetPasswordWithOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = normalize_email(required(&body.email, "email")?)?;
    let otp = required(&body.otp, "otp")?;
    let new_password = required_password(&body.new_password, "newPassword")?;

    let hash = hash_password(new_password.to_string(), state.config.auth.bcrypt_cost).await?;

    let mut tx = state.db.pool().begin().await?;
    if let Err(e) = check_otp(&mut tx, &email, otp, state.config.auth.otp_max_attempts).await {
        // keep the attempt count written by a wrong guess
        tx.commit().await?;
        return Err(e);
    }
    if db::update_password(&mut tx, &email, &hash).await? == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    db::delete_otp(&mut tx, &email).await?;
    tx.commit().await?;
    info!("Password reset completed");

    Ok(Json(MessageResponse::new("Password reset successfully")))
}
