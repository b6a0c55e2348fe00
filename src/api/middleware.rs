//! API middleware for bearer authentication.

use crate::auth::{AuthUser, TokenPurpose};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Extracts the token from an `Authorization: Bearer <token>` value.
pub(crate) fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authentication middleware.
///
/// Requires a valid session token and attaches the caller as an
/// [`AuthUser`] request extension. Returns 401 otherwise.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
    else {
        return ApiError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    let user = match state
        .tokens
        .verify(token, TokenPurpose::Session)
        .and_then(|claims| {
            Ok(AuthUser {
                id: claims.user_id()?,
                email: claims.email,
            })
        }) {
        Ok(user) => user,
        Err(e) => {
            debug!("Rejected bearer token: {}", e);
            return ApiError::from(e).into_response();
        }
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
