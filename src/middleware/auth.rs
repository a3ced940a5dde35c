//! # Authentication Middleware
//!
//! Validates the access token and provides user context to protected routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::AppState;
use crate::services::jwt::Claims;
use crate::utils::{constant::ACCESS_COOKIE, cookie::read_cookie};

/// Authentication middleware for protecting routes
///
/// # Authentication Flow
///
/// 1. Collects the access token from the `access_token` cookie and from an
///    `Authorization: Bearer <token>` header
/// 2. Validates the JWT signature, expiration and token type, cookie first;
///    the header is used when the cookie token is missing or rejected
/// 3. Adds [`AuthUser`] to request extensions for handler access
///
/// # Returns
///
/// - **Success**: Continues to next handler with user context
/// - **Failure**: Returns `401 Unauthorized` for invalid/missing tokens
#[instrument(
    skip_all,
    fields(
        method = %req.method(),
        uri = %req.uri(),
        request_id = %uuid::Uuid::new_v4()
    )
)]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    trace!("Processing authentication middleware");

    let candidates = access_tokens(req.headers());
    if candidates.is_empty() {
        warn!("No access token in cookie or Authorization header");
        return Err(AppError::Unauthorized(
            "Authentication credentials were not provided.",
        ));
    }

    // A stale cookie must not shadow a valid Bearer header.
    let mut last_error = None;
    for token in &candidates {
        match state.jwt_service.validate_access_token(token) {
            Ok(claims) => {
                let Ok(user_id) = claims.user_id() else {
                    last_error = Some("subject is not a user id".to_string());
                    continue;
                };
                debug!(user_id = %user_id, "Authentication successful");
                req.extensions_mut().insert(AuthUser { user_id, claims });
                return Ok(next.run(req).await);
            }
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    warn!(
        error = last_error.as_deref().unwrap_or_default(),
        tried = candidates.len(),
        "Token validation failed"
    );
    Err(AppError::Unauthorized(
        "Given token not valid for any token type.",
    ))
}

/// Access token candidates in the order they are tried: the `access_token`
/// cookie, then the `Authorization: Bearer` header.
fn access_tokens(headers: &HeaderMap) -> Vec<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    read_cookie(headers, ACCESS_COOKIE)
        .into_iter()
        .chain(bearer)
        .collect()
}

/// Authenticated user information available to handlers
///
/// Inserted into request extensions by [`auth_middleware`].
///
/// # Usage in Handlers
///
/// ```rust
/// use axum::{extract::Extension, response::IntoResponse};
/// use fundbridge::middleware::AuthUser;
/// async fn protected_handler(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
///     format!("Hello user: {}", user.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Unique identifier for the authenticated user
    pub user_id: Uuid,
    /// JWT claims containing additional token metadata
    pub claims: Claims,
}
