//! # Authentication Handlers
//!
//! The account lifecycle over HTTP:
//!
//! 1. Registration creates an inactive account and mails a verification link
//! 2. Following the link activates the account
//! 3. Login issues an access and a refresh token as HTTP-only cookies
//! 4. Refresh mints a new access token from a refresh token
//! 5. Logout blacklists the refresh token and clears both cookies
//!
//! Login is throttled per client address.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Json, Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::ClientIp;
use crate::models::{AppState, User};
use crate::services::email::send_verification_email;
use crate::services::jwt::JwtError;
use crate::services::password::{verify_dummy_password_blocking, verify_password_blocking};
use crate::services::registration::{RegistrationOutcome, RegistrationRequest, register};
use crate::services::throttle::ThrottleDecision;
use crate::services::verification::{VerificationError, verification_link, verify_email};
use crate::utils::{
    constant::*,
    cookie::{auth_cookie, expired_cookie, read_cookie},
    static_object::{COOKIE_SECURE, PUBLIC_BASE_URL},
    validator::normalize_email,
};

const WRONG_CREDENTIALS: &str = "Wrong email or password.";
const INVALID_REFRESH: &str = "Token is invalid or expired.";

/// Response for both fresh and duplicate registrations
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

/// Request payload for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: LoginUser,
}

/// Optional body of refresh and logout requests
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

fn map_jwt_error(e: JwtError) -> AppError {
    match e {
        JwtError::DatabaseError(e) => AppError::Db(e),
        JwtError::EncodingError(e) => {
            error!(error = %e, "Failed to encode token");
            AppError::Internal
        }
        _ => AppError::Unauthorized(INVALID_REFRESH),
    }
}

/// Refresh token from the JSON body, falling back to the cookie.
fn refresh_from_body_or_cookie(headers: &HeaderMap, body: &Bytes) -> Option<String> {
    serde_json::from_slice::<RefreshRequest>(body)
        .ok()
        .and_then(|req| req.refresh)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| read_cookie(headers, REFRESH_COOKIE))
}

fn cleared_cookies() -> AppendHeaders<[(header::HeaderName, String); 2]> {
    AppendHeaders([
        (header::SET_COOKIE, expired_cookie(ACCESS_COOKIE, *COOKIE_SECURE)),
        (header::SET_COOKIE, expired_cookie(REFRESH_COOKIE, *COOKIE_SECURE)),
    ])
}

/// Registers a startup or investor account.
///
/// POST /api/auth/register/
///
/// # Returns
///
/// - `201 Created` - `{id, email, detail}`, also for an already registered email
/// - `400 Bad Request` - Field errors as `{field: [messages]}`
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(mut payload) = payload?;
    debug!("Processing registration request");

    if let Err(errors) = payload.validate_all() {
        warn!(fields = ?errors, "Registration payload rejected");
        return Err(AppError::Validation(errors));
    }

    let id = match register(&state.db_pool, &payload).await? {
        RegistrationOutcome::Created(user) => {
            let link = verification_link(&PUBLIC_BASE_URL, &state.verification_tokens, &user);
            if let Err(e) = send_verification_email(
                state.email_service.as_ref(),
                &user.email,
                &user.first_name,
                &link,
            )
            .await
            {
                error!(error = %e, user_id = %user.id, "Failed to send verification email");
            }
            user.id
        }
        RegistrationOutcome::Duplicate => Uuid::new_v4(),
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id,
            email: payload.email,
            detail: VERIFICATION_SENT.to_string(),
        }),
    ))
}

/// Activates the account a verification link points at.
///
/// GET /api/auth/verify/{uid}/{token}/
///
/// # Returns
///
/// - `200 OK` - Account activated
/// - `400 Bad Request` - Invalid, expired, already used, or foreign link
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn verify_user_email(
    State(state): State<Arc<AppState>>,
    Path((uid, token)): Path<(String, String)>,
) -> AppResult<Json<DetailResponse>> {
    match verify_email(&state.db_pool, &state.verification_tokens, &uid, &token).await {
        Ok(_) => Ok(Json(DetailResponse {
            detail: "Email verified successfully.".to_string(),
        })),
        Err(VerificationError::InvalidLink) => {
            Err(AppError::BadRequest("Invalid verification link."))
        }
        Err(VerificationError::DatabaseError(e)) => Err(AppError::Db(e)),
    }
}

/// Checks credentials and sets the session cookies.
///
/// POST /api/auth/login/
///
/// # Returns
///
/// - `200 OK` - `{user: {id, email}}` plus `access_token` and `refresh_token` cookies
/// - `400 Bad Request` - Malformed body
/// - `401 Unauthorized` - Wrong email, wrong password, or account not verified
/// - `429 Too Many Requests` - Too many attempts from this address
#[instrument(skip_all, fields(client_ip = %client_ip.0, request_id = %uuid::Uuid::new_v4()))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    client_ip: ClientIp,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Response> {
    if let ThrottleDecision::Throttled { retry_after } =
        state.login_throttle.hit(&format!("login:{}", client_ip.0))
    {
        warn!(retry_after_secs = retry_after.as_secs(), "Login throttled");
        return Err(AppError::TooManyRequests);
    }

    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);

    let Some(user) = User::find_by_email(&state.db_pool, &email).await? else {
        debug!("Login for unknown email");
        if let Err(e) = verify_dummy_password_blocking(payload.password).await {
            error!(error = %e, "Dummy password verification failed");
        }
        return Err(AppError::Unauthorized(WRONG_CREDENTIALS));
    };

    let password_ok = verify_password_blocking(payload.password, user.password_hash.clone())
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, user_id = %user.id, "Password verification failed");
            false
        });
    if !password_ok || !user.is_active {
        warn!(user_id = %user.id, active = user.is_active, "Login rejected");
        return Err(AppError::Unauthorized(WRONG_CREDENTIALS));
    }

    sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
        .bind(user.id)
        .execute(&state.db_pool)
        .await?;

    let tokens = state
        .jwt_service
        .create_token_pair(&user)
        .map_err(map_jwt_error)?;

    info!(user_id = %user.id, "User logged in");
    Ok((
        StatusCode::OK,
        AppendHeaders([
            (
                header::SET_COOKIE,
                auth_cookie(
                    ACCESS_COOKIE,
                    &tokens.access_token,
                    ACCESS_TOKEN_EXPIRY,
                    *COOKIE_SECURE,
                ),
            ),
            (
                header::SET_COOKIE,
                auth_cookie(
                    REFRESH_COOKIE,
                    &tokens.refresh_token,
                    REFRESH_TOKEN_EXPIRY,
                    *COOKIE_SECURE,
                ),
            ),
        ]),
        Json(LoginResponse {
            user: LoginUser {
                id: user.id,
                email: user.email,
            },
        }),
    )
        .into_response())
}

/// Mints a new access token from a refresh token.
///
/// POST /api/auth/refresh/
///
/// The refresh token is read from the `{refresh}` body field or the
/// `refresh_token` cookie. It is not rotated.
///
/// # Returns
///
/// - `200 OK` - `{access}` plus a refreshed `access_token` cookie
/// - `401 Unauthorized` - Missing, invalid, expired, blacklisted token, or inactive user
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let Some(token) = refresh_from_body_or_cookie(&headers, &body) else {
        warn!("Refresh requested without a token");
        return Err(AppError::Unauthorized(INVALID_REFRESH));
    };

    let claims = state
        .jwt_service
        .validate_refresh_token(&token, &state.db_pool)
        .await
        .map_err(map_jwt_error)?;
    let user_id = claims.user_id().map_err(map_jwt_error)?;

    let user = User::find_by_id(&state.db_pool, user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| {
            warn!(%user_id, "Refresh for missing or inactive user");
            AppError::Unauthorized(INVALID_REFRESH)
        })?;

    let access = state
        .jwt_service
        .create_access_token(user.id, &user.email)
        .map_err(map_jwt_error)?;

    debug!(%user_id, "Issued new access token");
    Ok((
        StatusCode::OK,
        AppendHeaders([(
            header::SET_COOKIE,
            auth_cookie(ACCESS_COOKIE, &access, ACCESS_TOKEN_EXPIRY, *COOKIE_SECURE),
        )]),
        Json(RefreshResponse { access }),
    )
        .into_response())
}

/// Blacklists the refresh token and clears both cookies.
///
/// POST /api/auth/logout/
///
/// # Returns
///
/// - `204 No Content` - Token revoked, cookies cleared
/// - `400 Bad Request` - No token, or a token that is invalid or already revoked
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let token = read_cookie(&headers, REFRESH_COOKIE).or_else(|| {
        serde_json::from_slice::<RefreshRequest>(&body)
            .ok()
            .and_then(|req| req.refresh)
            .filter(|token| !token.trim().is_empty())
    });
    let Some(token) = token else {
        warn!("Logout requested without a refresh token");
        return Err(AppError::BadRequest("Refresh token not provided."));
    };

    let revoked = match state.jwt_service.decode_refresh_token(&token) {
        Ok(claims) => state.jwt_service.blacklist(&claims, &state.db_pool).await,
        Err(e) => Err(e),
    };

    match revoked {
        Ok(()) => {
            info!("Refresh token revoked");
            Ok((StatusCode::NO_CONTENT, cleared_cookies()).into_response())
        }
        Err(JwtError::DatabaseError(e)) => Err(AppError::Db(e)),
        Err(e) => {
            warn!(error = %e, "Logout with unusable refresh token");
            Ok((
                StatusCode::BAD_REQUEST,
                cleared_cookies(),
                Json(DetailResponse {
                    detail: "Invalid or expired token.".to_string(),
                }),
            )
                .into_response())
        }
    }
}
