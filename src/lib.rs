//! # Fundbridge - Startup/Investor Matchmaking Backend
//!
//! ## Modules
//!
//! - [`handlers`] - HTTP request handlers for the API routes
//! - [`middleware`] - Authentication and client identification
//! - [`models`] - Database rows, closed enums and the shared [`AppState`]
//! - [`services`] - Business logic services (registration, verification, JWT, email, ...)
//! - [`utils`] - Utility functions, configuration and constants

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::env;
use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::handlers::{
    create_project, get_project, get_startup, health_check, list_notifications,
    list_startup_projects, login, logout, mark_notification_read, refresh_token, register_user,
    verify_user_email,
};
use crate::middleware::auth_middleware;
use crate::models::AppState;
use crate::services::email::{EmailService, ExternalEmailer, LogEmailer};
use crate::services::jwt::JwtService;
use crate::services::verification::VerificationTokens;
use crate::utils::{
    constant::*,
    secret::get_secret,
    static_object::{MEDIA_ROOT, is_production},
};

/// Creates an Axum router with default email service configuration.
///
/// This is a convenience function that calls [`app_with_email_service`] with an email service
/// picked from the `APP_ENV` environment variable.
pub fn app(db_pool: PgPool) -> Router {
    let email_service: Arc<dyn EmailService> = if is_production() {
        info!("Running in production mode with [ExternalEmailer]");
        let api_url = env::var("MAIL_API_URL").expect("Env variable `MAIL_API_URL` should be set");
        let api_key = get_secret("MAIL_API_KEY_FILE", "MAIL_API_KEY")
            .expect("Env variable `MAIL_API_KEY` should be set");
        let sender = env::var("SENDER_EMAIL").expect("Env variable `SENDER_EMAIL` should be set");
        Arc::new(ExternalEmailer::new(api_url, api_key, sender))
    } else {
        info!("Running in development mode with [LogEmailer (Mock)]");
        Arc::new(LogEmailer)
    };

    app_with_email_service(db_pool, email_service)
}

/// Creates an Axum router with application routes and state.
///
/// # Arguments
///
/// * `db_pool` - PostgreSQL database connection pool
/// * `email_service` - Service used to deliver verification links
///
/// # Environment Variables
///
/// - `JWT_SECRET` / `JWT_SECRET_FILE` - Required for JWT token signing and validation
/// - `SECRET_KEY` / `SECRET_KEY_FILE` - Required for signing email verification links
///
/// # Returns
///
/// A configured Axum router with all application routes and middleware
pub fn app_with_email_service(db_pool: PgPool, email_service: Arc<dyn EmailService>) -> Router {
    let jwt_secret = get_secret("JWT_SECRET_FILE", "JWT_SECRET")
        .expect("Env variable `JWT_SECRET` should be set");
    let secret_key = get_secret("SECRET_KEY_FILE", "SECRET_KEY")
        .expect("Env variable `SECRET_KEY` should be set");

    let state = Arc::new(AppState::new(
        email_service,
        db_pool,
        JwtService::from_secret(jwt_secret.as_bytes()),
        VerificationTokens::new(secret_key.as_bytes()),
    ));

    let state_clone = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
        interval.tick().await; // first tick completes immediately
        loop {
            interval.tick().await;
            state_clone.cleanup_expired_entries().await;
        }
    });

    let protected_routes = Router::new()
        .route("/api/projects/", post(create_project))
        .route("/api/notifications/", get(list_notifications))
        .route(
            "/api/notifications/{id}/read/",
            post(mark_notification_read),
        )
        .route_layer(from_fn_with_state(Arc::clone(&state), auth_middleware));

    let public_routes = Router::new()
        .route("/api/health/", get(health_check))
        .route("/api/auth/register/", post(register_user))
        .route("/api/auth/verify/{uid}/{token}/", get(verify_user_email))
        .route("/api/auth/login/", post(login))
        .route("/api/auth/refresh/", post(refresh_token))
        .route("/api/auth/logout/", post(logout))
        .route("/api/startups/{id}/", get(get_startup))
        .route("/api/startups/{id}/projects/", get(list_startup_projects))
        .route("/api/projects/{slug}/", get(get_project));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/media", ServeDir::new(MEDIA_ROOT.as_path()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
