use std::sync::Arc;

use sqlx::PgPool;
use tracing::{error, info, instrument};

use crate::services::{
    email::EmailService, jwt::JwtService, throttle::Throttle, verification::VerificationTokens,
};
use crate::utils::constant::*;

/// Application state shared across requests. Needs to be thread-safe.
pub struct AppState {
    /// The email service used to send verification links.
    pub email_service: Arc<dyn EmailService>,
    /// The PostgreSQL database connection pool.
    pub db_pool: PgPool,
    /// JWT service for token generation and validation.
    pub jwt_service: JwtService,
    /// Signs and checks email verification tokens.
    pub verification_tokens: VerificationTokens,
    /// Login attempts per client address.
    pub login_throttle: Throttle,
}

impl AppState {
    /// Creates a new application state with the provided services.
    ///
    /// # Arguments
    ///
    /// * `email_service` - Service for sending verification emails
    /// * `db_pool` - PostgreSQL database connection pool
    /// * `jwt_service` - Service for JWT token operations
    /// * `verification_tokens` - Signer for email verification links
    pub fn new(
        email_service: Arc<dyn EmailService>,
        db_pool: PgPool,
        jwt_service: JwtService,
        verification_tokens: VerificationTokens,
    ) -> Self {
        info!("Initializing application state");

        Self {
            email_service,
            db_pool,
            jwt_service,
            verification_tokens,
            login_throttle: Throttle::new(LOGIN_THROTTLE_LIMIT, LOGIN_THROTTLE_WINDOW),
        }
    }

    /// Drops finished throttle windows and blacklist rows of expired tokens.
    ///
    /// Called periodically from a background task.
    #[instrument(skip_all)]
    pub async fn cleanup_expired_entries(&self) {
        self.login_throttle.cleanup_expired_entries();

        if let Err(e) = JwtService::purge_expired_blacklist(&self.db_pool).await {
            error!(error = %e, "Failed to purge expired blacklist entries");
        }
    }
}
