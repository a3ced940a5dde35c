//! # JWT Service
//!
//! This module provides JSON Web Token (JWT) functionality for user authentication.
//! It handles token creation, validation, and refresh token revocation.
//!
//! ## Features
//!
//! - Short-lived access tokens carrying the user's identity
//! - Longer-lived refresh tokens, each with its own `jti`
//! - Durable blacklist of revoked refresh tokens (logout)
//!
//! ## Security
//!
//! - The two token kinds are told apart by the `token_type` claim, so a refresh
//!   token is never accepted where an access token is expected and vice versa
//! - Blacklist rows live until the token itself would have expired

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, error, instrument, trace};
use uuid::Uuid;

use crate::models::User;
use crate::utils::constant::*;

/// Errors that can occur during JWT operations
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token has been blacklisted")]
    Blacklisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as string)
    pub sub: String,
    /// Email of the user; only present on access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Unique token id, used as the blacklist key
    pub jti: Uuid,
    pub token_type: TokenType,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::try_parse(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// Token pair issued at login
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Service for signing and validating tokens and managing the refresh blacklist
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl JwtService {
    /// Creates a new JWT service with the provided keys.
    ///
    /// # Arguments
    ///
    /// * `encoding_key` - Key used for signing JWT tokens
    /// * `decoding_key` - Key used for verifying JWT tokens
    pub fn new(encoding_key: EncodingKey, decoding_key: DecodingKey) -> Self {
        Self {
            encoding_key,
            decoding_key,
        }
    }

    /// HS256 service from a shared secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::new(
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
        )
    }

    /// Creates a new access and refresh token pair for the user.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub fn create_token_pair(&self, user: &User) -> Result<TokenPair, JwtError> {
        trace!("Creating new token pair");
        Ok(TokenPair {
            access_token: self.create_access_token(user.id, &user.email)?,
            refresh_token: self.create_refresh_token(user.id)?,
        })
    }

    pub fn create_access_token(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        let now = now_secs();
        let claims = Claims {
            sub: user_id.to_string(),
            email: Some(email.to_string()),
            exp: now + ACCESS_TOKEN_EXPIRY.as_secs(),
            iat: now,
            jti: Uuid::new_v4(),
            token_type: TokenType::Access,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn create_refresh_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        let now = now_secs();
        let claims = Claims {
            sub: user_id.to_string(),
            email: None,
            exp: now + REFRESH_TOKEN_EXPIRY.as_secs(),
            iat: now,
            jti: Uuid::new_v4(),
            token_type: TokenType::Refresh,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verifies signature, expiry and token type.
    fn decode_typed(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let claims = match decode::<Claims>(token, &self.decoding_key, &Validation::default()) {
            Ok(data) => data.claims,
            Err(e) if e.kind() == &jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                debug!("Token expired");
                return Err(JwtError::TokenExpired);
            }
            Err(e) => {
                debug!(error = %e, "Invalid token");
                return Err(JwtError::InvalidToken);
            }
        };

        if claims.token_type != expected {
            debug!(actual = ?claims.token_type, expected = ?expected, "Wrong token type");
            return Err(JwtError::InvalidToken);
        }
        claims.user_id()?;
        Ok(claims)
    }

    /// Validates an access token and returns its claims.
    ///
    /// This does not touch the database.
    #[instrument(skip_all, fields(token_length = token.len()))]
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode_typed(token, TokenType::Access)
    }

    /// Validates a refresh token's signature, expiry and type, without the blacklist check.
    #[instrument(skip_all, fields(token_length = token.len()))]
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode_typed(token, TokenType::Refresh)
    }

    /// Validates a refresh token including the blacklist check.
    #[instrument(skip_all, fields(token_length = token.len()))]
    pub async fn validate_refresh_token(
        &self,
        token: &str,
        db_pool: &PgPool,
    ) -> Result<Claims, JwtError> {
        let claims = self.decode_refresh_token(token)?;
        if Self::is_blacklisted(db_pool, claims.jti).await? {
            debug!(jti = %claims.jti, "Refresh token is blacklisted");
            return Err(JwtError::Blacklisted);
        }
        Ok(claims)
    }

    pub async fn is_blacklisted(db_pool: &PgPool, jti: Uuid) -> Result<bool, JwtError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM token_blacklist WHERE jti = $1)")
            .bind(jti)
            .fetch_one(db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to query token blacklist");
                JwtError::DatabaseError(e)
            })
    }

    /// Revokes a refresh token so it can never mint access tokens again.
    ///
    /// Fails with [`JwtError::Blacklisted`] when the token was already revoked.
    #[instrument(skip_all, fields(jti = %claims.jti))]
    pub async fn blacklist(&self, claims: &Claims, db_pool: &PgPool) -> Result<(), JwtError> {
        let user_id = claims.user_id()?;
        let result = sqlx::query(
            r#"
            INSERT INTO token_blacklist (jti, user_id, expires_at)
            VALUES ($1, $2, to_timestamp($3))
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(claims.jti)
        .bind(user_id)
        .bind(claims.exp as f64)
        .execute(db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to blacklist refresh token");
            JwtError::DatabaseError(e)
        })?;

        if result.rows_affected() == 0 {
            debug!("Refresh token was already blacklisted");
            return Err(JwtError::Blacklisted);
        }
        debug!("Refresh token blacklisted");
        Ok(())
    }

    /// Deletes blacklist rows whose tokens have expired anyway.
    #[instrument(skip_all)]
    pub async fn purge_expired_blacklist(db_pool: &PgPool) -> Result<u64, JwtError> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at <= NOW()")
            .execute(db_pool)
            .await?;
        debug!(removed = result.rows_affected(), "Purged expired blacklist rows");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn service() -> JwtService {
        JwtService::from_secret(b"unit-test-jwt-secret")
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@email.com".to_string(),
            password_hash: String::new(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            last_login: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn access_token_carries_identity() {
        let service = service();
        let user = user();
        let pair = service.create_token_pair(&user).unwrap();

        let claims = service.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.email.as_deref(), Some("test@email.com"));
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_EXPIRY.as_secs());
    }

    #[test]
    fn refresh_token_has_longer_lifetime() {
        let service = service();
        let pair = service.create_token_pair(&user()).unwrap();
        let claims = service.decode_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_EXPIRY.as_secs());
        assert_eq!(claims.email, None);
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let service = service();
        let pair = service.create_token_pair(&user()).unwrap();
        assert!(matches!(
            service.validate_access_token(&pair.refresh_token),
            Err(JwtError::InvalidToken)
        ));
        assert!(matches!(
            service.decode_refresh_token(&pair.access_token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn each_refresh_token_has_its_own_jti() {
        let service = service();
        let user = user();
        let a = service.create_refresh_token(user.id).unwrap();
        let b = service.create_refresh_token(user.id).unwrap();
        let a = service.decode_refresh_token(&a).unwrap();
        let b = service.decode_refresh_token(&b).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = JwtService::from_secret(b"another-secret")
            .create_refresh_token(Uuid::new_v4())
            .unwrap();
        assert!(matches!(
            service().decode_refresh_token(&token),
            Err(JwtError::InvalidToken)
        ));
        assert!(matches!(
            service().decode_refresh_token("someinvalidtoken"),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_reported() {
        let service = service();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: None,
            exp: 1_000,
            iat: 0,
            jti: Uuid::new_v4(),
            token_type: TokenType::Refresh,
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();
        assert!(matches!(
            service.decode_refresh_token(&token),
            Err(JwtError::TokenExpired)
        ));
    }
}
