//! # Email Verification Tokens
//!
//! A verification link carries two opaque parts: the user's id encoded as
//! URL-safe base64, and a token of the form `{issued_at_base36}-{mac}`.
//!
//! The MAC is an HMAC-SHA256 over the user's id, password hash, activation flag,
//! last login and the issue time. Nothing is stored server-side: a token stops
//! validating as soon as any of that state changes. In particular activating
//! the account flips `is_active`, so every link is single-use.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::models::{User, USER_COLUMNS};
use crate::utils::constant::VERIFICATION_TOKEN_EXPIRY;

type HmacSha256 = Hmac<Sha256>;

/// Bytes of the HMAC kept in the token
const MAC_LENGTH: usize = 16;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Invalid verification link")]
    InvalidLink,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Issues and checks state-bound verification tokens.
pub struct VerificationTokens {
    key: Vec<u8>,
}

impl VerificationTokens {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: secret.to_vec(),
        }
    }

    /// Encodes a user id for embedding in a URL path segment.
    pub fn encode_uid(user_id: Uuid) -> String {
        URL_SAFE_NO_PAD.encode(user_id.to_string())
    }

    /// Decodes a value produced by [`Self::encode_uid`]; `None` for anything else.
    pub fn decode_uid(uid: &str) -> Option<Uuid> {
        let bytes = URL_SAFE_NO_PAD.decode(uid).ok()?;
        let text = String::from_utf8(bytes).ok()?;
        Uuid::try_parse(&text).ok()
    }

    pub fn make_token(&self, user: &User) -> String {
        self.make_token_at(user, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn check_token(&self, user: &User, token: &str) -> bool {
        self.check_token_at(user, token, OffsetDateTime::now_utc().unix_timestamp())
    }

    fn make_token_at(&self, user: &User, issued_at: i64) -> String {
        let mac = self.mac(user, issued_at).finalize().into_bytes();
        format!(
            "{}-{}",
            to_base36(issued_at.max(0) as u64),
            URL_SAFE_NO_PAD.encode(&mac[..MAC_LENGTH])
        )
    }

    fn check_token_at(&self, user: &User, token: &str, now: i64) -> bool {
        let Some((ts_part, mac_part)) = token.split_once('-') else {
            return false;
        };
        let Some(issued_at) = from_base36(ts_part).and_then(|ts| i64::try_from(ts).ok()) else {
            return false;
        };
        let Ok(tag) = URL_SAFE_NO_PAD.decode(mac_part) else {
            return false;
        };
        if tag.len() != MAC_LENGTH {
            return false;
        }

        // constant-time comparison
        if self.mac(user, issued_at).verify_truncated_left(&tag).is_err() {
            return false;
        }

        let age = now - issued_at;
        (0..=VERIFICATION_TOKEN_EXPIRY.as_secs() as i64).contains(&age)
    }

    fn mac(&self, user: &User, issued_at: i64) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        let last_login = user
            .last_login
            .map(|t| t.unix_timestamp().to_string())
            .unwrap_or_default();
        mac.update(
            format!(
                "{}|{}|{}|{}|{}",
                user.id, user.password_hash, user.is_active, last_login, issued_at
            )
            .as_bytes(),
        );
        mac
    }
}

/// Builds the `/api/auth/verify/{uid}/{token}/` link for a user.
pub fn verification_link(base_url: &str, tokens: &VerificationTokens, user: &User) -> String {
    format!(
        "{}/api/auth/verify/{}/{}/",
        base_url.trim_end_matches('/'),
        VerificationTokens::encode_uid(user.id),
        tokens.make_token(user)
    )
}

/// Decodes the link parts and activates the account they point at.
///
/// Fails with [`VerificationError::InvalidLink`] for an undecodable uid, an
/// unknown user, or a token that does not match the user's current state.
#[instrument(skip_all)]
pub async fn verify_email(
    db_pool: &PgPool,
    tokens: &VerificationTokens,
    uid: &str,
    token: &str,
) -> Result<User, VerificationError> {
    let Some(user_id) = VerificationTokens::decode_uid(uid) else {
        warn!("Verification uid could not be decoded");
        return Err(VerificationError::InvalidLink);
    };

    let Some(user) = User::find_by_id(db_pool, user_id).await? else {
        warn!(%user_id, "Verification requested for unknown user");
        return Err(VerificationError::InvalidLink);
    };

    if !tokens.check_token(&user, token) {
        warn!(%user_id, "Verification token rejected");
        return Err(VerificationError::InvalidLink);
    }

    // `is_active = FALSE` in the predicate keeps two concurrent clicks from both succeeding
    let activated = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET is_active = TRUE, updated_at = NOW()
        WHERE id = $1 AND is_active = FALSE
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;

    match activated {
        Some(user) => {
            info!(%user_id, "Email verified, account activated");
            Ok(user)
        }
        None => {
            debug!(%user_id, "Account was activated concurrently");
            Err(VerificationError::InvalidLink)
        }
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(char::from(DIGITS[(value % 36) as usize]));
        value /= 36;
    }
    out.iter().rev().collect()
}

fn from_base36(text: &str) -> Option<u64> {
    if text.is_empty() || text.len() > 13 {
        return None;
    }
    u64::from_str_radix(text, 36).ok()
}
