//! # Application Constants
//!
//! This module defines configuration constants used throughout the Fundbridge application.
//! These constants control various timeouts, limits, and security settings.

use std::time::Duration;

/// Expiration time for JWT access tokens
///
/// Access tokens are short-lived and must be refreshed regularly.
pub const ACCESS_TOKEN_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// Expiration time for JWT refresh tokens
pub const REFRESH_TOKEN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60); // 7 days

/// Lifetime of an email verification link
pub const VERIFICATION_TOKEN_EXPIRY: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Length of the window used to count login attempts per caller
pub const LOGIN_THROTTLE_WINDOW: Duration = Duration::from_secs(60);

/// Number of login attempts allowed inside one [`LOGIN_THROTTLE_WINDOW`]
pub const LOGIN_THROTTLE_LIMIT: u32 = 10;

/// Interval for the background purge of throttle windows and expired blacklist rows
pub const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(3 * 60);

/// Page size used when the caller does not pass `page_size`
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound for a caller-specified `page_size`
pub const MAX_PAGE_SIZE: u32 = 100;

/// Total digits of a money column (`NUMERIC(12, 2)`)
pub const MONEY_MAX_DIGITS: u32 = 12;

/// Digits after the decimal point of a money column
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Cookie carrying the access token
pub const ACCESS_COOKIE: &str = "access_token";

/// Cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Response detail returned for both fresh and duplicate registrations
pub const VERIFICATION_SENT: &str = "Verification email sent.";
