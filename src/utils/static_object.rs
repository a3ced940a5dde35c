use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;

use tracing::{error, warn};

/// Deployment environment, lowercased (`production`, `development`, `test`, ...)
pub static APP_ENV: LazyLock<String> = LazyLock::new(|| {
    env::var("APP_ENV")
        .unwrap_or_else(|_| {
            warn!("Missing APP_ENV env var, using fallback 'development'");
            "development".to_string()
        })
        .to_ascii_lowercase()
});

#[inline]
pub fn is_production() -> bool {
    APP_ENV.as_str() == "production"
}

/// Base URL used when building links sent by email, without trailing slash
pub static PUBLIC_BASE_URL: LazyLock<String> = LazyLock::new(|| {
    env::var("PUBLIC_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| {
            error!("Missing PUBLIC_BASE_URL env var, using fallback 'http://localhost:8000'");
            "http://localhost:8000".to_string()
        })
});

/// Whether auth cookies carry the `Secure` attribute. Defaults to on in production.
pub static COOKIE_SECURE: LazyLock<bool> = LazyLock::new(|| match env::var("COOKIE_SECURE") {
    Ok(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
    Err(_) => is_production(),
});

/// Directory served under `/media` (startup and investor logos)
pub static MEDIA_ROOT: LazyLock<PathBuf> = LazyLock::new(|| {
    env::var("MEDIA_ROOT").map(PathBuf::from).unwrap_or_else(|_| {
        warn!("Missing MEDIA_ROOT env var, using fallback './media'");
        PathBuf::from("./media")
    })
});
