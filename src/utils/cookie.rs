//! # Auth Cookies
//!
//! Tokens travel in `HttpOnly; SameSite=Strict` cookies so they are never
//! readable from page scripts. The `Secure` attribute follows
//! [`COOKIE_SECURE`](crate::utils::static_object::COOKIE_SECURE).

use std::time::Duration;

use axum::http::{HeaderMap, header};

/// Builds a `Set-Cookie` value for an auth cookie.
pub fn auth_cookie(name: &str, value: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{name}={value}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        max_age.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Builds a `Set-Cookie` value that makes the browser drop the cookie.
pub fn expired_cookie(name: &str, secure: bool) -> String {
    auth_cookie(name, "", Duration::ZERO, secure)
        + "; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
}

/// Reads a cookie value from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn auth_cookie_attributes() {
        let cookie = auth_cookie("access_token", "abc", Duration::from_secs(900), false);
        assert_eq!(
            cookie,
            "access_token=abc; Path=/; HttpOnly; SameSite=Strict; Max-Age=900"
        );
        assert!(auth_cookie("a", "b", Duration::from_secs(1), true).ends_with("; Secure"));
    }

    #[test]
    fn expired_cookie_has_zero_max_age() {
        let cookie = expired_cookie("refresh_token", false);
        assert!(cookie.starts_with("refresh_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn reads_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=r.t.k; access_token=a.t.k"),
        );
        assert_eq!(read_cookie(&headers, "refresh_token").as_deref(), Some("r.t.k"));
        assert_eq!(read_cookie(&headers, "access_token").as_deref(), Some("a.t.k"));
        assert_eq!(read_cookie(&headers, "session"), None);
    }

    #[test]
    fn empty_cookie_reads_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refresh_token="));
        assert_eq!(read_cookie(&headers, "refresh_token"), None);
    }
}
