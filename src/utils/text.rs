use axum::http::{HeaderMap, header};

/// Splits a comma-separated field into trimmed, non-empty tokens.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolves a stored media reference to an absolute URL for the current request.
///
/// Empty references resolve to `None`; references that are already absolute
/// URLs are returned untouched. Relative paths are served under `/media/` on
/// the host the request came in on.
pub fn absolute_media_url(headers: &HeaderMap, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return Some(reference.to_string());
    }

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    let path = reference.trim_start_matches('/');
    let path = path.strip_prefix("media/").unwrap_or(path);

    Some(format!("{scheme}://{host}/media/{path}"))
}
