//! Helpers shared by the HTTP clients of the external services.

use reqwest::Url;

/// Longest slice of an error body that is echoed back to callers
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Validate an external service URL
///
/// Only http and https are accepted, and credentials embedded in the URL are
/// rejected so they never end up in logs or error messages.
pub fn parse_service_url(service: &str, url: &str) -> Result<Url, String> {
    let parsed =
        Url::parse(url.trim()).map_err(|e| format!("Invalid {} URL '{}': {}", service, url, e))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!(
            "{} URL must use http or https scheme, got: {}",
            service,
            parsed.scheme()
        ));
    }

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(format!("{} URL must not contain credentials", service));
    }

    Ok(parsed)
}

pub fn build_client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))
}

/// Cut an upstream error body down to a loggable size
pub fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
