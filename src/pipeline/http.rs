//! Shared HTTP client carrying the browser-identifying header set.
//!
//! Listing pages and images are requested with the same headers. The client
//! keeps reqwest's default timeouts and never retries.

use crate::config::ExportConfig;
use crate::error::ExportError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use tracing::debug;

/// The headers attached to every outbound GET.
pub fn browser_headers(config: &ExportConfig) -> Result<HeaderMap, ExportError> {
    let value = |name: &str, v: &str| {
        HeaderValue::from_str(v)
            .map_err(|e| ExportError::HttpClient(format!("invalid {name} header '{v}': {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, value("User-Agent", &config.user_agent)?);
    headers.insert(ACCEPT, value("Accept", &config.accept)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        value("Accept-Language", &config.accept_language)?,
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(headers)
}

/// Build the client used for the whole export.
pub fn build_client(config: &ExportConfig) -> Result<reqwest::Client, ExportError> {
    let headers = browser_headers(config)?;
    debug!("Building HTTP client with {} default headers", headers.len());
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| ExportError::HttpClient(e.to_string()))
}
