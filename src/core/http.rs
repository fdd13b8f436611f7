//! HTTP client utilities.
//!
//! Provides the shared client builder and JSON request helper used by the
//! hosted-API and local-inference adapters.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::{Result, UltimaError};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("ultima/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| UltimaError::Network(e.to_string()))
}

/// Join a base URL and a path with exactly one slash.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Send a prepared request and decode a JSON response.
///
/// # Errors
///
/// - `Timeout` / `Network` on transport failure
/// - `ProviderApiError` on a non-2xx status (body excerpt included)
/// - `ParseResponse` when the body is not the expected JSON
pub async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
    timeout: Duration,
) -> Result<T> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            UltimaError::Timeout(timeout.as_secs())
        } else {
            UltimaError::Network(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UltimaError::ProviderApiError {
            provider: provider.to_string(),
            status_code: Some(status.as_u16()),
            message: format!(
                "HTTP {status}: {}",
                body.trim().chars().take(300).collect::<String>()
            ),
        });
    }

    response
        .json()
        .await
        .map_err(|e| UltimaError::ParseResponse(format!("{provider}: {e}")))
}
