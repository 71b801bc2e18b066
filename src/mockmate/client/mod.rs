//! HTTP adapters for the external services and the shared request helpers they
//! use. Helpers enforce one timeout policy and sanitize error bodies before they
//! reach the UI. They attach tokens or cookies supplied by callers but never log
//! them.

pub mod backend;
pub mod device;
pub mod errors;
pub mod identity;
pub mod storage;

pub use backend::BackendClient;
pub use device::{ConsentPrompt, DeviceFlow};
pub use errors::AppError;
pub use identity::IdentityToolkit;
pub use storage::ObjectStore;

use crate::mockmate::APP_USER_AGENT;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default request timeout applied to every client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

/// Builds the shared HTTP client with the crate user agent and timeout.
///
/// # Errors
/// `AppError::Config` when the TLS backend cannot be initialized.
pub fn http_client() -> Result<Client, AppError> {
    Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))
}

/// Joins an explicit base URL and a path with exactly one slash between them.
#[must_use]
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Trims a configured URL; empty values count as unset.
#[must_use]
pub fn normalize_base_url(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Maps transport errors into user-facing `AppError` variants. The URL is
/// stripped because it may carry an API key.
pub(crate) fn map_request_error(err: reqwest::Error) -> AppError {
    let err = err.without_url();
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
pub(crate) async fn handle_json_response<T: DeserializeOwned>(
    response: Response,
) -> Result<T, AppError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

/// Parses optional JSON responses and treats 204/401 as absent.
pub(crate) async fn handle_optional_json_response<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, AppError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT || status == StatusCode::UNAUTHORIZED {
        return Ok(None);
    }

    handle_json_response(response).await.map(Some)
}

async fn http_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AppError::Http {
        status,
        message: sanitize_body(&body),
    }
}

/// Sanitizes HTTP error bodies for user-facing messages by trimming and truncating.
pub(crate) fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
