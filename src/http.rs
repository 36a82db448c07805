//! HTTP client utilities for talking to the chat backend.
//!
//! Client construction, header handling, URL building and the mapping from
//! HTTP status codes to [`ClientError`].

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

use crate::client::ClientError;
use crate::options::ClientOptions;

/// Build a configured HTTP client from client options.
///
/// No client-wide timeout is set: streaming replies may run for as long as
/// the server keeps talking. The configured timeout is applied per request
/// to the plain request/response endpoints.
pub fn build_http_client(options: &ClientOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder();

    if let Some(proxy_url) = &options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Add extra headers to a request if specified in the options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// Join a base URL and an endpoint path with exactly one slash between them.
///
/// # Example
/// ```
/// use chatmem::http::join_url;
///
/// assert_eq!(join_url("http://host/api/", "/chat/health"), "http://host/api/chat/health");
/// assert_eq!(join_url("http://host/api", "chat/health"), "http://host/api/chat/health");
/// ```
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Human-readable message for a failed status.
///
/// Common statuses get a fixed message; anything else uses the `message`
/// field of a JSON error body when there is one.
pub fn status_message(status: StatusCode, body: &str) -> String {
    match status.as_u16() {
        400 => "bad request parameters".to_string(),
        401 => "unauthorized".to_string(),
        403 => "forbidden".to_string(),
        404 => "endpoint not found".to_string(),
        500 => "internal server error".to_string(),
        code => serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("request failed ({})", code)),
    }
}

/// Pass a successful response through, turn anything else into
/// [`ClientError::Status`].
pub async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = status_message(status, &body);
    warn!(%status, %url, %message, "request failed");

    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
