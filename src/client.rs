//! Core client type and error types.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::http::{add_extra_headers, build_http_client, error_for_status, join_url};
use crate::options::ClientOptions;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("Response has no body")]
    MissingBody,

    #[error("API error {code}: {message}")]
    Api { code: i32, message: String },

    #[error("Stream cancelled")]
    StreamCancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client for the chat backend.
///
/// Cheap to clone; clones share the underlying connection pool. The client
/// holds no per-call state, so concurrent calls (streaming or not) are
/// independent of each other.
///
/// Endpoint methods live in [`crate::chat`] and [`crate::files`].
///
/// # Example
/// ```no_run
/// use chatmem::{ChatClient, ClientOptions};
///
/// # async fn run() -> Result<(), chatmem::ClientError> {
/// let client = ChatClient::new(ClientOptions::default())?;
/// let reply = client.send_message("Hello!").await?;
/// println!("{}", reply);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    options: ClientOptions,
}

impl ChatClient {
    /// Create a new client from options.
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let http = build_http_client(&options)?;
        Ok(Self { http, options })
    }

    /// Create a client configured from the environment.
    ///
    /// See [`ClientOptions::from_env`].
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientOptions::from_env()?)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Absolute URL of an endpoint path such as `/chat/health`.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.options.base_url, path)
    }

    /// Start a request with extra headers applied and no timeout.
    ///
    /// Streaming calls use this directly; their lifetime is bounded by the
    /// cancellation token instead.
    pub(crate) fn request_untimed(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "sending request");
        let req = self.http.request(method, url);
        add_extra_headers(req, &self.options.extra_headers)
    }

    /// Start a request bounded by the configured timeout.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.request_untimed(method, path);
        match self.options.timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }

    /// Send a request and fail on a non-success status.
    pub(crate) async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = req.send().await?;
        debug!(status = %response.status(), url = %response.url(), "received response");
        error_for_status(response).await
    }

    /// Send a request and read the body as plain text.
    pub(crate) async fn send_text(&self, req: RequestBuilder) -> Result<String, ClientError> {
        Ok(self.send(req).await?.text().await?)
    }

    /// Send a request and deserialize the JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, ClientError> {
        let body = self.send(req).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
