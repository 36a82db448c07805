//! Client configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::ClientError;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Timeout applied to plain request/response calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_BASE_URL: &str = "CHATMEM_API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "CHATMEM_TIMEOUT_SECS";
pub const ENV_PROXY: &str = "CHATMEM_PROXY";

/// Options for [`crate::ChatClient`].
///
/// # Example
/// ```rust
/// use chatmem::options::ClientOptions;
/// use std::time::Duration;
///
/// let options = ClientOptions::new("https://chat.example.com/api")
///     .with_timeout(Duration::from_secs(10))
///     .with_header("X-Trace".to_string(), "on".to_string());
///
/// assert_eq!(options.timeout, Some(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL every endpoint path is appended to (e.g. `http://host/api`)
    pub base_url: String,

    /// Timeout for non-streaming requests. Streaming calls are never timed
    /// out by the client.
    pub timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            proxy: None,
            extra_headers: None,
        }
    }
}

impl ClientOptions {
    /// Create options for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read options from the environment.
    ///
    /// - `CHATMEM_API_BASE_URL`: base URL (default `http://localhost:8080/api`)
    /// - `CHATMEM_TIMEOUT_SECS`: request timeout in seconds, `0` disables it
    /// - `CHATMEM_PROXY`: proxy URL
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ClientError> {
        let mut options = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|s| !s.trim().is_empty()) {
            options.base_url = base_url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{} must be a number of seconds, got {:?}", ENV_TIMEOUT_SECS, raw))
            })?;
            options.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        options.proxy = lookup(ENV_PROXY).filter(|s| !s.trim().is_empty());

        Ok(options)
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the request timeout.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set extra headers.
    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}
