//! Service configuration
//!
//! Built either through [`ConnectionConfig::builder`] or from environment
//! variables with [`ConnectionConfig::from_env`].

use std::time::Duration;

use crate::error::{ConnectionError, Result};

/// Default timeout for every outbound bus request
pub const DEFAULT_AGENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Upper bound accepted for the outbound request timeout
pub const MAX_AGENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Default prefix for per-org API key cache entries
pub const DEFAULT_API_KEY_CACHE_PREFIX: &str = "agent-api-key";

/// Default lifetime of a cached API key
pub const DEFAULT_API_KEY_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound accepted for the API key cache lifetime
pub const MAX_API_KEY_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default largest page a listing may request
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// Default maximum size of one bus line (1MB)
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Configuration for the connection service and its worker
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout applied to every outbound bus request
    pub agent_request_timeout: Duration,
    /// Prefix of per-org API key cache keys
    pub api_key_cache_prefix: String,
    /// Lifetime of API keys written by the provisioning side
    pub api_key_cache_ttl: Duration,
    /// Public API base used to derive organization logo URLs
    pub public_api_base_url: Option<String>,
    /// Largest page a listing may request
    pub max_page_size: usize,
    /// Maximum size of one newline-delimited bus message
    pub max_line_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            agent_request_timeout: DEFAULT_AGENT_REQUEST_TIMEOUT,
            api_key_cache_prefix: DEFAULT_API_KEY_CACHE_PREFIX.to_string(),
            api_key_cache_ttl: DEFAULT_API_KEY_CACHE_TTL,
            public_api_base_url: None,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl ConnectionConfig {
    /// Create a new builder for `ConnectionConfig`
    #[must_use]
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Load configuration from the process environment
    ///
    /// Recognized variables: `AGENT_REQUEST_TIMEOUT_SECS`, `API_KEY_CACHE_PREFIX`,
    /// `API_KEY_CACHE_TTL_SECS`, `PUBLIC_API_BASE_URL`, `MAX_PAGE_SIZE`,
    /// `BUS_MAX_LINE_BYTES`. Unset variables keep their defaults.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if a variable is set but cannot be parsed or is out of range
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    /// Returns `InvalidConfig` if a value cannot be parsed or is out of range
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(secs) = parse_var::<u64>(&lookup, "AGENT_REQUEST_TIMEOUT_SECS")? {
            builder = builder.agent_request_timeout(Duration::from_secs(secs));
        }
        if let Some(prefix) = lookup("API_KEY_CACHE_PREFIX") {
            builder = builder.api_key_cache_prefix(prefix);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "API_KEY_CACHE_TTL_SECS")? {
            builder = builder.api_key_cache_ttl(Duration::from_secs(secs));
        }
        if let Some(base) = lookup("PUBLIC_API_BASE_URL").filter(|b| !b.trim().is_empty()) {
            builder = builder.public_api_base_url(base);
        }
        if let Some(size) = parse_var::<usize>(&lookup, "MAX_PAGE_SIZE")? {
            builder = builder.max_page_size(size);
        }
        if let Some(bytes) = parse_var::<usize>(&lookup, "BUS_MAX_LINE_BYTES")? {
            builder = builder.max_line_bytes(bytes);
        }

        builder.build()
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConnectionError::invalid_config(format!("{key}={raw} is not a valid value"))),
    }
}

// ============================================================================
// Builder for ConnectionConfig
// ============================================================================

/// Builder for `ConnectionConfig`
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Set the outbound request timeout
    #[must_use]
    pub const fn agent_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.agent_request_timeout = timeout;
        self
    }

    /// Set the API key cache prefix
    #[must_use]
    pub fn api_key_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.api_key_cache_prefix = prefix.into();
        self
    }

    /// Set the API key cache lifetime
    #[must_use]
    pub const fn api_key_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.api_key_cache_ttl = ttl;
        self
    }

    /// Set the public API base URL
    #[must_use]
    pub fn public_api_base_url(mut self, base: impl Into<String>) -> Self {
        self.config.public_api_base_url = Some(base.into());
        self
    }

    /// Set the largest page a listing may request
    #[must_use]
    pub const fn max_page_size(mut self, size: usize) -> Self {
        self.config.max_page_size = size;
        self
    }

    /// Set the maximum size of one bus line
    #[must_use]
    pub const fn max_line_bytes(mut self, bytes: usize) -> Self {
        self.config.max_line_bytes = bytes;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    /// Returns `InvalidConfig` if any value is out of range
    pub fn build(self) -> Result<ConnectionConfig> {
        let config = self.config;

        if config.agent_request_timeout.is_zero()
            || config.agent_request_timeout > MAX_AGENT_REQUEST_TIMEOUT
        {
            return Err(ConnectionError::invalid_config(format!(
                "agent request timeout must be between 1s and {}s",
                MAX_AGENT_REQUEST_TIMEOUT.as_secs()
            )));
        }
        if config.api_key_cache_prefix.trim().is_empty() {
            return Err(ConnectionError::invalid_config(
                "API key cache prefix must not be empty",
            ));
        }
        if config.api_key_cache_ttl.is_zero() || config.api_key_cache_ttl > MAX_API_KEY_CACHE_TTL {
            return Err(ConnectionError::invalid_config(format!(
                "API key cache TTL must be between 1s and {}s",
                MAX_API_KEY_CACHE_TTL.as_secs()
            )));
        }
        if config.max_page_size == 0 {
            return Err(ConnectionError::invalid_config("max page size must be positive"));
        }
        if config.max_line_bytes < 1024 {
            return Err(ConnectionError::invalid_config(
                "bus line limit must be at least 1024 bytes",
            ));
        }

        Ok(config)
    }
}
