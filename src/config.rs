//! Client configuration
//!
//! The processor endpoint, timeouts and retry policy are injected here
//! instead of living in code. Configuration can be built programmatically,
//! read from `EASYPAY_*` environment variables or loaded from a JSON file.

use crate::credentials::Credentials;
use crate::gateway::GatewaySettings;
use crate::retry::{duration_ms, RetryPolicy, MAX_RETRIES_LIMIT};
use crate::{EasypayError, Result};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Default request timeout for an interactive checkout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default TCP/TLS connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`PaymentInitiationClient`](crate::PaymentInitiationClient)
#[derive(Clone, Serialize, Deserialize)]
pub struct EasypayConfig {
    /// Create-payment-url endpoint, without credentials
    pub endpoint: Url,
    /// Whole-request timeout
    #[serde(rename = "timeout_ms", with = "duration_ms", default = "default_timeout")]
    pub timeout: Duration,
    /// Connect timeout
    #[serde(
        rename = "connect_timeout_ms",
        with = "duration_ms",
        default = "default_connect_timeout"
    )]
    pub connect_timeout: Duration,
    /// Retry policy for transport failures
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Follow HTTP redirects issued by the endpoint
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    /// Skip TLS certificate validation. Test environments only.
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
    /// Presentation settings of the payment method
    #[serde(default)]
    pub gateway: GatewaySettings,
    /// Credentials that were embedded in the configured endpoint URL
    #[serde(skip)]
    embedded_credentials: Option<Credentials>,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_true() -> bool {
    true
}

impl std::fmt::Debug for EasypayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EasypayConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("retry", &self.retry)
            .field("follow_redirects", &self.follow_redirects)
            .field("danger_accept_invalid_certs", &self.danger_accept_invalid_certs)
            .field("gateway", &self.gateway)
            .field(
                "embedded_credentials",
                &self.embedded_credentials.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl EasypayConfig {
    /// Create a config for `endpoint` with default settings.
    ///
    /// A `user:password@` part in the endpoint is moved out of the URL and
    /// kept as fallback credentials.
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.as_ref())
            .map_err(|e| EasypayError::config(format!("Invalid endpoint URL: {}", e)))?;

        let mut config = Self {
            endpoint,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry: RetryPolicy::default(),
            follow_redirects: true,
            danger_accept_invalid_certs: false,
            gateway: GatewaySettings::default(),
            embedded_credentials: None,
        };
        config.extract_embedded_credentials()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| EasypayError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: EasypayConfig = serde_json::from_str(&content)
            .map_err(|e| EasypayError::config(format!("Failed to parse config file: {}", e)))?;

        config.extract_embedded_credentials()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("EASYPAY_ENDPOINT")
            .map_err(|_| EasypayError::config("EASYPAY_ENDPOINT is not set"))?;
        let mut config = Self::new(endpoint)?;

        if let Some(ms) = env_parse::<u64>("EASYPAY_TIMEOUT_MS")? {
            config.timeout = Duration::from_millis(ms);
        }

        if let Some(ms) = env_parse::<u64>("EASYPAY_CONNECT_TIMEOUT_MS")? {
            config.connect_timeout = Duration::from_millis(ms);
        }

        if let Some(retries) = env_parse::<u32>("EASYPAY_MAX_RETRIES")? {
            config.retry.max_retries = retries;
        }

        if let Some(ms) = env_parse::<u64>("EASYPAY_RETRY_BACKOFF_MS")? {
            config.retry.initial_backoff = Duration::from_millis(ms);
        }

        if let Some(follow) = env_parse::<bool>("EASYPAY_FOLLOW_REDIRECTS")? {
            config.follow_redirects = follow;
        }

        if let Some(insecure) = env_parse::<bool>("EASYPAY_DANGER_ACCEPT_INVALID_CERTS")? {
            config.danger_accept_invalid_certs = insecure;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.endpoint.scheme() {
            "http" | "https" => {}
            other => {
                return Err(EasypayError::config(format!(
                    "Endpoint scheme must be http or https, got {}",
                    other
                )))
            }
        }

        if self.endpoint.host_str().is_none() {
            return Err(EasypayError::config("Endpoint URL has no host"));
        }

        if self.timeout.is_zero() {
            return Err(EasypayError::config("Timeout must be greater than zero"));
        }

        if self.connect_timeout.is_zero() {
            return Err(EasypayError::config(
                "Connect timeout must be greater than zero",
            ));
        }

        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(EasypayError::config(format!(
                "At most {} retries are allowed, got {}",
                MAX_RETRIES_LIMIT, self.retry.max_retries
            )));
        }

        if self.danger_accept_invalid_certs {
            warn!(
                endpoint = %self.endpoint,
                "TLS certificate validation is disabled; use only in test environments"
            );
        }

        Ok(())
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set whether redirects from the endpoint are followed
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Disable TLS certificate validation. Never enable this in production.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.danger_accept_invalid_certs = accept;
        self
    }

    /// Set the gateway presentation settings
    pub fn with_gateway(mut self, gateway: GatewaySettings) -> Self {
        self.gateway = gateway;
        self
    }

    /// Credentials that were embedded in the endpoint, if any
    pub fn embedded_credentials(&self) -> Option<&Credentials> {
        self.embedded_credentials.as_ref()
    }

    fn extract_embedded_credentials(&mut self) -> Result<()> {
        if self.endpoint.username().is_empty() && self.endpoint.password().is_none() {
            return Ok(());
        }

        let username = decode_userinfo(self.endpoint.username())?;
        let password = decode_userinfo(self.endpoint.password().unwrap_or(""))?;

        self.endpoint
            .set_username("")
            .and_then(|_| self.endpoint.set_password(None))
            .map_err(|_| EasypayError::config("Endpoint URL cannot carry credentials"))?;

        self.embedded_credentials = Some(Credentials::new(username, password));
        Ok(())
    }
}

fn decode_userinfo(raw: &str) -> Result<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| EasypayError::config("Endpoint credentials are not valid UTF-8"))
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| EasypayError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}
