//! HTTP transport used by the payment client
//!
//! The client only needs a single GET, so the seam is a small async trait.
//! [`ReqwestTransport`] is the production implementation; tests inject
//! their own.

use crate::config::EasypayConfig;
use crate::credentials::Credentials;
use crate::{EasypayError, Result};
use async_trait::async_trait;
use reqwest::{redirect, Client};
use url::Url;

/// Maximum redirect hops followed when redirects are enabled
pub const MAX_REDIRECTS: usize = 10;

/// Largest response body read from the processor, in bytes
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Outbound GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub url: Url,
    /// Sent as HTTP basic auth
    pub credentials: Option<Credentials>,
}

/// Raw response handed back to the client for interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Single HTTP GET against the processor.
///
/// Implementations report connection, TLS and timeout failures as
/// [`EasypayError::Transport`]; any HTTP status is a successful transport
/// call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// reqwest-backed transport with certificate validation on by default
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport using the timeouts, redirect and TLS settings of `config`
    pub fn new(config: &EasypayConfig) -> Result<Self> {
        let redirect_policy = if config.follow_redirects {
            redirect::Policy::limited(MAX_REDIRECTS)
        } else {
            redirect::Policy::none()
        };

        let client = Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(redirect_policy)
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .build()
            .map_err(|e| EasypayError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self.client.get(request.url);

        if let Some(credentials) = &request.credentials {
            builder = builder.basic_auth(credentials.username(), Some(credentials.password()));
        }

        let mut response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();

        if response
            .content_length()
            .is_some_and(|len| len > MAX_RESPONSE_BYTES as u64)
        {
            return Err(body_too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(map_reqwest_error)? {
            if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
                return Err(body_too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(TransportResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

fn body_too_large() -> EasypayError {
    EasypayError::malformed_response(format!(
        "response body exceeds {} bytes",
        MAX_RESPONSE_BYTES
    ))
}

fn map_reqwest_error(error: reqwest::Error) -> EasypayError {
    let error = error.without_url();
    if error.is_timeout() {
        EasypayError::timeout(format!("Request timed out: {}", error))
    } else if error.is_connect() {
        EasypayError::transport(format!("Connection failed: {}", error))
    } else {
        EasypayError::transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_status_classes() {
        assert!(TransportResponse::new(200, "{}").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(302, "").is_success());
        assert!(!TransportResponse::new(500, "").is_success());
    }

    #[test]
    fn test_transport_builds_from_config() {
        let config = EasypayConfig::new("https://easypay.example/api/create-payment-url")
            .unwrap()
            .with_follow_redirects(false);
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[test]
    fn test_request_debug_hides_password() {
        let request = TransportRequest {
            url: Url::parse("https://easypay.example/x?paymentId=1&amount=2").unwrap(),
            credentials: Some(Credentials::new("shop", "s3cret")),
        };
        assert!(!format!("{:?}", request).contains("s3cret"));
    }
}
