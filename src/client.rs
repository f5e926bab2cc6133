//! Payment initiation client
//!
//! Turns a [`PaymentRequest`] into a hosted payment page URL by calling the
//! processor's create-payment-url endpoint:
//!
//! ```text
//! GET <endpoint>?paymentId=<order id>&amount=<amount>
//! -> {"url": "https://..."}
//! ```

use crate::config::EasypayConfig;
use crate::credentials::{CredentialProvider, Credentials};
use crate::transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
use crate::types::{PaymentInitiationResult, PaymentRequest};
use crate::{EasypayError, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Response field carrying the hosted payment page
pub const REDIRECT_URL_FIELD: &str = "url";

/// Client for the processor's create-payment-url endpoint.
///
/// Each call is independent: the client holds no per-order state and can be
/// shared across tasks. A call makes one request plus the retries allowed by
/// the configured [`RetryPolicy`](crate::RetryPolicy), bounded by the
/// configured timeout.
///
/// Calling [`initiate`](Self::initiate) again for the same order assumes the
/// processor treats a repeated `paymentId` as the same payment and does not
/// charge twice. This client does not check that.
#[derive(Clone)]
pub struct PaymentInitiationClient {
    config: EasypayConfig,
    transport: Arc<dyn Transport>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl std::fmt::Debug for PaymentInitiationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentInitiationClient")
            .field("config", &self.config)
            .field("transport", &"<transport>")
            .field(
                "credentials",
                &self.credentials.as_ref().map(|_| "<provider>"),
            )
            .finish()
    }
}

impl PaymentInitiationClient {
    /// Create a client that talks to the processor over reqwest.
    ///
    /// The configuration is validated first, so settings changed through the
    /// `with_*` builders are checked here.
    pub fn new(config: EasypayConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client on top of a custom transport
    pub fn with_transport(config: EasypayConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            credentials: None,
        }
    }

    /// Use `provider` for auth material. Credentials embedded in the endpoint
    /// are still used when the provider has none.
    pub fn with_credentials(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.credentials = Some(Arc::new(provider));
        self
    }

    /// Get the client configuration
    pub fn config(&self) -> &EasypayConfig {
        &self.config
    }

    /// Full request URL for `request`.
    ///
    /// The order id and amount are appended to whatever query the endpoint
    /// already carries. The amount keeps its exact decimal text.
    pub fn request_url(&self, request: &PaymentRequest) -> Url {
        let mut url = self.config.endpoint.clone();
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        url
    }

    /// Ask the processor for a hosted payment page.
    ///
    /// Invalid requests (empty order id, negative amount) fail without any
    /// network call. Every failure is returned as
    /// [`PaymentInitiationResult::Failure`]; nothing panics or is swallowed.
    pub async fn initiate(&self, request: &PaymentRequest) -> PaymentInitiationResult {
        match self.try_initiate(request).await {
            Ok(redirect_url) => {
                info!(
                    order_id = %request.order_id(),
                    amount = %request.amount(),
                    "payment url issued"
                );
                PaymentInitiationResult::success(redirect_url)
            }
            Err(e) => {
                warn!(
                    order_id = %request.order_id(),
                    kind = %e.failure_kind(),
                    error = %e,
                    "payment initiation failed"
                );
                e.into()
            }
        }
    }

    /// Same as [`initiate`](Self::initiate) but as a `Result`
    pub async fn try_initiate(&self, request: &PaymentRequest) -> Result<Url> {
        request.validate()?;

        let transport_request = TransportRequest {
            url: self.request_url(request),
            credentials: self.resolve_credentials()?,
        };

        debug!(
            order_id = %request.order_id(),
            amount = %request.amount(),
            endpoint = %self.config.endpoint,
            "requesting payment url"
        );

        let response = self.send_with_retry(transport_request).await?;
        parse_redirect_response(&response)
    }

    fn resolve_credentials(&self) -> Result<Option<Credentials>> {
        match &self.credentials {
            Some(provider) => Ok(provider
                .credentials()?
                .or_else(|| self.config.embedded_credentials().cloned())),
            None => Ok(self.config.embedded_credentials().cloned()),
        }
    }

    async fn send_with_retry(&self, request: TransportRequest) -> Result<TransportResponse> {
        let policy = &self.config.retry;
        let mut retry = 0;

        loop {
            match self.transport.get(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retry < policy.max_retries => {
                    retry += 1;
                    let delay = policy.backoff_for(retry);
                    warn!(
                        retry,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Interpret a processor response.
///
/// A non-2xx status or an explicit error without a URL is a rejection. A
/// body that is not a JSON object, or that lacks a usable absolute http(s)
/// `url`, is malformed.
pub fn parse_redirect_response(response: &TransportResponse) -> Result<Url> {
    let parsed: std::result::Result<Value, _> = serde_json::from_str(&response.body);

    if !response.is_success() {
        let reason = parsed
            .as_ref()
            .ok()
            .and_then(Value::as_object)
            .and_then(error_message);
        return Err(EasypayError::processor_rejected(match reason {
            Some(reason) => format!("processor returned status {}: {}", response.status, reason),
            None => format!("processor returned status {}", response.status),
        }));
    }

    let value = parsed.map_err(|e| {
        EasypayError::malformed_response(format!("response is not valid JSON: {}", e))
    })?;
    let object = value
        .as_object()
        .ok_or_else(|| EasypayError::malformed_response("response is not a JSON object"))?;

    match object.get(REDIRECT_URL_FIELD) {
        Some(Value::String(url)) if !url.trim().is_empty() => parse_redirect_url(url),
        Some(Value::String(_)) | Some(Value::Null) | None => match error_message(object) {
            Some(reason) => Err(EasypayError::processor_rejected(reason)),
            None => Err(EasypayError::malformed_response(
                "response has no url field",
            )),
        },
        Some(_) => Err(EasypayError::malformed_response("url field is not a string")),
    }
}

fn parse_redirect_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        EasypayError::malformed_response(format!("url is not an absolute URL: {}", e))
    })?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(EasypayError::malformed_response(format!(
            "url is not an http(s) URL: {}",
            url.scheme()
        ))),
    }
}

fn error_message(object: &Map<String, Value>) -> Option<String> {
    let message = || {
        object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    match object.get("error") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(Value::Object(inner)) => {
            return Some(
                inner
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| Value::Object(inner.clone()).to_string()),
            )
        }
        Some(Value::Bool(true)) => {
            return Some(message().unwrap_or_else(|| "processor reported an error".to_string()))
        }
        _ => {}
    }

    if matches!(object.get("success"), Some(Value::Bool(false))) {
        return Some(message().unwrap_or_else(|| "processor reported failure".to_string()));
    }

    None
}
