//! # easypay - hosted-redirect payment initiation
//!
//! Client for the Easypay processor's create-payment-url endpoint, plus the
//! checkout glue around it. A checkout asks the processor for a hosted
//! payment page for an order, then sends the shopper there.
//!
//! The crate covers:
//! - [`PaymentInitiationClient`]: validates a [`PaymentRequest`], calls the
//!   processor through an injected [`Transport`] and classifies the outcome
//!   as a [`PaymentInitiationResult`].
//! - [`CheckoutFlow`]: puts the order on hold, initiates the payment and
//!   only then reduces stock and empties the cart.
//! - Configuration, credential providers and an optional axum presenter.

pub mod checkout;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod retry;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use checkout::{CheckoutFlow, CheckoutStep, OrderProcessor, PendingFinalization, PresenterInstruction};
pub use client::PaymentInitiationClient;
pub use config::EasypayConfig;
pub use credentials::{CredentialProvider, Credentials, EnvCredentials, NoCredentials, StaticCredentials};
pub use error::{EasypayError, FailureKind, Result};
pub use gateway::GatewaySettings;
pub use retry::RetryPolicy;
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use types::*;

// Feature-gated framework support
#[cfg(feature = "axum")]
pub mod axum;

/// Current version of the easypay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
