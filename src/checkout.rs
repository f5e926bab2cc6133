//! Two-step checkout flow
//!
//! Requesting the payment URL and finalizing the order are separate steps.
//! [`CheckoutFlow::begin`] puts the order on hold and asks the processor for
//! a payment page; it never touches stock or the cart. Only a successful
//! initiation produces a [`PendingFinalization`], and only consuming that
//! token in [`CheckoutFlow::finalize`] reduces stock and empties the cart.
//! A crash between the two steps leaves an on-hold order with stock and cart
//! untouched.
//!
//! Stock is reduced at most once per order. If emptying the cart fails after
//! stock was reduced, a retried checkout skips the reduction and only empties
//! the cart.

use crate::client::PaymentInitiationClient;
use crate::error::FailureKind;
use crate::types::{OrderId, PaymentInitiationResult, PaymentRequest};
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};
use url::Url;

/// Order note recorded when the order is put on hold
pub const AWAITING_PAYMENT_NOTE: &str = "Awaiting payment";

/// Order lifecycle owned by the host shop
#[async_trait]
pub trait OrderProcessor: Send + Sync {
    /// Total the shopper owes for the order, as recorded by the shop
    async fn order_total(&self, order_id: &OrderId) -> Result<Decimal>;

    /// Move the order to the on-hold status with `note`
    async fn mark_awaiting_payment(&self, order_id: &OrderId, note: &str) -> Result<()>;

    /// Whether stock levels were already reduced for the order
    async fn stock_reduced(&self, order_id: &OrderId) -> Result<bool>;

    /// Reduce stock levels for the order's items.
    ///
    /// Must record the reduction so that [`OrderProcessor::stock_reduced`]
    /// reports it afterwards.
    async fn reduce_stock(&self, order_id: &OrderId) -> Result<()>;

    /// Empty the cart the order was placed from
    async fn empty_cart(&self, order_id: &OrderId) -> Result<()>;
}

/// Proof that the processor issued a payment URL for an order.
///
/// Not `Clone`: each token finalizes its order once.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingFinalization {
    order_id: OrderId,
    redirect_url: Url,
}

impl PendingFinalization {
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn redirect_url(&self) -> &Url {
        &self.redirect_url
    }
}

/// Result of the first checkout step
#[derive(Debug, PartialEq, Eq)]
pub enum CheckoutStep {
    /// Payment URL issued; finalize the order, then redirect
    Redirect(PendingFinalization),
    /// Payment could not be initiated; show an error, do not redirect
    Failed { kind: FailureKind, detail: String },
}

/// What the presenter should do with the shopper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PresenterInstruction {
    /// Send the shopper to the hosted payment page
    Success { redirect: Url },
    /// Stay on checkout and show `message`
    Failure {
        kind: FailureKind,
        message: String,
        detail: String,
    },
}

impl PresenterInstruction {
    pub fn redirect(url: Url) -> Self {
        Self::Success { redirect: url }
    }

    /// Failure with the shopper-facing message for `kind`
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: shopper_message(kind).to_string(),
            detail: detail.into(),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<PaymentInitiationResult> for PresenterInstruction {
    fn from(result: PaymentInitiationResult) -> Self {
        match result {
            PaymentInitiationResult::Success { redirect_url } => Self::redirect(redirect_url),
            PaymentInitiationResult::Failure { kind, detail } => Self::failure(kind, detail),
        }
    }
}

/// Shopper-facing text for a failure kind
pub fn shopper_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::TransportError => {
            "The payment service is temporarily unavailable. Please try again."
        }
        FailureKind::MalformedResponse | FailureKind::ProcessorRejected => {
            "Payment could not be initiated."
        }
    }
}

/// Drives a checkout through the payment client and the shop's order processor
#[derive(Clone)]
pub struct CheckoutFlow {
    client: PaymentInitiationClient,
    orders: Arc<dyn OrderProcessor>,
}

impl std::fmt::Debug for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("client", &self.client)
            .field("orders", &"<order processor>")
            .finish()
    }
}

impl CheckoutFlow {
    pub fn new(client: PaymentInitiationClient, orders: Arc<dyn OrderProcessor>) -> Self {
        Self { client, orders }
    }

    pub fn client(&self) -> &PaymentInitiationClient {
        &self.client
    }

    /// Step one: put the order on hold and request a payment URL.
    ///
    /// Errors are order-processor failures; payment failures come back as
    /// [`CheckoutStep::Failed`].
    pub async fn begin(&self, request: &PaymentRequest) -> Result<CheckoutStep> {
        self.orders
            .mark_awaiting_payment(request.order_id(), AWAITING_PAYMENT_NOTE)
            .await?;

        Ok(match self.client.initiate(request).await {
            PaymentInitiationResult::Success { redirect_url } => {
                CheckoutStep::Redirect(PendingFinalization {
                    order_id: request.order_id().clone(),
                    redirect_url,
                })
            }
            PaymentInitiationResult::Failure { kind, detail } => {
                CheckoutStep::Failed { kind, detail }
            }
        })
    }

    /// Step two: reduce stock once and empty the cart, returning the URL to
    /// redirect to
    pub async fn finalize(&self, pending: PendingFinalization) -> Result<Url> {
        if self.orders.stock_reduced(&pending.order_id).await? {
            debug!(order_id = %pending.order_id, "stock already reduced, skipping");
        } else {
            self.orders.reduce_stock(&pending.order_id).await?;
        }
        self.orders.empty_cart(&pending.order_id).await?;

        info!(order_id = %pending.order_id, "order finalized, redirecting to payment page");
        Ok(pending.redirect_url)
    }

    /// Check out an order for the total the shop has on record.
    ///
    /// This is the entry point for untrusted callers: the amount never comes
    /// from the shopper.
    pub async fn process_order(&self, order_id: &OrderId) -> PresenterInstruction {
        let total = match self.orders.order_total(order_id).await {
            Ok(total) => total,
            Err(e) => {
                error!(order_id = %order_id, error = %e, "could not look up order total");
                return PresenterInstruction::failure(e.failure_kind(), e.detail());
            }
        };

        self.process(&PaymentRequest::new(order_id.clone(), total)).await
    }

    /// Run both steps and tell the presenter what to do.
    ///
    /// If finalizing fails the shopper is not redirected: the order stays on
    /// hold and a new checkout attempt can request the URL again.
    pub async fn process(&self, request: &PaymentRequest) -> PresenterInstruction {
        let step = match self.begin(request).await {
            Ok(step) => step,
            Err(e) => {
                error!(order_id = %request.order_id(), error = %e, "could not put order on hold");
                return PresenterInstruction::failure(e.failure_kind(), e.detail());
            }
        };

        match step {
            CheckoutStep::Redirect(pending) => match self.finalize(pending).await {
                Ok(url) => PresenterInstruction::redirect(url),
                Err(e) => {
                    error!(order_id = %request.order_id(), error = %e, "could not finalize order");
                    PresenterInstruction::failure(e.failure_kind(), e.detail())
                }
            },
            CheckoutStep::Failed { kind, detail } => PresenterInstruction::failure(kind, detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presenter_instruction_shape() {
        let url = Url::parse("https://easypay.example/pay/abc").unwrap();
        let json = serde_json::to_value(PresenterInstruction::redirect(url)).unwrap();
        assert_eq!(json["result"], "success");
        assert_eq!(json["redirect"], "https://easypay.example/pay/abc");

        let json = serde_json::to_value(PresenterInstruction::failure(
            FailureKind::ProcessorRejected,
            "invalid amount",
        ))
        .unwrap();
        assert_eq!(json["result"], "failure");
        assert_eq!(json["kind"], "processor_rejected");
        assert_eq!(json["message"], "Payment could not be initiated.");
        assert_eq!(json["detail"], "invalid amount");
    }

    #[test]
    fn test_instruction_from_result() {
        let failed: PresenterInstruction =
            PaymentInitiationResult::failure(FailureKind::TransportError, "timed out").into();
        assert!(!failed.is_redirect());
        match failed {
            PresenterInstruction::Failure { message, .. } => {
                assert!(message.contains("temporarily unavailable"))
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
