//! Payment-method settings shown by the host shop

use serde::{Deserialize, Serialize};

/// Identifier the shop registers this payment method under
pub const GATEWAY_ID: &str = "easypay_gateway";

/// Order status meaning payment is expected but not yet confirmed
pub const ON_HOLD_STATUS: &str = "on-hold";

/// Presentation settings for the payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub id: String,
    pub enabled: bool,
    /// Name the shopper sees at checkout
    pub title: String,
    /// Description the shopper sees at checkout
    pub description: String,
    /// Text for the thank-you page and emails; falls back to the description
    pub instructions: Option<String>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            id: GATEWAY_ID.to_string(),
            enabled: true,
            title: "Easypay Payment".to_string(),
            description: "Please remit payment to Store Name upon pickup or delivery.".to_string(),
            instructions: None,
        }
    }
}

/// The parts of a shop order the instruction rules look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub payment_method: String,
    pub status: String,
}

impl OrderSummary {
    pub fn new(payment_method: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            payment_method: payment_method.into(),
            status: status.into(),
        }
    }
}

impl GatewaySettings {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Effective instructions, if any are non-blank
    pub fn instructions(&self) -> Option<&str> {
        let text = self.instructions.as_deref().unwrap_or(&self.description);
        (!text.trim().is_empty()).then_some(text)
    }

    /// Text for the order-received page
    pub fn thank_you_text(&self) -> Option<&str> {
        self.instructions()
    }

    /// Text appended to a customer email about `order`.
    ///
    /// Only on-hold orders paid with this method get it, and never the
    /// admin copy.
    pub fn email_instructions(&self, order: &OrderSummary, sent_to_admin: bool) -> Option<&str> {
        if sent_to_admin || order.payment_method != self.id || order.status != ON_HOLD_STATUS {
            return None;
        }
        self.instructions()
    }
}
