//! Core types for hosted-redirect payment initiation

use crate::error::{EasypayError, FailureKind, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use url::Url;

/// Query parameter carrying the order identifier
pub const PAYMENT_ID_PARAM: &str = "paymentId";

/// Query parameter carrying the order total
pub const AMOUNT_PARAM: &str = "amount";

/// Opaque order identifier supplied by the host shop.
///
/// Shops hand out either numeric ids or strings; both are kept in their
/// textual form since that is what goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Serialize for OrderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawOrderId {
            Number(u64),
            Text(String),
        }

        Ok(match RawOrderId::deserialize(deserializer)? {
            RawOrderId::Number(n) => OrderId::from(n),
            RawOrderId::Text(s) => OrderId::from(s),
        })
    }
}

/// A single checkout attempt's request for a hosted payment page.
///
/// Built once per attempt and never mutated afterwards; the fields are only
/// reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    order_id: OrderId,
    amount: Decimal,
}

impl PaymentRequest {
    /// Create a payment request. Validation happens in the client, before any
    /// network call.
    pub fn new(order_id: impl Into<OrderId>, amount: Decimal) -> Self {
        Self {
            order_id: order_id.into(),
            amount,
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Check the local invariants: a non-empty order id and a non-negative amount
    pub fn validate(&self) -> Result<()> {
        if self.order_id.is_empty() {
            return Err(EasypayError::invalid_request("invalid order id"));
        }
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(EasypayError::invalid_request("invalid amount"));
        }
        Ok(())
    }

    /// Query pairs sent to the processor, in wire order
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            (PAYMENT_ID_PARAM, self.order_id.to_string()),
            (AMOUNT_PARAM, self.amount.to_string()),
        ]
    }
}

/// Outcome of a payment initiation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentInitiationResult {
    /// The processor accepted the request; send the shopper to `redirect_url`
    Success { redirect_url: Url },
    /// The payment could not be initiated
    Failure { kind: FailureKind, detail: String },
}

impl PaymentInitiationResult {
    pub fn success(redirect_url: Url) -> Self {
        Self::Success { redirect_url }
    }

    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn redirect_url(&self) -> Option<&Url> {
        match self {
            Self::Success { redirect_url } => Some(redirect_url),
            Self::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<EasypayError> for PaymentInitiationResult {
    fn from(error: EasypayError) -> Self {
        Self::Failure {
            kind: error.failure_kind(),
            detail: error.detail(),
        }
    }
}

impl From<Result<Url>> for PaymentInitiationResult {
    fn from(result: Result<Url>) -> Self {
        match result {
            Ok(url) => Self::success(url),
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_order_id_from_number_and_string() {
        assert_eq!(OrderId::from(15u64).as_str(), "15");
        assert_eq!(OrderId::from("wc-15").as_str(), "wc-15");
        assert!(OrderId::from("   ").is_empty());
    }

    #[test]
    fn test_order_id_deserializes_numbers_and_strings() {
        let numeric: OrderId = serde_json::from_str("15").unwrap();
        let text: OrderId = serde_json::from_str("\"15\"").unwrap();
        assert_eq!(numeric, text);
    }

    #[test]
    fn test_query_pairs_keep_decimal_precision() {
        let request = PaymentRequest::new(15u64, Decimal::from_str("52.75").unwrap());
        let pairs = request.query_pairs();
        assert_eq!(pairs[0], ("paymentId", "15".to_string()));
        assert_eq!(pairs[1], ("amount", "52.75".to_string()));

        let request = PaymentRequest::new(7u64, Decimal::from_str("10.10").unwrap());
        assert_eq!(request.query_pairs()[1].1, "10.10");
    }

    #[test]
    fn test_validate() {
        assert!(PaymentRequest::new(1u64, Decimal::ZERO).validate().is_ok());

        let negative = PaymentRequest::new(1u64, Decimal::from_str("-0.01").unwrap());
        let err = negative.validate().unwrap_err();
        assert_eq!(err.detail(), "invalid amount");

        let empty = PaymentRequest::new("", Decimal::ONE);
        let err = empty.validate().unwrap_err();
        assert_eq!(err.detail(), "invalid order id");
    }

    #[test]
    fn test_result_from_error() {
        let result: PaymentInitiationResult = EasypayError::timeout("elapsed").into();
        assert_eq!(result.failure_kind(), Some(FailureKind::TransportError));
        assert!(result.redirect_url().is_none());
    }

    #[test]
    fn test_result_serialization() {
        let result = PaymentInitiationResult::success(Url::parse("https://pay.example/x").unwrap());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["redirect_url"], "https://pay.example/x");
    }
}
