#![allow(dead_code)]

use async_trait::async_trait;
use easypay::{
    EasypayConfig, EasypayError, OrderId, OrderProcessor, PaymentInitiationClient, Result,
    Transport, TransportRequest, TransportResponse,
};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub const TEST_ENDPOINT: &str = "https://easypay.example/api/create-payment-url";

/// Total `RecordingOrders` reports for every order unless told otherwise
pub const ORDER_TOTAL: &str = "52.75";

/// Canned outcome for one transport call
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(u16, String),
    Timeout,
    ConnectionRefused,
}

impl Scripted {
    pub fn json(body: serde_json::Value) -> Self {
        Scripted::Respond(200, body.to_string())
    }
}

/// Transport double that replays scripted outcomes and records every call
#[derive(Debug, Default)]
pub struct RecordingTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<TransportRequest>>,
}

impl RecordingTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.calls.lock().unwrap().push(request);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scripted::ConnectionRefused);

        match next {
            Scripted::Respond(status, body) => Ok(TransportResponse::new(status, body)),
            Scripted::Timeout => Err(EasypayError::timeout("operation timed out")),
            Scripted::ConnectionRefused => Err(EasypayError::transport("connection refused")),
        }
    }
}

pub fn test_config() -> EasypayConfig {
    EasypayConfig::new(TEST_ENDPOINT).unwrap()
}

pub fn client_with(transport: Arc<RecordingTransport>) -> PaymentInitiationClient {
    PaymentInitiationClient::with_transport(test_config(), transport)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
    OnHold(OrderId, String),
    StockReduced(OrderId),
    CartEmptied(OrderId),
}

/// Order processor double recording every mutation
#[derive(Debug, Default)]
pub struct RecordingOrders {
    events: Mutex<Vec<OrderEvent>>,
    total: Option<Decimal>,
    fail_stock: bool,
    fail_hold: bool,
    fail_cart: Mutex<bool>,
}

impl RecordingOrders {
    fn with_order_total() -> Self {
        Self {
            total: Some(Decimal::from_str(ORDER_TOTAL).unwrap()),
            ..Self::default()
        }
    }

    pub fn new() -> Arc<Self> {
        Arc::new(Self::with_order_total())
    }

    pub fn with_total(total: Decimal) -> Arc<Self> {
        Arc::new(Self {
            total: Some(total),
            ..Self::default()
        })
    }

    /// No order is known, so looking up a total fails
    pub fn unknown_order() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_stock() -> Arc<Self> {
        Arc::new(Self {
            fail_stock: true,
            ..Self::with_order_total()
        })
    }

    pub fn failing_hold() -> Arc<Self> {
        Arc::new(Self {
            fail_hold: true,
            ..Self::with_order_total()
        })
    }

    /// Emptying the cart fails until [`RecordingOrders::repair_cart`] is called
    pub fn failing_cart() -> Arc<Self> {
        Arc::new(Self {
            fail_cart: Mutex::new(true),
            ..Self::with_order_total()
        })
    }

    pub fn repair_cart(&self) {
        *self.fail_cart.lock().unwrap() = false;
    }

    pub fn events(&self) -> Vec<OrderEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn stock_reductions(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, OrderEvent::StockReduced(_)))
            .count()
    }

    pub fn cart_empties(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, OrderEvent::CartEmptied(_)))
            .count()
    }
}

#[async_trait]
impl OrderProcessor for RecordingOrders {
    async fn order_total(&self, _order_id: &OrderId) -> Result<Decimal> {
        self.total.ok_or_else(|| EasypayError::order("order not found"))
    }

    async fn mark_awaiting_payment(&self, order_id: &OrderId, note: &str) -> Result<()> {
        if self.fail_hold {
            return Err(EasypayError::order("order not found"));
        }
        self.events
            .lock()
            .unwrap()
            .push(OrderEvent::OnHold(order_id.clone(), note.to_string()));
        Ok(())
    }

    async fn stock_reduced(&self, order_id: &OrderId) -> Result<bool> {
        Ok(self
            .events()
            .iter()
            .any(|e| *e == OrderEvent::StockReduced(order_id.clone())))
    }

    async fn reduce_stock(&self, order_id: &OrderId) -> Result<()> {
        if self.fail_stock {
            return Err(EasypayError::order("stock table locked"));
        }
        self.events
            .lock()
            .unwrap()
            .push(OrderEvent::StockReduced(order_id.clone()));
        Ok(())
    }

    async fn empty_cart(&self, order_id: &OrderId) -> Result<()> {
        if *self.fail_cart.lock().unwrap() {
            return Err(EasypayError::order("cart session expired"));
        }
        self.events
            .lock()
            .unwrap()
            .push(OrderEvent::CartEmptied(order_id.clone()));
        Ok(())
    }
}
