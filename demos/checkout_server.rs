//! Checkout server that redirects shoppers to the hosted payment page
//!
//! Orders are only logged here and every order costs the same; a real shop
//! plugs its own [`OrderProcessor`] in.

use async_trait::async_trait;
use easypay::{
    axum::checkout_router, CheckoutFlow, EasypayConfig, EnvCredentials, OrderId, OrderProcessor,
    PaymentInitiationClient,
};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct LoggingOrders {
    total: Decimal,
    stock_reduced: Mutex<HashSet<OrderId>>,
}

#[async_trait]
impl OrderProcessor for LoggingOrders {
    async fn order_total(&self, _order_id: &OrderId) -> easypay::Result<Decimal> {
        Ok(self.total)
    }

    async fn mark_awaiting_payment(&self, order_id: &OrderId, note: &str) -> easypay::Result<()> {
        info!(%order_id, note, "order on hold");
        Ok(())
    }

    async fn stock_reduced(&self, order_id: &OrderId) -> easypay::Result<bool> {
        let reduced = self
            .stock_reduced
            .lock()
            .map_err(|_| easypay::EasypayError::order("stock ledger poisoned"))?;
        Ok(reduced.contains(order_id))
    }

    async fn reduce_stock(&self, order_id: &OrderId) -> easypay::Result<()> {
        self.stock_reduced
            .lock()
            .map_err(|_| easypay::EasypayError::order("stock ledger poisoned"))?
            .insert(order_id.clone());
        info!(%order_id, "stock reduced");
        Ok(())
    }

    async fn empty_cart(&self, order_id: &OrderId) -> easypay::Result<()> {
        info!(%order_id, "cart emptied");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = EasypayConfig::from_env()?;
    let client = PaymentInitiationClient::new(config)?.with_credentials(EnvCredentials::new());
    let total = Decimal::from_str(
        &std::env::var("DEMO_ORDER_TOTAL").unwrap_or_else(|_| "52.75".to_string()),
    )?;
    let orders = LoggingOrders {
        total,
        stock_reduced: Mutex::new(HashSet::new()),
    };
    let app = checkout_router(CheckoutFlow::new(client, Arc::new(orders)));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:4021").await?;
    info!("checkout server listening on http://0.0.0.0:4021");
    info!(%total, "POST /checkout {{\"orderId\": 15}}");

    axum::serve(listener, app).await?;
    Ok(())
}
