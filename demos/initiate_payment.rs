//! Request a hosted payment page for one order
//!
//! ```text
//! EASYPAY_ENDPOINT=https://easypay.example/api/create-payment-url \
//! EASYPAY_USERNAME=shop EASYPAY_PASSWORD=... \
//! cargo run --example initiate_payment -- 15 52.75
//! ```

use easypay::{
    EasypayConfig, EnvCredentials, PaymentInitiationClient, PaymentInitiationResult,
    PaymentRequest,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let order_id = args.next().ok_or("usage: initiate_payment <order-id> <amount>")?;
    let amount = Decimal::from_str(&args.next().ok_or("usage: initiate_payment <order-id> <amount>")?)?;

    let config = EasypayConfig::from_env()?;
    let client = PaymentInitiationClient::new(config)?.with_credentials(EnvCredentials::new());

    match client.initiate(&PaymentRequest::new(order_id, amount)).await {
        PaymentInitiationResult::Success { redirect_url } => {
            println!("Redirect the shopper to: {}", redirect_url);
        }
        PaymentInitiationResult::Failure { kind, detail } => {
            eprintln!("Payment could not be initiated ({}): {}", kind, detail);
            std::process::exit(1);
        }
    }

    Ok(())
}
