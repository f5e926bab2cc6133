//! Axum integration for the checkout flow

use crate::checkout::{CheckoutFlow, PresenterInstruction};
use crate::error::FailureKind;
use crate::types::OrderId;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Path of the checkout route
pub const CHECKOUT_PATH: &str = "/checkout";

impl IntoResponse for PresenterInstruction {
    fn into_response(self) -> Response {
        let status = match &self {
            PresenterInstruction::Success { redirect } => {
                return Redirect::to(redirect.as_str()).into_response()
            }
            PresenterInstruction::Failure { kind, .. } => failure_status(*kind),
        };
        (status, Json(self)).into_response()
    }
}

/// HTTP status used when presenting a failure
pub fn failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::TransportError | FailureKind::MalformedResponse => StatusCode::BAD_GATEWAY,
        FailureKind::ProcessorRejected => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Body of `POST /checkout`.
///
/// Only the order is named; the amount charged is the order total held by the
/// shop's [`OrderProcessor`](crate::checkout::OrderProcessor). Other fields are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub order_id: OrderId,
}

/// Router exposing `POST /checkout` with a `{"orderId"}` body
pub fn checkout_router(flow: CheckoutFlow) -> Router {
    Router::new()
        .route(CHECKOUT_PATH, post(checkout_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(flow)
}

async fn checkout_handler(
    State(flow): State<CheckoutFlow>,
    Json(request): Json<CheckoutRequest>,
) -> PresenterInstruction {
    flow.process_order(&request.order_id).await
}
