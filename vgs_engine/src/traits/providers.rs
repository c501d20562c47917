use serde_json::Value;
use thiserror::Error;
use vgs_common::Money;

use crate::db_types::{ContactInfo, FulfillmentTarget, ItemRef, OrderId};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Could not reach the payment gateway: {0}")]
    Transport(String),
    #[error("The payment gateway rejected the request. Error {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Could not parse the gateway response: {0}")]
    BadResponse(String),
}

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("Could not reach the fulfillment provider: {0}")]
    Transport(String),
    #[error("Could not parse the fulfillment response: {0}")]
    BadResponse(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Could not reach the game catalog: {0}")]
    Transport(String),
    #[error("Could not parse the catalog response: {0}")]
    BadResponse(String),
}

/// A payment session opened at the gateway for a specific order.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub gateway_order_id: String,
    /// Where the buyer's client is redirected to complete payment.
    pub payment_url: String,
}

/// Parsed gateway transaction state. The reconciliation state machine only ever sees this tagged
/// type; raw provider JSON stays at the client edge (and rides along for the audit trail).
#[derive(Debug, Clone)]
pub enum GatewayStatus {
    /// The buyer has not completed payment yet. Callers are expected to poll again.
    Pending,
    /// The gateway reports a completed payment of `amount`. The amount is whatever the gateway
    /// says was paid; a zero or unparseable amount arrives here as zero and fails the strict
    /// amount check upstream.
    Success { amount: Money, raw: Value },
    Failed { reason: String, raw: Value },
}

/// Result of a fulfillment dispatch. `success` is only true for an HTTP-OK response carrying an
/// explicit success flag in the body; absence of an error is not sufficient.
#[derive(Debug, Clone)]
pub struct FulfillmentOutcome {
    pub success: bool,
    pub raw: Value,
}

/// HTTP client contract for the payment gateway.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Opens a payment session for the order at the trusted, server-resolved price.
    async fn create_order(
        &self,
        order_id: &OrderId,
        amount: Money,
        contact: &ContactInfo,
    ) -> Result<GatewaySession, GatewayError>;

    /// Queries the transaction status for the order.
    async fn check_status(&self, order_id: &OrderId) -> Result<GatewayStatus, GatewayError>;
}

/// HTTP client contract for the fulfillment (topup) provider.
#[allow(async_fn_in_trait)]
pub trait FulfillmentProvider {
    async fn dispatch(&self, item: &ItemRef, target: &FulfillmentTarget) -> Result<FulfillmentOutcome, FulfillmentError>;
}

/// Read-only access to the remote game catalog's authoritative selling prices.
#[allow(async_fn_in_trait)]
pub trait GameCatalog {
    /// The provider's selling price for the SKU, or `None` when the game or item is unknown.
    /// Display/strike-through prices are never surfaced here.
    async fn selling_price(&self, game: &str, item: &str) -> Result<Option<Money>, CatalogError>;
}
