//! The order lifecycle and payment reconciliation engine.
//!
//! [`OrderFlowApi`] owns the two operations the storefront exposes: creating an order at a
//! server-resolved price, and reconciling an order against the payment gateway. Reconciliation is
//! a strictly ordered sequence of short-circuiting checks, and every state change goes through
//! the store's conditional transition so that concurrent calls for the same order can never both
//! claim the same step.

use std::fmt::Debug;

use chrono::Utc;
use log::*;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    db_types::{
        CallerIdentity,
        ContactInfo,
        FulfillmentTarget,
        ItemRef,
        NewOrder,
        Order,
        OrderId,
        OrderStatus,
        PaymentMethod,
        PaymentStatus,
        TopupStatus,
    },
    pricing::{PriceResolver, PricingError},
    traits::{
        Expected,
        FulfillmentOutcome,
        FulfillmentProvider,
        GameCatalog,
        GatewayError,
        GatewayStatus,
        OrderUpdate,
        PaymentGateway,
        StoreError,
        StorefrontStore,
    },
};

#[derive(Debug, Error)]
pub enum OrderFlowError {
    #[error("Could not price the order. {0}")]
    Pricing(#[from] PricingError),
    #[error("Wallet payments are currently disabled")]
    WalletDisabled,
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("This order belongs to another buyer")]
    Forbidden,
    #[error("Payment gateway error. {0}")]
    Gateway(#[from] GatewayError),
    #[error("Storage error. {0}")]
    Store(#[from] StoreError),
}

/// A validated order-creation request. Note the absence of a price field; prices are resolved
/// server-side, always.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub item: ItemRef,
    pub target: FulfillmentTarget,
    pub payment_method: PaymentMethod,
    pub contact: ContactInfo,
}

/// What a successful order creation hands back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub order_id: OrderId,
    pub payment_url: String,
}

/// The caller-facing result of one reconciliation pass. Reconciliation reports business outcomes
/// in `message` rather than erroring, because clients poll this to drive their own UI.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub success: bool,
    pub message: String,
    pub topup_response: Option<Value>,
}

impl ReconcileOutcome {
    pub fn ok<S: Into<String>>(message: S, topup_response: Option<Value>) -> Self {
        Self { success: true, message: message.into(), topup_response }
    }

    pub fn fail<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: message.into(), topup_response: None }
    }
}

pub struct OrderFlowApi<B, G, F, C> {
    db: B,
    gateway: G,
    fulfillment: F,
    resolver: PriceResolver<C>,
}

impl<B, G, F, C> Debug for OrderFlowApi<B, G, F, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G, F, C> OrderFlowApi<B, G, F, C>
where
    B: StorefrontStore,
    G: PaymentGateway,
    F: FulfillmentProvider,
    C: GameCatalog,
{
    pub fn new(db: B, gateway: G, fulfillment: F, resolver: PriceResolver<C>) -> Self {
        Self { db, gateway, fulfillment, resolver }
    }

    /// Creates a new pending order at the trusted price and opens a payment session for it.
    ///
    /// Exactly one order row and at most one gateway session result from one call. There are no
    /// retries here; a client retry creates a fresh order with a fresh id.
    pub async fn create_order(
        &self,
        request: OrderRequest,
        caller: &CallerIdentity,
    ) -> Result<CheckoutSession, OrderFlowError> {
        if request.payment_method == PaymentMethod::Wallet {
            info!("🔄️📦️ Rejecting wallet order for {} from tier '{}'", request.item, caller.tier);
            return Err(OrderFlowError::WalletDisabled);
        }
        let config = self.db.fetch_pricing_config(&caller.tier).await?;
        let price = self.resolver.resolve(&request.item, &caller.tier, config.as_ref()).await?;
        let new_order = NewOrder::new(request.item, request.target, price, request.payment_method)
            .for_buyer(caller.buyer_id.clone())
            .with_contact(request.contact);
        let order = self.db.insert_order(new_order).await?;
        info!("🔄️📦️ Order {} created for {} at {}", order.order_id, order.item, order.price);
        let contact = ContactInfo { email: order.contact_email.clone(), phone: order.contact_phone.clone() };
        let session = self.gateway.create_order(&order.order_id, order.price, &contact).await?;
        let order = self.db.set_gateway_order(&order.order_id, &session.gateway_order_id).await?;
        debug!("🔄️📦️ Gateway session {} opened for order {}", session.gateway_order_id, order.order_id);
        Ok(CheckoutSession { order_id: order.order_id, payment_url: session.payment_url })
    }

    /// Runs one reconciliation pass for the order.
    ///
    /// Safe to call any number of times, from any number of concurrent callers. Each pass walks
    /// the same ordered checks and the first one that applies decides the response. The pass that
    /// wins the payment-confirmation transition is the only one that dispatches fulfillment.
    pub async fn reconcile(
        &self,
        order_id: &OrderId,
        caller: &CallerIdentity,
    ) -> Result<ReconcileOutcome, OrderFlowError> {
        let Some(order) = self.db.fetch_order_by_order_id(order_id).await? else {
            return Err(OrderFlowError::OrderNotFound(order_id.clone()));
        };
        if let Some(owner) = &order.buyer_id {
            if caller.buyer_id.as_deref() != Some(owner.as_str()) {
                warn!("🔄️💰️ Caller {:?} tried to reconcile order {} owned by another buyer", caller.buyer_id, order_id);
                return Err(OrderFlowError::Forbidden);
            }
        }
        if order.status.is_terminal() {
            return Ok(report_state(&order));
        }
        let now = Utc::now();
        if order.age_exceeds_window(now) {
            debug!("🔄️💰️ Order {order_id} exceeded its payment window. Marking it failed.");
            let mut update = OrderUpdate::status(OrderStatus::Failed);
            if order.topup_status == TopupStatus::Pending {
                update = update.and_topup(TopupStatus::Failed);
            }
            return match self.db.checked_transition(order_id, Expected::status(OrderStatus::Pending), update).await? {
                Some(_) => Ok(ReconcileOutcome::fail(
                    "Payment verification timed out. If you were charged, please contact support.",
                )),
                None => self.report_latest(order_id).await,
            };
        }
        if order.is_expired(now) {
            let update = OrderUpdate::status(OrderStatus::Failed).and_payment(PaymentStatus::Failed);
            return match self.db.checked_transition(order_id, Expected::status(OrderStatus::Pending), update).await? {
                Some(_) => Ok(ReconcileOutcome::fail("Order has expired")),
                None => self.report_latest(order_id).await,
            };
        }
        if order.payment_method == PaymentMethod::Wallet && order.payment_status != PaymentStatus::Success {
            return Ok(ReconcileOutcome::fail("Wallet payments are currently disabled"));
        }
        let order = if order.payment_status == PaymentStatus::Success {
            order
        } else {
            match self.confirm_payment(&order).await? {
                Confirmed::Order(order) => order,
                Confirmed::Settled(outcome) => return Ok(outcome),
            }
        };
        if order.topup_status == TopupStatus::Success {
            return Ok(report_state(&order));
        }
        self.dispatch_fulfillment(&order).await
    }

    /// Confirms payment at the gateway and claims the pending-to-paid transition. Only the caller
    /// that wins the claim proceeds to fulfillment.
    async fn confirm_payment(&self, order: &Order) -> Result<Confirmed, OrderFlowError> {
        let order_id = &order.order_id;
        let status = match self.gateway.check_status(order_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!("🔄️💰️ Could not fetch gateway status for order {order_id}: {e}");
                return Ok(Confirmed::Settled(ReconcileOutcome::fail(
                    "Could not verify payment with the gateway. Please try again.",
                )));
            },
        };
        match status {
            GatewayStatus::Pending => {
                debug!("🔄️💰️ Payment for order {order_id} is still pending at the gateway");
                Ok(Confirmed::Settled(ReconcileOutcome::fail("Payment is pending. Please complete the payment.")))
            },
            GatewayStatus::Failed { reason, raw } => {
                info!("🔄️💰️ Gateway reports payment failure for order {order_id}: {reason}");
                let update = OrderUpdate::status(OrderStatus::Failed)
                    .and_payment(PaymentStatus::Failed)
                    .with_gateway_response(raw.to_string());
                match self.db.checked_transition(order_id, Expected::status(OrderStatus::Pending), update).await? {
                    Some(_) => Ok(Confirmed::Settled(ReconcileOutcome::fail(format!("Payment failed. {reason}")))),
                    None => self.report_latest(order_id).await.map(Confirmed::Settled),
                }
            },
            GatewayStatus::Success { amount, raw } if amount != order.price => {
                warn!(
                    "🚨 Amount mismatch on order {order_id}: gateway reports {amount}, order price is {}. Flagging \
                     as fraud.",
                    order.price
                );
                let update = OrderUpdate::status(OrderStatus::Fraud)
                    .and_payment(PaymentStatus::Failed)
                    .and_topup(TopupStatus::Failed)
                    .with_gateway_response(raw.to_string());
                let _ = self.db.checked_transition(order_id, Expected::status(OrderStatus::Pending), update).await?;
                Ok(Confirmed::Settled(ReconcileOutcome::fail("Payment amount mismatch detected")))
            },
            GatewayStatus::Success { raw, .. } => {
                let expected = Expected::status(OrderStatus::Pending).and_payment(PaymentStatus::Pending);
                let update =
                    OrderUpdate::default().and_payment(PaymentStatus::Success).with_gateway_response(raw.to_string());
                match self.db.checked_transition(order_id, expected, update).await? {
                    Some(order) => {
                        info!("🔄️💰️ Payment confirmed for order {order_id}");
                        Ok(Confirmed::Order(order))
                    },
                    // Another caller claimed the payment confirmation. It owns fulfillment; we
                    // just report what the order looks like now.
                    None => self.report_latest(order_id).await.map(Confirmed::Settled),
                }
            },
        }
    }

    /// Dispatches fulfillment for a paid order and records the outcome. Reached only by the
    /// caller that claimed the payment transition, or by a retry after a failed dispatch.
    async fn dispatch_fulfillment(&self, order: &Order) -> Result<ReconcileOutcome, OrderFlowError> {
        let order_id = &order.order_id;
        info!("🔄️🎁️ Dispatching fulfillment of {} to {} for order {order_id}", order.item, order.target.player_id);
        let outcome = match self.fulfillment.dispatch(&order.item, &order.target).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("🔄️🎁️ Fulfillment dispatch failed for order {order_id}: {e}");
                FulfillmentOutcome { success: false, raw: json!({ "error": e.to_string() }) }
            },
        };
        let expected = Expected::status(OrderStatus::Pending).and_topup(TopupStatus::Pending);
        if outcome.success {
            let update = OrderUpdate::status(OrderStatus::Success)
                .and_topup(TopupStatus::Success)
                .with_fulfillment_response(outcome.raw.to_string());
            match self.db.checked_transition(order_id, expected, update).await? {
                Some(_) => {
                    info!("🔄️🎁️ Order {order_id} fulfilled");
                    Ok(ReconcileOutcome::ok("Order completed. Your purchase has been delivered.", Some(outcome.raw)))
                },
                None => self.report_latest(order_id).await,
            }
        } else {
            warn!("🔄️🎁️ Fulfillment provider reported failure for order {order_id}");
            let update = OrderUpdate::status(OrderStatus::Failed)
                .and_topup(TopupStatus::Failed)
                .with_fulfillment_response(outcome.raw.to_string());
            let _ = self.db.checked_transition(order_id, expected, update).await?;
            Ok(ReconcileOutcome::fail(
                "Payment was received but fulfillment failed. Please contact support for a refund.",
            ))
        }
    }

    /// Re-reads the order and reports its current state. Used after losing a conditional
    /// transition to a concurrent reconciliation call.
    async fn report_latest(&self, order_id: &OrderId) -> Result<ReconcileOutcome, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        Ok(report_state(&order))
    }
}

enum Confirmed {
    /// This caller claimed the payment confirmation and owns the dispatch.
    Order(Order),
    /// The pass is over; return this outcome to the caller.
    Settled(ReconcileOutcome),
}

/// Maps an order's current state to a caller-facing outcome, without touching any provider.
fn report_state(order: &Order) -> ReconcileOutcome {
    match order.status {
        OrderStatus::Success => {
            let topup = order.fulfillment_response.as_deref().and_then(|raw| serde_json::from_str(raw).ok());
            ReconcileOutcome::ok("Order completed. Your purchase has been delivered.", topup)
        },
        OrderStatus::Failed => ReconcileOutcome::fail("This order has failed. Contact support if you were charged."),
        OrderStatus::Fraud => ReconcileOutcome::fail("Payment amount mismatch detected"),
        OrderStatus::Pending => ReconcileOutcome::fail("Payment confirmed. Fulfillment is in progress."),
    }
}
