use thiserror::Error;

use crate::db_types::{
    BuyerTier,
    NewOrder,
    Order,
    OrderId,
    OrderStatus,
    PaymentStatus,
    PricingConfig,
    TopupStatus,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Could not encode or decode a pricing config: {0}")]
    ConfigEncoding(#[from] serde_json::Error),
    #[error("A conditional transition was requested with no fields to update")]
    EmptyTransition,
}

/// The expected pre-state for a conditional transition. Every populated field becomes part of the
/// `WHERE` clause of the update, so the write only lands if the order is still in this state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expected {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub topup_status: Option<TopupStatus>,
}

impl Expected {
    pub fn status(status: OrderStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn and_payment(mut self, payment_status: PaymentStatus) -> Self {
        self.payment_status = Some(payment_status);
        self
    }

    pub fn and_topup(mut self, topup_status: TopupStatus) -> Self {
        self.topup_status = Some(topup_status);
        self
    }
}

/// The fields a transition may change. Raw provider responses ride along with the status change
/// that they justify, so audit data and state land in one atomic write.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub topup_status: Option<TopupStatus>,
    pub gateway_response: Option<String>,
    pub fulfillment_response: Option<String>,
}

impl OrderUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.payment_status.is_none()
            && self.topup_status.is_none()
            && self.gateway_response.is_none()
            && self.fulfillment_response.is_none()
    }

    pub fn status(status: OrderStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn and_payment(mut self, payment_status: PaymentStatus) -> Self {
        self.payment_status = Some(payment_status);
        self
    }

    pub fn and_topup(mut self, topup_status: TopupStatus) -> Self {
        self.topup_status = Some(topup_status);
        self
    }

    pub fn with_gateway_response<S: Into<String>>(mut self, raw: S) -> Self {
        self.gateway_response = Some(raw.into());
        self
    }

    pub fn with_fulfillment_response<S: Into<String>>(mut self, raw: S) -> Self {
        self.fulfillment_response = Some(raw.into());
        self
    }
}

/// Persistence contract for orders.
///
/// Orders are an append-only audit trail: there is deliberately no delete, and no unconditional
/// status write. The only way to change order state is [`OrderStore::checked_transition`], a
/// compare-and-set keyed on the expected prior state. Two concurrent reconciliation calls can
/// therefore never both claim the same transition; the loser observes `None` and must re-read.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Persists a brand-new pending order. The order id must be unique.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Records the gateway's identifier for the payment session opened for this order.
    async fn set_gateway_order(&self, order_id: &OrderId, gateway_order_id: &str) -> Result<Order, StoreError>;

    /// Atomically applies `update` iff the order is still in the `expected` pre-state.
    ///
    /// Returns the updated order, or `None` when the precondition no longer held (another caller
    /// won the transition). Implementations must express this as a single conditional update at
    /// the store layer, not a read-then-write pair.
    async fn checked_transition(
        &self,
        order_id: &OrderId,
        expected: Expected,
        update: OrderUpdate,
    ) -> Result<Option<Order>, StoreError>;
}

/// Persistence contract for per-tier pricing policies.
#[allow(async_fn_in_trait)]
pub trait PricingStore {
    async fn fetch_pricing_config(&self, tier: &BuyerTier) -> Result<Option<PricingConfig>, StoreError>;

    /// Creates or replaces the pricing policy for a tier. Used for seeding and administration;
    /// the storefront itself only reads.
    async fn upsert_pricing_config(&self, config: PricingConfig) -> Result<(), StoreError>;
}

/// Convenience alias for backends that provide both stores, which is what the order flow API
/// needs. Blanket-implemented.
pub trait StorefrontStore: OrderStore + PricingStore {}

impl<T: OrderStore + PricingStore> StorefrontStore for T {}
