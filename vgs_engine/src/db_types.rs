use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
pub use vgs_common::Money;

/// The fixed window, in seconds, a buyer has to complete payment after an order is created.
/// Deliberately not configurable per item.
pub const ORDER_EXPIRY_SECONDS: i64 = 90;

pub fn order_expiry() -> Duration {
    Duration::seconds(ORDER_EXPIRY_SECONDS)
}

//--------------------------------------        OrderId        -------------------------------------------------------
/// A globally unique, high-entropy order identifier. Guest orders are reconciled by this id alone,
/// so the random suffix is load-bearing: ids must not be guessable.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh order id: a UTC timestamp prefix plus 8 random alphanumerics.
    pub fn generate() -> Self {
        let prefix = Utc::now().format("%Y%m%d%H%M%S");
        let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect();
        Self(format!("VG-{prefix}-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------       BuyerTier       -------------------------------------------------------
/// The caller's account classification, carried in the verified bearer credential. It selects
/// which [`PricingConfig`] applies. Tiers are free-form strings except for the reserved
/// [`BuyerTier::OWNER`] tier, which always pays the catalog base price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuyerTier(pub String);

impl BuyerTier {
    pub const OWNER: &'static str = "owner";

    pub fn is_owner(&self) -> bool {
        self.0 == Self::OWNER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BuyerTier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BuyerTier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for BuyerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    CallerIdentity     -------------------------------------------------------
/// What a verified bearer credential reduces to. `buyer_id` is `None` for guest checkouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub buyer_id: Option<String>,
    pub tier: BuyerTier,
}

impl CallerIdentity {
    pub fn buyer<S: Into<String>, T: Into<BuyerTier>>(buyer_id: S, tier: T) -> Self {
        Self { buyer_id: Some(buyer_id.into()), tier: tier.into() }
    }

    pub fn guest<T: Into<BuyerTier>>(tier: T) -> Self {
        Self { buyer_id: None, tier: tier.into() }
    }
}

//--------------------------------------        ItemRef        -------------------------------------------------------
/// Identifies a purchasable SKU. `game` doubles as the category slug: it either names a membership
/// plan, an OTT subscription plan, or a game in the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ItemRef {
    pub game: String,
    pub item: String,
}

impl ItemRef {
    pub fn new<G: Into<String>, I: Into<String>>(game: G, item: I) -> Self {
        Self { game: game.into(), item: item.into() }
    }
}

impl Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.game, self.item)
    }
}

//--------------------------------------  FulfillmentTarget    -------------------------------------------------------
/// Where the purchased good lands once fulfillment is dispatched. Immutable after order creation.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct FulfillmentTarget {
    pub player_id: String,
    pub zone_id: String,
}

impl FulfillmentTarget {
    pub fn new<P: Into<String>, Z: Into<String>>(player_id: P, zone_id: Z) -> Self {
        Self { player_id: player_id.into(), zone_id: zone_id.into() }
    }
}

//--------------------------------------      ContactInfo      -------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactInfo {
    pub fn has_any(&self) -> bool {
        self.email.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
            || self.phone.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
    }
}

//--------------------------------------    PaymentMethod      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Payment collected via the external payment gateway (the only operational method).
    Gateway,
    /// Wallet balance payments. Retained as a first-class variant, but currently disabled: order
    /// creation rejects it before anything is persisted.
    Wallet,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Gateway => write!(f, "gateway"),
            PaymentMethod::Wallet => write!(f, "wallet"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gateway" => Ok(Self::Gateway),
            "wallet" => Ok(Self::Wallet),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------     OrderStatus       -------------------------------------------------------
/// Overall order outcome. `Pending` is the only non-terminal state; once an order reaches
/// `Success`, `Failed` or `Fraud`, reconciliation is a no-op with respect to this axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Success,
    Failed,
    /// The gateway-reported paid amount did not match the trusted order price.
    Fraud,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Success => write!(f, "Success"),
            OrderStatus::Failed => write!(f, "Failed"),
            OrderStatus::Fraud => write!(f, "Fraud"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            "Fraud" => Ok(Self::Fraud),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus      -------------------------------------------------------
/// Gateway-confirmed payment state. Independent axis from [`OrderStatus`]: an order can end
/// `Failed` overall with payment `Success` (money captured, fulfillment failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Success => write!(f, "Success"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     TopupStatus       -------------------------------------------------------
/// Fulfillment dispatch state. Transitions to `Success` at most once per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TopupStatus {
    Pending,
    Success,
    Failed,
}

impl Display for TopupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopupStatus::Pending => write!(f, "Pending"),
            TopupStatus::Success => write!(f, "Success"),
            TopupStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for TopupStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid topup status: {s}"))),
        }
    }
}

//--------------------------------------        Order          -------------------------------------------------------
/// A purchase attempt. Orders are never deleted; together with the retained raw provider
/// responses they form the audit trail for every transition.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    /// `None` for guest orders, which are identified by contact info only.
    pub buyer_id: Option<String>,
    #[sqlx(flatten)]
    pub item: ItemRef,
    #[sqlx(flatten)]
    pub target: FulfillmentTarget,
    /// Computed server-side at creation. Never accepted from the client; the sole authority for
    /// the later gateway amount check.
    pub price: Money,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub topup_status: TopupStatus,
    pub gateway_order_id: Option<String>,
    /// Last raw gateway response, retained for audit.
    pub gateway_response: Option<String>,
    /// Last raw fulfillment provider response, retained for audit.
    pub fulfillment_response: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Order {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn age_exceeds_window(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > order_expiry()
    }
}

//--------------------------------------       NewOrder        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub buyer_id: Option<String>,
    pub item: ItemRef,
    pub target: FulfillmentTarget,
    /// The trusted price from the price resolver.
    pub price: Money,
    pub payment_method: PaymentMethod,
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewOrder {
    /// Builds a new pending order with a freshly generated id and the fixed 90s payment window.
    pub fn new(item: ItemRef, target: FulfillmentTarget, price: Money, payment_method: PaymentMethod) -> Self {
        let created_at = Utc::now();
        Self {
            order_id: OrderId::generate(),
            buyer_id: None,
            item,
            target,
            price,
            payment_method,
            contact: ContactInfo::default(),
            created_at,
            expires_at: created_at + order_expiry(),
        }
    }

    pub fn for_buyer(mut self, buyer_id: Option<String>) -> Self {
        self.buyer_id = buyer_id;
        self
    }

    pub fn with_contact(mut self, contact: ContactInfo) -> Self {
        self.contact = contact;
        self
    }
}

//--------------------------------------     PricingConfig     -------------------------------------------------------
/// Per buyer-tier pricing policy, keyed by `user_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub user_type: String,
    #[serde(default)]
    pub slabs: Vec<Slab>,
    #[serde(default)]
    pub overrides: Vec<PriceOverride>,
}

impl PricingConfig {
    pub fn new<S: Into<String>>(user_type: S) -> Self {
        Self { user_type: user_type.into(), slabs: Vec::new(), overrides: Vec::new() }
    }

    /// The fixed-price override for the exact (game, item) pair, if any. Takes precedence over
    /// slabs.
    pub fn fixed_price_for(&self, item: &ItemRef) -> Option<Money> {
        self.overrides.iter().find(|o| o.game == item.game && o.item == item.item).map(|o| o.fixed_price)
    }

    /// The slab whose `[min, max)` range contains the base price. At most one slab may match.
    pub fn slab_for(&self, base: Money) -> Option<&Slab> {
        self.slabs.iter().find(|s| s.contains(base))
    }
}

/// A price-range-to-markup rule. The range is half-open: `[min, max)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Slab {
    pub min: i64,
    pub max: i64,
    /// Markup percentage, applied multiplicatively.
    pub percent: f64,
}

impl Slab {
    pub fn contains(&self, base: Money) -> bool {
        (self.min..self.max).contains(&base.value())
    }
}

/// A fixed price pinned to a specific SKU for a tier, bypassing slabs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceOverride {
    pub game: String,
    pub item: String,
    pub fixed_price: Money,
}
