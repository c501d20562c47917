//! Behaviour contracts for the engine's collaborators.
//!
//! [`OrderStore`] and [`PricingStore`] are implemented by persistence backends (see
//! [`crate::sqlite`]); [`PaymentGateway`], [`FulfillmentProvider`] and [`GameCatalog`] by HTTP
//! clients to the external providers. The order flow API is generic over all of them, which is
//! also what makes the reconciliation state machine testable with mocks.
mod order_store;
mod providers;

pub use order_store::{Expected, OrderStore, OrderUpdate, PricingStore, StorefrontStore, StoreError};
pub use providers::{
    CatalogError,
    FulfillmentError,
    FulfillmentOutcome,
    FulfillmentProvider,
    GameCatalog,
    GatewayError,
    GatewaySession,
    GatewayStatus,
    PaymentGateway,
};
