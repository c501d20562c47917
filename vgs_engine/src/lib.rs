//! Virtual Goods Storefront engine
//!
//! This library contains the core logic of the storefront: trusted price resolution, the order
//! lifecycle, and the payment reconciliation state machine. It is provider-agnostic: the payment
//! gateway, the fulfillment provider and the remote game catalog are abstracted behind the traits
//! in [`mod@traits`], and the order store behind [`traits::OrderStore`].
//!
//! The library is divided into three main sections:
//! 1. Data types ([`mod@db_types`]) shared between the store, the flow API and the server.
//! 2. The engine public API ([`mod@order_flow`] and [`mod@pricing`]). All order mutations go
//!    through [`OrderFlowApi`]; state-changing writes are conditional compare-and-set transitions
//!    so that concurrent reconciliation calls can never dispatch fulfillment twice.
//! 3. The SQLite backend ([`mod@sqlite`]), the reference [`traits::OrderStore`] implementation.
pub mod db_types;
pub mod order_flow;
pub mod pricing;
pub mod sqlite;
pub mod traits;

pub use order_flow::{CheckoutSession, OrderFlowApi, OrderFlowError, OrderRequest, ReconcileOutcome};
pub use pricing::{PriceResolver, PricingError, SkuCatalog, StaticCatalog};
pub use sqlite::SqliteDatabase;
