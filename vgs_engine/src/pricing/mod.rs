//! The price resolution engine.
//!
//! Computes the one trusted price for an (item, buyer-tier) pair. Client input never contributes
//! anything beyond the SKU identifiers, and those are validated against a catalog before any
//! price arithmetic happens.
mod catalogs;
mod resolver;

pub use catalogs::{SkuCatalog, StaticCatalog};
pub use resolver::{PriceResolver, PricingError};
