//! HTTP clients for the storefront's upstream providers: the payment gateway, the fulfillment
//! (topup) provider, and the remote game catalog. Each client implements the corresponding
//! `vgs_engine` trait, keeping raw provider JSON at this edge of the system.
mod catalog;
mod config;
mod error;
mod fulfillment;
mod gateway;

pub use catalog::{CatalogApi, CatalogItem};
pub use config::{CatalogConfig, FulfillmentConfig, GatewayConfig};
pub use error::ProviderApiError;
pub use fulfillment::FulfillmentApi;
pub use gateway::GatewayApi;
