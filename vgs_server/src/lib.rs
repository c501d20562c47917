//! # Virtual goods storefront server
//!
//! This crate hosts the HTTP layer of the storefront. It is responsible for:
//! * Verifying bearer credentials and reducing them to a caller identity.
//! * Validating request bodies and handing them to the order flow engine.
//! * Mapping engine errors onto HTTP status codes and JSON bodies.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: a health check route that returns a 200 OK response.
//! * `/api/orders`: creates an order and opens a payment session.
//! * `/api/orders/{order_id}/verify`: runs one reconciliation pass for an order.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
