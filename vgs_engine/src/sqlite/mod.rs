//! `SqliteDatabase` is the concrete storage backend for the storefront.
//!
//! It implements the [`crate::traits::OrderStore`] and [`crate::traits::PricingStore`] contracts
//! on top of SQLite. The conditional-transition contract maps directly onto a single conditional
//! `UPDATE ... RETURNING` statement, so the compare-and-set is done by the database itself.
pub mod db;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;
