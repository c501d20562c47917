//! # SQLite Database methods
//!
//! "Low-level" SQLite interactions live here, as simple free functions that accept a
//! `&mut SqliteConnection`. Callers can obtain a connection from a pool, or open a transaction
//! and pass `&mut *tx` without any other changes.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod orders;
pub mod pricing;

const SQLITE_DB_URL: &str = "sqlite://data/vgs_store.db";

pub fn db_url() -> String {
    let result = env::var("VGS_DATABASE_URL").unwrap_or_else(|_| {
        info!("VGS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// Creates the storefront tables if they do not exist yet. Run once at startup.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), SqlxError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id TEXT NOT NULL UNIQUE,
            buyer_id TEXT,
            game TEXT NOT NULL,
            item TEXT NOT NULL,
            player_id TEXT NOT NULL,
            zone_id TEXT NOT NULL,
            price INTEGER NOT NULL,
            payment_method TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Pending',
            payment_status TEXT NOT NULL DEFAULT 'Pending',
            topup_status TEXT NOT NULL DEFAULT 'Pending',
            gateway_order_id TEXT,
            gateway_response TEXT,
            fulfillment_response TEXT,
            contact_email TEXT,
            contact_phone TEXT,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            expires_at DATETIME NOT NULL
        );
    "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pricing_configs (
            user_type TEXT PRIMARY KEY NOT NULL,
            config TEXT NOT NULL,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
