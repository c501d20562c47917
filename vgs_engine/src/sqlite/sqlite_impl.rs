use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{create_schema, new_pool, orders, pricing};
use crate::{
    db_types::{BuyerTier, NewOrder, Order, OrderId, PricingConfig},
    traits::{Expected, OrderStore, OrderUpdate, PricingStore, StoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database at `url` and creates the storefront schema if necessary.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = new_pool(url, max_connections).await?;
        create_schema(&pool).await?;
        debug!("🗃️ Connected to database at {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl OrderStore for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn set_gateway_order(&self, order_id: &OrderId, gateway_order_id: &str) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_gateway_order(order_id, gateway_order_id, &mut conn).await
    }

    async fn checked_transition(
        &self,
        order_id: &OrderId,
        expected: Expected,
        update: OrderUpdate,
    ) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::checked_transition(order_id, expected, update, &mut conn).await
    }
}

impl PricingStore for SqliteDatabase {
    async fn fetch_pricing_config(&self, tier: &BuyerTier) -> Result<Option<PricingConfig>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        pricing::fetch_pricing_config(tier, &mut conn).await
    }

    async fn upsert_pricing_config(&self, config: PricingConfig) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        pricing::upsert_pricing_config(config, &mut conn).await
    }
}
