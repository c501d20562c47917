use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{BuyerTier, PricingConfig},
    traits::StoreError,
};

/// Fetches the pricing policy for a tier. Policies are stored as a JSON document per tier; a
/// missing row simply means the tier pays catalog base prices.
pub async fn fetch_pricing_config(
    tier: &BuyerTier,
    conn: &mut SqliteConnection,
) -> Result<Option<PricingConfig>, StoreError> {
    let config: Option<String> = sqlx::query_scalar("SELECT config FROM pricing_configs WHERE user_type = $1")
        .bind(tier.as_str())
        .fetch_optional(conn)
        .await?;
    config.map(|raw| serde_json::from_str(&raw).map_err(StoreError::from)).transpose()
}

pub async fn upsert_pricing_config(config: PricingConfig, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let raw = serde_json::to_string(&config)?;
    sqlx::query(
        r#"
        INSERT INTO pricing_configs (user_type, config, updated_at) VALUES ($1, $2, CURRENT_TIMESTAMP)
        ON CONFLICT (user_type) DO UPDATE SET config = excluded.config, updated_at = CURRENT_TIMESTAMP
    "#,
    )
    .bind(&config.user_type)
    .bind(raw)
    .execute(conn)
    .await?;
    debug!("🗃️ Pricing config for tier '{}' stored", config.user_type);
    Ok(())
}
