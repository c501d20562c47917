use log::*;
use thiserror::Error;
use vgs_common::Money;

use crate::{
    db_types::{BuyerTier, ItemRef, PricingConfig},
    pricing::catalogs::{SkuCatalog, StaticCatalog},
    traits::{CatalogError, GameCatalog},
};

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("No such item: {game}/{item}")]
    InvalidItem { game: String, item: String },
    #[error("Could not reach the game catalog. {0}")]
    Catalog(#[from] CatalogError),
}

/// Resolves the trusted price for an item, for a given buyer tier.
///
/// Base prices come from one of three sources, checked in order with no fallthrough once a
/// source claims the item family: the membership table, the subscription table, then the remote
/// game catalog. Tier overrides are applied on top of the base price, except for the owner tier,
/// which always pays the base price.
pub struct PriceResolver<C> {
    memberships: StaticCatalog,
    ott: StaticCatalog,
    games: C,
}

impl<C> PriceResolver<C>
where C: GameCatalog
{
    pub fn new(memberships: StaticCatalog, ott: StaticCatalog, games: C) -> Self {
        Self { memberships, ott, games }
    }

    pub async fn resolve(
        &self,
        item: &ItemRef,
        tier: &BuyerTier,
        config: Option<&PricingConfig>,
    ) -> Result<Money, PricingError> {
        let base = self.base_price(item).await?;
        let price = if tier.is_owner() { base } else { apply_overrides(item, base, config) };
        debug!("🏷️ Resolved {item} for tier '{tier}': base {base}, final {price}");
        Ok(price)
    }

    async fn base_price(&self, item: &ItemRef) -> Result<Money, PricingError> {
        let invalid = || PricingError::InvalidItem { game: item.game.clone(), item: item.item.clone() };
        if self.memberships.contains_plan(&item.game) {
            return self.memberships.price(&item.game, &item.item).ok_or_else(invalid);
        }
        if self.ott.contains_plan(&item.game) {
            return self.ott.price(&item.game, &item.item).ok_or_else(invalid);
        }
        self.games.selling_price(&item.game, &item.item).await?.ok_or_else(invalid)
    }
}

/// Applies the tier's fixed-price or slab overrides to a base price. A fixed override for the
/// exact (game, item) pair replaces the base outright; otherwise a matching slab marks the price
/// up by its percentage. Fractional results round up to the next whole unit.
fn apply_overrides(item: &ItemRef, base: Money, config: Option<&PricingConfig>) -> Money {
    let Some(config) = config else {
        return base;
    };
    if let Some(fixed) = config.fixed_price_for(item) {
        trace!("🏷️ Fixed override for {item}: {fixed}");
        return fixed;
    }
    match config.slab_for(base) {
        Some(slab) => {
            let marked_up = (base.value() as f64 * (1.0 + slab.percent / 100.0)).ceil();
            Money::from(marked_up as i64)
        },
        None => base,
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::db_types::{PriceOverride, Slab};

    struct FixedGames(HashMap<(String, String), Money>);

    impl GameCatalog for FixedGames {
        async fn selling_price(&self, game: &str, item: &str) -> Result<Option<Money>, CatalogError> {
            Ok(self.0.get(&(game.to_string(), item.to_string())).copied())
        }
    }

    fn resolver() -> PriceResolver<FixedGames> {
        let memberships = StaticCatalog::from_json(
            "memberships",
            r#"{"gold_pass": {"monthly": 29900, "yearly": 299900}}"#,
        )
        .unwrap();
        let ott = StaticCatalog::from_json("ott", r#"{"streamflix": {"basic": 19900}}"#).unwrap();
        let mut games = HashMap::new();
        games.insert(("rift_arena".to_string(), "diamond_pack".to_string()), Money::from(500));
        games.insert(("rift_arena".to_string(), "starter_pack".to_string()), Money::from(101));
        PriceResolver::new(memberships, ott, FixedGames(games))
    }

    fn config(slabs: Vec<Slab>, overrides: Vec<PriceOverride>) -> PricingConfig {
        PricingConfig { user_type: "retail".to_string(), slabs, overrides }
    }

    #[tokio::test]
    async fn fixed_override_beats_matching_slab() {
        let r = resolver();
        let cfg = config(
            vec![Slab { min: 0, max: 1000, percent: 10.0 }],
            vec![PriceOverride {
                game: "rift_arena".to_string(),
                item: "diamond_pack".to_string(),
                fixed_price: Money::from(450),
            }],
        );
        let item = ItemRef::new("rift_arena", "diamond_pack");
        let price = r.resolve(&item, &BuyerTier::from("retail"), Some(&cfg)).await.unwrap();
        assert_eq!(price, Money::from(450));
    }

    #[tokio::test]
    async fn slab_markup_rounds_up() {
        let r = resolver();
        let cfg = config(vec![Slab { min: 100, max: 200, percent: 5.0 }], vec![]);
        let item = ItemRef::new("rift_arena", "starter_pack");
        let price = r.resolve(&item, &BuyerTier::from("retail"), Some(&cfg)).await.unwrap();
        // ceil(101 * 1.05) = ceil(106.05) = 107
        assert_eq!(price, Money::from(107));
    }

    #[tokio::test]
    async fn owner_tier_always_pays_base_price() {
        let r = resolver();
        let cfg = config(
            vec![Slab { min: 0, max: 1000, percent: 50.0 }],
            vec![PriceOverride {
                game: "rift_arena".to_string(),
                item: "diamond_pack".to_string(),
                fixed_price: Money::from(1),
            }],
        );
        let item = ItemRef::new("rift_arena", "diamond_pack");
        let price = r.resolve(&item, &BuyerTier::from(BuyerTier::OWNER), Some(&cfg)).await.unwrap();
        assert_eq!(price, Money::from(500));
    }

    #[tokio::test]
    async fn unknown_sku_in_known_plan_is_invalid_not_a_fallthrough() {
        let r = resolver();
        let item = ItemRef::new("gold_pass", "weekly");
        let err = r.resolve(&item, &BuyerTier::from("retail"), None).await.unwrap_err();
        assert!(matches!(err, PricingError::InvalidItem { .. }));
    }

    #[tokio::test]
    async fn subscription_table_is_consulted_after_memberships() {
        let r = resolver();
        let item = ItemRef::new("streamflix", "basic");
        let price = r.resolve(&item, &BuyerTier::from("retail"), None).await.unwrap();
        assert_eq!(price, Money::from(19900));
    }

    #[tokio::test]
    async fn unlisted_game_item_is_invalid() {
        let r = resolver();
        let item = ItemRef::new("rift_arena", "no_such_pack");
        let err = r.resolve(&item, &BuyerTier::from("retail"), None).await.unwrap_err();
        assert!(matches!(err, PricingError::InvalidItem { .. }));
    }

    #[tokio::test]
    async fn price_outside_every_slab_is_unchanged() {
        let r = resolver();
        let cfg = config(vec![Slab { min: 1000, max: 2000, percent: 25.0 }], vec![]);
        let item = ItemRef::new("rift_arena", "diamond_pack");
        let price = r.resolve(&item, &BuyerTier::from("retail"), Some(&cfg)).await.unwrap();
        assert_eq!(price, Money::from(500));
    }
}
