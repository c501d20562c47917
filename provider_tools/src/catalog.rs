use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use vgs_common::Money;
use vgs_engine::traits::{CatalogError, GameCatalog};

use crate::{config::CatalogConfig, error::ProviderApiError};

#[derive(Clone)]
pub struct CatalogApi {
    config: CatalogConfig,
    client: Arc<Client>,
}

/// One SKU as the catalog service reports it. The display price is what storefront UIs show as a
/// strike-through; only the selling price is trusted for checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItem {
    pub slug: String,
    pub selling_price: Money,
    #[serde(default)]
    pub display_price: Option<Money>,
}

#[derive(Debug, Deserialize)]
struct ItemListResponse {
    items: Vec<CatalogItem>,
}

impl CatalogApi {
    pub fn new(config: CatalogConfig) -> Result<Self, ProviderApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, game: &str) -> String {
        format!("{}/games/{game}/items", self.config.base_url)
    }

    /// Fetches the full item list for a game. `None` when the catalog does not know the game.
    pub async fn items_for_game(&self, game: &str) -> Result<Option<Vec<CatalogItem>>, CatalogError> {
        let url = self.url(game);
        trace!("🏷️ Fetching catalog: {url}");
        let response = self.client.get(url).send().await.map_err(|e| CatalogError::Transport(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CatalogError::Transport(format!("Catalog returned HTTP {}", response.status().as_u16())));
        }
        let list: ItemListResponse = response.json().await.map_err(|e| CatalogError::BadResponse(e.to_string()))?;
        Ok(Some(list.items))
    }
}

impl GameCatalog for CatalogApi {
    async fn selling_price(&self, game: &str, item: &str) -> Result<Option<Money>, CatalogError> {
        let items = match self.items_for_game(game).await? {
            Some(items) => items,
            None => {
                debug!("🏷️ Game '{game}' is not in the catalog");
                return Ok(None);
            },
        };
        Ok(items.into_iter().find(|i| i.slug == item).map(|i| i.selling_price))
    }
}
