use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::Serialize;
use serde_json::{json, Value};
use vgs_engine::{
    db_types::{FulfillmentTarget, ItemRef},
    traits::{FulfillmentError, FulfillmentOutcome, FulfillmentProvider},
};

use crate::{config::FulfillmentConfig, error::ProviderApiError};

#[derive(Clone)]
pub struct FulfillmentApi {
    config: FulfillmentConfig,
    client: Arc<Client>,
}

#[derive(Debug, Serialize)]
struct TopupRequest<'a> {
    game: &'a str,
    item: &'a str,
    player_id: &'a str,
    zone_id: &'a str,
}

impl FulfillmentApi {
    pub fn new(config: FulfillmentConfig) -> Result<Self, ProviderApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let key = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        headers.insert("X-Api-Key", key);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self) -> String {
        format!("{}/topups", self.config.base_url)
    }
}

impl FulfillmentProvider for FulfillmentApi {
    /// Dispatches the topup. A dispatch only counts as successful when the provider returns
    /// HTTP-OK *and* an explicit success flag in the body; a non-2xx response is a failed
    /// outcome, not an error, so the raw body still lands in the audit trail.
    async fn dispatch(&self, item: &ItemRef, target: &FulfillmentTarget) -> Result<FulfillmentOutcome, FulfillmentError> {
        let body = TopupRequest {
            game: &item.game,
            item: &item.item,
            player_id: &target.player_id,
            zone_id: &target.zone_id,
        };
        trace!("🎁️ Dispatching topup of {item} to {}", target.player_id);
        let response = self
            .client
            .post(self.url())
            .json(&body)
            .send()
            .await
            .map_err(|e| FulfillmentError::Transport(e.to_string()))?;
        let http_ok = response.status().is_success();
        let status = response.status().as_u16();
        let raw: Value = match response.json().await {
            Ok(raw) => raw,
            Err(e) if http_ok => return Err(FulfillmentError::BadResponse(e.to_string())),
            Err(e) => json!({ "error": e.to_string(), "http_status": status }),
        };
        let success = http_ok && raw["status"].as_str() == Some("success");
        if !success {
            debug!("🎁️ Provider reported topup failure (HTTP {status}): {raw}");
        }
        Ok(FulfillmentOutcome { success, raw })
    }
}
