use log::*;
use vgs_common::Secret;

/// Default bound on any single provider call. A slow provider must never hold a storefront
/// request open indefinitely.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn env_or_default(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| {
        warn!("🪛️ {var} not set, using (probably useless) default");
        default.to_string()
    })
}

fn timeout_from_env() -> u64 {
    std::env::var("VGS_PROVIDER_TIMEOUT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub app_id: String,
    pub api_secret: Secret<String>,
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = env_or_default("VGS_GATEWAY_URL", "https://sandbox.gateway.example.com");
        let app_id = env_or_default("VGS_GATEWAY_APP_ID", "app_00000000");
        let api_secret = Secret::new(env_or_default("VGS_GATEWAY_SECRET", "sk_00000000000000"));
        Self { base_url, app_id, api_secret, timeout_secs: timeout_from_env() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FulfillmentConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub timeout_secs: u64,
}

impl FulfillmentConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = env_or_default("VGS_FULFILLMENT_URL", "https://sandbox.topups.example.com");
        let api_key = Secret::new(env_or_default("VGS_FULFILLMENT_KEY", "fk_00000000000000"));
        Self { base_url, api_key, timeout_secs: timeout_from_env() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl CatalogConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = env_or_default("VGS_CATALOG_URL", "https://catalog.example.com");
        Self { base_url, timeout_secs: timeout_from_env() }
    }
}
