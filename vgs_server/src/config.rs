use std::{collections::HashMap, env};

use log::*;
use provider_tools::{CatalogConfig, FulfillmentConfig, GatewayConfig};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::Deserialize;
use vgs_common::{Money, Secret};
use vgs_engine::{pricing::StaticCatalog, sqlite::db::db_url};

const DEFAULT_VGS_HOST: &str = "127.0.0.1";
const DEFAULT_VGS_PORT: u16 = 8380;

/// The built-in membership and subscription price tables, used when no catalog file is
/// configured. Prices are in the smallest currency unit.
const DEFAULT_CATALOGS: &str = r#"{
  "memberships": {
    "gold_pass": { "monthly": 29900, "quarterly": 79900, "yearly": 299900 },
    "silver_pass": { "monthly": 14900, "yearly": 149900 }
  },
  "ott": {
    "streamflix": { "basic": 19900, "premium": 39900 },
    "toonbox": { "monthly": 9900 }
  }
}"#;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
    pub fulfillment: FulfillmentConfig,
    pub catalog: CatalogConfig,
    /// Local price table for membership plans.
    pub memberships: StaticCatalog,
    /// Local price table for OTT subscription plans.
    pub ott: StaticCatalog,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let (memberships, ott) = builtin_catalogs();
        Self {
            host: DEFAULT_VGS_HOST.to_string(),
            port: DEFAULT_VGS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            gateway: GatewayConfig::default(),
            fulfillment: FulfillmentConfig::default(),
            catalog: CatalogConfig::default(),
            memberships,
            ott,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("VGS_HOST").ok().unwrap_or_else(|| DEFAULT_VGS_HOST.into());
        let port = env::var("VGS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for VGS_PORT. {e} Using the default instead.");
                    DEFAULT_VGS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_VGS_PORT);
        let (memberships, ott) = load_static_catalogs();
        Self {
            host,
            port,
            database_url: db_url(),
            auth: AuthConfig::from_env_or_default(),
            gateway: GatewayConfig::new_from_env_or_default(),
            fulfillment: FulfillmentConfig::new_from_env_or_default(),
            catalog: CatalogConfig::new_from_env_or_default(),
            memberships,
            ott,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨🚨🚨 The JWT signing secret is not set. Generating a random secret; restarting the server will \
             invalidate every issued token. Set VGS_JWT_SECRET in production. 🚨🚨🚨"
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        env::var("VGS_JWT_SECRET").map(|s| Self { jwt_secret: Secret::new(s) }).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    memberships: HashMap<String, HashMap<String, Money>>,
    #[serde(default)]
    ott: HashMap<String, HashMap<String, Money>>,
}

fn builtin_catalogs() -> (StaticCatalog, StaticCatalog) {
    let file: CatalogFile = serde_json::from_str(DEFAULT_CATALOGS).expect("the built-in catalog tables are valid JSON");
    (StaticCatalog::new("memberships", file.memberships), StaticCatalog::new("ott", file.ott))
}

/// Loads the membership and OTT price tables from the file named by `VGS_STATIC_CATALOG_PATH`,
/// falling back to the built-in tables when the variable is unset or the file is unusable.
fn load_static_catalogs() -> (StaticCatalog, StaticCatalog) {
    let raw = match env::var("VGS_STATIC_CATALOG_PATH") {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("🪛️ Could not read the catalog file at {path}. {e} Using the built-in tables.");
                return builtin_catalogs();
            },
        },
        Err(_) => {
            info!("🪛️ VGS_STATIC_CATALOG_PATH is not set. Using the built-in membership and subscription tables.");
            return builtin_catalogs();
        },
    };
    match serde_json::from_str::<CatalogFile>(&raw) {
        Ok(file) => (StaticCatalog::new("memberships", file.memberships), StaticCatalog::new("ott", file.ott)),
        Err(e) => {
            warn!("🪛️ The catalog file is not valid JSON. {e} Using the built-in tables.");
            builtin_catalogs()
        },
    }
}
