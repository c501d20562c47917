use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vgs_common::Money;

/// A local, in-process price table for a family of plans (memberships, OTT subscriptions).
///
/// A catalog answers two questions separately. `contains_plan` says whether an item family is
/// served by this catalog at all, and `price` looks up a specific variant within it. The split
/// matters during resolution: once a catalog claims a plan, a missing variant is an invalid SKU
/// rather than a reason to consult the next source.
pub trait SkuCatalog {
    fn contains_plan(&self, plan: &str) -> bool;
    fn price(&self, plan: &str, variant: &str) -> Option<Money>;
}

/// A [`SkuCatalog`] backed by a static two-level map, typically loaded from a JSON file at
/// startup or compiled in as a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(skip, default)]
    name: String,
    #[serde(flatten)]
    plans: HashMap<String, HashMap<String, Money>>,
}

impl StaticCatalog {
    pub fn new(name: &str, plans: HashMap<String, HashMap<String, Money>>) -> Self {
        Self { name: name.to_string(), plans }
    }

    pub fn empty(name: &str) -> Self {
        Self { name: name.to_string(), plans: HashMap::new() }
    }

    /// Parses a catalog from a JSON object of the form `{"plan": {"variant": price_in_paise}}`.
    pub fn from_json(name: &str, json: &str) -> Result<Self, serde_json::Error> {
        let plans = serde_json::from_str(json)?;
        Ok(Self { name: name.to_string(), plans })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl SkuCatalog for StaticCatalog {
    fn contains_plan(&self, plan: &str) -> bool {
        self.plans.contains_key(plan)
    }

    fn price(&self, plan: &str, variant: &str) -> Option<Money> {
        self.plans.get(plan).and_then(|variants| variants.get(variant)).copied()
    }
}
