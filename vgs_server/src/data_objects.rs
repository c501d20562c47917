use serde::{Deserialize, Serialize};
use std::fmt::Display;

use vgs_engine::{
    db_types::{ContactInfo, FulfillmentTarget, ItemRef, PaymentMethod},
    CheckoutSession,
};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The order-creation request body. There is deliberately no price field here; any extra fields
/// a client injects (a `price`, say) are ignored during deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    pub game: String,
    pub item: String,
    pub player_id: String,
    #[serde(default)]
    pub zone_id: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl OrderRequest {
    /// Validates the request shape and converts it into an engine request. Validation failures
    /// are reported, not thrown.
    pub fn validate(self) -> Result<vgs_engine::OrderRequest, ServerError> {
        if self.game.trim().is_empty() || self.item.trim().is_empty() {
            return Err(ServerError::InvalidRequestBody("An item reference is required".to_string()));
        }
        if self.player_id.trim().is_empty() {
            return Err(ServerError::InvalidRequestBody("A fulfillment target is required".to_string()));
        }
        let contact = ContactInfo { email: self.email, phone: self.phone };
        if !contact.has_any() {
            return Err(ServerError::InvalidRequestBody(
                "At least one contact channel (email or phone) is required".to_string(),
            ));
        }
        Ok(vgs_engine::OrderRequest {
            item: ItemRef::new(self.game, self.item),
            target: FulfillmentTarget::new(self.player_id, self.zone_id),
            payment_method: self.payment_method,
            contact,
        })
    }
}

/// What the order-creation endpoint returns. The price is intentionally not echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_id: String,
    pub payment_url: String,
}

impl From<CheckoutSession> for CheckoutResponse {
    fn from(session: CheckoutSession) -> Self {
        Self { success: true, order_id: session.order_id.as_str().to_string(), payment_url: session.payment_url }
    }
}
