use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use vgs_common::Money;
use vgs_engine::{
    db_types::{ContactInfo, OrderId},
    traits::{GatewayError, GatewaySession, GatewayStatus, PaymentGateway},
};

use crate::{config::GatewayConfig, error::ProviderApiError};

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    order_id: &'a str,
    amount: Money,
    customer_email: Option<&'a str>,
    customer_phone: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    gateway_order_id: String,
    payment_url: String,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, ProviderApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let app_id = HeaderValue::from_str(&config.app_id)
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        let secret = HeaderValue::from_str(config.api_secret.reveal().as_str())
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        headers.insert("X-App-Id", app_id);
        headers.insert("X-Api-Secret", secret);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, ProviderApiError> {
        let url = self.url(path);
        trace!("💳️ Sending gateway query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| ProviderApiError::Transport(e.to_string()))?;
        if response.status().is_success() {
            response.json::<T>().await.map_err(|e| ProviderApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| ProviderApiError::Transport(e.to_string()))?;
            Err(ProviderApiError::QueryError { status, message })
        }
    }
}

impl PaymentGateway for GatewayApi {
    async fn create_order(
        &self,
        order_id: &OrderId,
        amount: Money,
        contact: &ContactInfo,
    ) -> Result<GatewaySession, GatewayError> {
        let body = CreateOrderRequest {
            order_id: order_id.as_str(),
            amount,
            customer_email: contact.email.as_deref(),
            customer_phone: contact.phone.as_deref(),
        };
        let response: CreateOrderResponse =
            self.rest_query(Method::POST, "/pg/orders", Some(body)).await.map_err(into_gateway_error)?;
        debug!("💳️ Gateway session {} opened for order {order_id}", response.gateway_order_id);
        Ok(GatewaySession { gateway_order_id: response.gateway_order_id, payment_url: response.payment_url })
    }

    async fn check_status(&self, order_id: &OrderId) -> Result<GatewayStatus, GatewayError> {
        let path = format!("/pg/orders/{}/status", order_id.as_str());
        let raw: Value = self.rest_query(Method::GET, &path, None::<()>).await.map_err(into_gateway_error)?;
        Ok(parse_gateway_status(raw))
    }
}

fn into_gateway_error(err: ProviderApiError) -> GatewayError {
    match err {
        ProviderApiError::QueryError { status, message } => GatewayError::Rejected { status, message },
        ProviderApiError::JsonError(e) => GatewayError::BadResponse(e),
        ProviderApiError::Transport(e) | ProviderApiError::Initialization(e) => GatewayError::Transport(e),
    }
}

/// Maps a raw gateway status payload onto the tagged status type. Only `PENDING`, `SUCCESS` and
/// `COMPLETED` are recognised transaction states; anything else counts as a failure.
fn parse_gateway_status(raw: Value) -> GatewayStatus {
    let txn_status = raw["txn_status"].as_str().unwrap_or_default().to_uppercase();
    match txn_status.as_str() {
        "PENDING" => GatewayStatus::Pending,
        "SUCCESS" | "COMPLETED" => {
            let amount = parse_amount(&raw["amount"]);
            GatewayStatus::Success { amount, raw }
        },
        other => {
            let reason = raw["message"].as_str().unwrap_or(if other.is_empty() { "Unknown status" } else { other });
            GatewayStatus::Failed { reason: reason.to_string(), raw: raw.clone() }
        },
    }
}

/// Extracts a paid amount from a gateway payload. Gateways variously report integers, floats and
/// numeric strings; anything unparseable becomes zero, which can never pass the strict amount
/// check downstream.
fn parse_amount(value: &Value) -> Money {
    let amount = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Money::from(amount.unwrap_or(0))
}
