use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::json;
use vgs_common::Money;
use vgs_engine::{
    db_types::{OrderId, OrderStatus, PaymentStatus, TopupStatus},
    traits::{GatewaySession, GatewayStatus, StoreError},
};

use super::{
    helpers::{issue_token, post_request},
    mocks::{mock_api, pending_order, MockCatalog, MockDb, MockFulfillment, MockGateway, TEST_ORDER_ID},
};
use crate::routes::{CreateOrderRoute, VerifyOrderRoute};

fn order_body() -> serde_json::Value {
    json!({
        "game": "rift_arena",
        "item": "diamond_pack",
        "player_id": "p-100",
        "zone_id": "z-1",
        "payment_method": "gateway",
        "email": "buyer@example.com"
    })
}

#[actix_web::test]
async fn orders_require_an_access_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/orders", order_body(), configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("authentication token is required"));
}

#[actix_web::test]
async fn a_garbled_auth_header_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let token = "not-a-jwt-at-all";
    let (status, _) = post_request(token, "/orders", order_body(), configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn an_injected_price_field_cannot_change_the_charged_amount() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(Some("buyer-1"), "retail");
    let mut body = order_body();
    body["price"] = json!(1);
    let (status, body) = post_request(&token, "/orders", body, configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("payment_url"));
    // The charged amount is asserted inside the insert_order mock in `configure_create`.
    assert!(!body.contains("\"price\""));
}

#[actix_web::test]
async fn orders_without_a_contact_channel_are_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(Some("buyer-1"), "retail");
    let mut body = order_body();
    body.as_object_mut().unwrap().remove("email");
    let (status, body) = post_request(&token, "/orders", body, configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("contact channel"));
}

#[actix_web::test]
async fn wallet_orders_are_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(Some("buyer-1"), "retail");
    let mut body = order_body();
    body["payment_method"] = json!("wallet");
    let (status, body) = post_request(&token, "/orders", body, configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("disabled"));
}

#[actix_web::test]
async fn verifying_another_buyers_order_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(Some("buyer-2"), "retail");
    let path = format!("/orders/{TEST_ORDER_ID}/verify");
    let (status, body) = post_request(&token, &path, json!({}), configure_verify_pending).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("another buyer"));
}

#[actix_web::test]
async fn verifying_an_unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(Some("buyer-1"), "retail");
    let (status, _) =
        post_request(&token, "/orders/VG-nope/verify", json!({}), configure_verify_missing).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn a_completed_order_verifies_idempotently() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(Some("buyer-1"), "retail");
    let path = format!("/orders/{TEST_ORDER_ID}/verify");
    let (status, body) = post_request(&token, &path, json!({}), configure_verify_completed).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#));
    assert!(body.contains("delivered"));
}

#[actix_web::test]
async fn a_guest_token_cannot_verify_an_owned_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(None, "retail");
    let path = format!("/orders/{TEST_ORDER_ID}/verify");
    let (status, body) = post_request(&token, &path, json!({}), configure_verify_pending).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("another buyer"));
}

#[actix_web::test]
async fn a_guest_order_verifies_with_a_guest_token() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(None, "retail");
    let path = format!("/orders/{TEST_ORDER_ID}/verify");
    let (status, body) =
        post_request(&token, &path, json!({}), configure_verify_guest_completed).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#));
}

#[actix_web::test]
async fn backend_faults_do_not_leak_internal_detail() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(Some("buyer-1"), "retail");
    let path = format!("/orders/{TEST_ORDER_ID}/verify");
    let (status, body) =
        post_request(&token, &path, json!({}), configure_verify_backend_fault).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("internal server error"));
    // The store's error message names the order id; none of that may reach the client.
    assert!(!body.contains(TEST_ORDER_ID));
    assert!(!body.contains("backend"));
}

#[actix_web::test]
async fn an_amount_mismatch_reads_back_as_a_fraud_failure() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(Some("buyer-1"), "retail");
    let path = format!("/orders/{TEST_ORDER_ID}/verify");
    let (status, body) = post_request(&token, &path, json!({}), configure_verify_mismatch).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":false"#));
    assert!(body.contains("mismatch"));
}

/// Happy-path order creation. The catalog prices the SKU at 500 and the insert mock asserts that
/// exactly that amount is persisted, whatever the client sent.
fn configure_create(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_pricing_config().returning(|_| Ok(None));
    db.expect_insert_order().withf(|order| order.price == Money::from(500)).returning(|new_order| {
        let mut order = pending_order(500);
        order.order_id = new_order.order_id;
        order.gateway_order_id = None;
        Ok(order)
    });
    db.expect_set_gateway_order().returning(|id, gw| {
        let mut order = pending_order(500);
        order.order_id = id.clone();
        order.gateway_order_id = Some(gw.to_string());
        Ok(order)
    });
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().returning(|id, _, _| {
        Ok(GatewaySession {
            gateway_order_id: "gw-77".to_string(),
            payment_url: format!("https://pay.example.com/{}", id.as_str()),
        })
    });
    let mut catalog = MockCatalog::new();
    catalog.expect_selling_price().returning(|_, _| Ok(Some(Money::from(500))));
    let api = mock_api(db, gateway, MockFulfillment::new(), catalog);
    cfg.app_data(web::Data::new(api))
        .service(CreateOrderRoute::<MockDb, MockGateway, MockFulfillment, MockCatalog>::new());
}

/// Backend that must never be reached. Every mock panics on use, so any test wired to this
/// configuration proves the request was rejected before the engine was consulted.
fn configure_untouched(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_pricing_config().times(0);
    db.expect_insert_order().times(0);
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().times(0);
    let api = mock_api(db, gateway, MockFulfillment::new(), MockCatalog::new());
    cfg.app_data(web::Data::new(api))
        .service(CreateOrderRoute::<MockDb, MockGateway, MockFulfillment, MockCatalog>::new());
}

fn configure_verify_pending(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(pending_order(500))));
    db.expect_checked_transition().times(0);
    let mut gateway = MockGateway::new();
    gateway.expect_check_status().times(0);
    let api = mock_api(db, gateway, MockFulfillment::new(), MockCatalog::new());
    cfg.app_data(web::Data::new(api))
        .service(VerifyOrderRoute::<MockDb, MockGateway, MockFulfillment, MockCatalog>::new());
}

fn configure_verify_missing(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(None));
    let api = mock_api(db, MockGateway::new(), MockFulfillment::new(), MockCatalog::new());
    cfg.app_data(web::Data::new(api))
        .service(VerifyOrderRoute::<MockDb, MockGateway, MockFulfillment, MockCatalog>::new());
}

fn configure_verify_completed(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| {
        let mut order = pending_order(500);
        order.status = OrderStatus::Success;
        order.payment_status = PaymentStatus::Success;
        order.topup_status = TopupStatus::Success;
        order.fulfillment_response = Some(r#"{"status": "success"}"#.to_string());
        Ok(Some(order))
    });
    db.expect_checked_transition().times(0);
    let mut gateway = MockGateway::new();
    gateway.expect_check_status().times(0);
    let mut fulfillment = MockFulfillment::new();
    fulfillment.expect_dispatch().times(0);
    let api = mock_api(db, gateway, fulfillment, MockCatalog::new());
    cfg.app_data(web::Data::new(api))
        .service(VerifyOrderRoute::<MockDb, MockGateway, MockFulfillment, MockCatalog>::new());
}

/// A completed guest order. `buyer_id` is absent, so the order is reconcilable by anyone who
/// holds the order id.
fn configure_verify_guest_completed(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| {
        let mut order = pending_order(500);
        order.buyer_id = None;
        order.status = OrderStatus::Success;
        order.payment_status = PaymentStatus::Success;
        order.topup_status = TopupStatus::Success;
        order.fulfillment_response = Some(r#"{"status": "success"}"#.to_string());
        Ok(Some(order))
    });
    db.expect_checked_transition().times(0);
    let api = mock_api(db, MockGateway::new(), MockFulfillment::new(), MockCatalog::new());
    cfg.app_data(web::Data::new(api))
        .service(VerifyOrderRoute::<MockDb, MockGateway, MockFulfillment, MockCatalog>::new());
}

/// A store that fails outright. The error message carries the order id, which must never be
/// echoed back to the client.
fn configure_verify_backend_fault(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id()
        .returning(|id| Err(StoreError::OrderNotFound(OrderId::from(id.as_str().to_string()))));
    let api = mock_api(db, MockGateway::new(), MockFulfillment::new(), MockCatalog::new());
    cfg.app_data(web::Data::new(api))
        .service(VerifyOrderRoute::<MockDb, MockGateway, MockFulfillment, MockCatalog>::new());
}

fn configure_verify_mismatch(cfg: &mut ServiceConfig) {
    let mut db = MockDb::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(pending_order(99))));
    db.expect_checked_transition().returning(|_, _, _| {
        let mut order = pending_order(99);
        order.status = OrderStatus::Fraud;
        order.payment_status = PaymentStatus::Failed;
        order.topup_status = TopupStatus::Failed;
        Ok(Some(order))
    });
    let mut gateway = MockGateway::new();
    gateway.expect_check_status().returning(|_| {
        Ok(GatewayStatus::Success { amount: Money::from(98), raw: json!({"txn_status": "SUCCESS", "amount": 98}) })
    });
    let mut fulfillment = MockFulfillment::new();
    fulfillment.expect_dispatch().times(0);
    let api = mock_api(db, gateway, fulfillment, MockCatalog::new());
    cfg.app_data(web::Data::new(api))
        .service(VerifyOrderRoute::<MockDb, MockGateway, MockFulfillment, MockCatalog>::new());
}
