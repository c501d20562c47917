use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{Duration, Utc};
use log::debug;
use vgs_common::Secret;

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::AuthConfig,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new("endpoint-test-signing-secret-0123456789abcdef".to_string()) }
}

pub fn issue_token(buyer_id: Option<&str>, tier: &str) -> String {
    let issuer = TokenIssuer::new(&get_auth_config());
    issuer
        .issue_token(buyer_id.map(String::from), tier, Utc::now() + Duration::hours(1))
        .expect("Failed to sign token")
}

pub async fn post_request(
    auth_header: &str,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), anyhow::Error> {
    let mut req = TestRequest::post().uri(path).set_json(&body);
    if !auth_header.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {auth_header}")));
    }
    let req = req.to_request();
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new().app_data(web::Data::new(verifier)).configure(configure);

    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| anyhow::anyhow!("{e}"))?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
