use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use provider_tools::{CatalogApi, FulfillmentApi, GatewayApi};
use vgs_engine::{OrderFlowApi, PriceResolver, SqliteDatabase};

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    routes::{health, CreateOrderRoute, VerifyOrderRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = GatewayApi::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let fulfillment =
        FulfillmentApi::new(config.fulfillment.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let catalog = CatalogApi::new(config.catalog.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db, gateway, fulfillment, catalog)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: GatewayApi,
    fulfillment: FulfillmentApi,
    catalog: CatalogApi,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let resolver = PriceResolver::new(config.memberships.clone(), config.ott.clone(), catalog.clone());
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), fulfillment.clone(), resolver);
        let verifier = TokenVerifier::new(&config.auth);
        let api_scope = web::scope("/api")
            .service(CreateOrderRoute::<SqliteDatabase, GatewayApi, FulfillmentApi, CatalogApi>::new())
            .service(VerifyOrderRoute::<SqliteDatabase, GatewayApi, FulfillmentApi, CatalogApi>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("vgs::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(verifier))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
