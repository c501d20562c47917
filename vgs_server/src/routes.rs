//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the storage backend and the three provider clients, so endpoint
//! tests can swap every collaborator for a mock.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use vgs_engine::{
    db_types::OrderId,
    traits::{FulfillmentProvider, GameCatalog, PaymentGateway, StorefrontStore},
    OrderFlowApi,
};

use crate::{
    auth::JwtClaims,
    data_objects::{CheckoutResponse, OrderRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//--------------------------------------------- Create order ---------------------------------------------------
route!(create_order => Post "/orders" impl StorefrontStore, PaymentGateway, FulfillmentProvider, GameCatalog);
/// Route handler for the order creation endpoint
///
/// Creates a pending order at the server-resolved price and opens a payment session for it. The
/// caller's tier (from the access token) drives pricing; nothing in the request body can touch
/// the price. The response carries the payment URL to redirect the buyer to.
pub async fn create_order<B, G, F, C>(
    claims: JwtClaims,
    body: web::Json<OrderRequest>,
    api: web::Data<OrderFlowApi<B, G, F, C>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontStore,
    G: PaymentGateway,
    F: FulfillmentProvider,
    C: GameCatalog,
{
    let caller = claims.identity();
    let request = body.into_inner().validate()?;
    debug!("💻️ POST order for {} from tier '{}'", request.item, caller.tier);
    let session = api.create_order(request, &caller).await?;
    Ok(HttpResponse::Ok().json(CheckoutResponse::from(session)))
}

//--------------------------------------------- Verify order ---------------------------------------------------
route!(verify_order => Post "/orders/{order_id}/verify" impl StorefrontStore, PaymentGateway, FulfillmentProvider, GameCatalog);
/// Route handler for the order reconciliation endpoint
///
/// Runs one reconciliation pass for the order and reports the outcome. Clients poll this after
/// redirecting the buyer to the gateway; it is safe to call any number of times.
pub async fn verify_order<B, G, F, C>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, G, F, C>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontStore,
    G: PaymentGateway,
    F: FulfillmentProvider,
    C: GameCatalog,
{
    let caller = claims.identity();
    let order_id = path.into_inner();
    debug!("💻️ POST verify for order {order_id}");
    let outcome = api.reconcile(&order_id, &caller).await?;
    Ok(HttpResponse::Ok().json(outcome))
}
