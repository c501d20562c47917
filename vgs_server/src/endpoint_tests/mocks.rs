use chrono::{Duration, Utc};
use mockall::mock;
use vgs_common::Money;
use vgs_engine::{
    db_types::{
        BuyerTier,
        ContactInfo,
        FulfillmentTarget,
        ItemRef,
        NewOrder,
        Order,
        OrderId,
        OrderStatus,
        PaymentMethod,
        PaymentStatus,
        PricingConfig,
        TopupStatus,
    },
    traits::{
        CatalogError,
        Expected,
        FulfillmentError,
        FulfillmentOutcome,
        FulfillmentProvider,
        GameCatalog,
        GatewayError,
        GatewaySession,
        GatewayStatus,
        OrderStore,
        OrderUpdate,
        PaymentGateway,
        PricingStore,
        StoreError,
    },
    OrderFlowApi,
    PriceResolver,
    StaticCatalog,
};

mock! {
    pub Db {}

    impl OrderStore for Db {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
        async fn set_gateway_order(&self, order_id: &OrderId, gateway_order_id: &str) -> Result<Order, StoreError>;
        async fn checked_transition(
            &self,
            order_id: &OrderId,
            expected: Expected,
            update: OrderUpdate,
        ) -> Result<Option<Order>, StoreError>;
    }

    impl PricingStore for Db {
        async fn fetch_pricing_config(&self, tier: &BuyerTier) -> Result<Option<PricingConfig>, StoreError>;
        async fn upsert_pricing_config(&self, config: PricingConfig) -> Result<(), StoreError>;
    }
}

mock! {
    pub Gateway {}

    impl PaymentGateway for Gateway {
        async fn create_order(
            &self,
            order_id: &OrderId,
            amount: Money,
            contact: &ContactInfo,
        ) -> Result<GatewaySession, GatewayError>;
        async fn check_status(&self, order_id: &OrderId) -> Result<GatewayStatus, GatewayError>;
    }
}

mock! {
    pub Fulfillment {}

    impl FulfillmentProvider for Fulfillment {
        async fn dispatch(
            &self,
            item: &ItemRef,
            target: &FulfillmentTarget,
        ) -> Result<FulfillmentOutcome, FulfillmentError>;
    }
}

mock! {
    pub Catalog {}

    impl GameCatalog for Catalog {
        async fn selling_price(&self, game: &str, item: &str) -> Result<Option<Money>, CatalogError>;
    }
}

pub type MockOrderFlowApi = OrderFlowApi<MockDb, MockGateway, MockFulfillment, MockCatalog>;

pub fn mock_api(db: MockDb, gateway: MockGateway, fulfillment: MockFulfillment, catalog: MockCatalog) -> MockOrderFlowApi {
    let resolver = PriceResolver::new(StaticCatalog::empty("memberships"), StaticCatalog::empty("ott"), catalog);
    OrderFlowApi::new(db, gateway, fulfillment, resolver)
}

pub const TEST_ORDER_ID: &str = "VG-20260830120000-AbCdEf12";

pub fn pending_order(price: i64) -> Order {
    let now = Utc::now();
    Order {
        id: 1,
        order_id: OrderId::from(TEST_ORDER_ID.to_string()),
        buyer_id: Some("buyer-1".to_string()),
        item: ItemRef::new("rift_arena", "diamond_pack"),
        target: FulfillmentTarget::new("p-100", "z-1"),
        price: Money::from(price),
        payment_method: PaymentMethod::Gateway,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        topup_status: TopupStatus::Pending,
        gateway_order_id: Some("gw-1".to_string()),
        gateway_response: None,
        fulfillment_response: None,
        contact_email: Some("buyer@example.com".to_string()),
        contact_phone: None,
        created_at: now,
        updated_at: now,
        expires_at: now + Duration::seconds(90),
    }
}
