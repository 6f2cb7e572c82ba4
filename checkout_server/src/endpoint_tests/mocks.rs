use checkout_engine::{
    checkout_objects::{PaymentAuthorizer, PaymentIntentRef, PaymentIntentRequest},
    db_types::{CatalogItem, Customer, NewOrder, Order, OrderId},
    order_objects::OrderQueryFilter,
    traits::{
        CatalogError,
        CatalogManagement,
        CustomerError,
        CustomerManagement,
        InsertOrderResult,
        OrderManagement,
        OrderStoreError,
    },
    AuthorizationError,
};
use mockall::mock;

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderStoreError>;
        async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;
    }
}

mock! {
    pub PricingBackend {}
    impl CatalogManagement for PricingBackend {
        async fn fetch_item(&self, item_id: &str) -> Result<Option<CatalogItem>, CatalogError>;
    }
    impl CustomerManagement for PricingBackend {
        async fn fetch_customer(&self, customer_id: &str) -> Result<Option<Customer>, CustomerError>;
    }
}

mock! {
    pub Authorizer {}
    impl PaymentAuthorizer for Authorizer {
        async fn authorize(&self, request: PaymentIntentRequest) -> Result<PaymentIntentRef, AuthorizationError>;
    }
}
