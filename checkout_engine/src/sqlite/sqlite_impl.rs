//! `SqliteDatabase` is a concrete implementation of a checkout engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{catalog, customers, db_url, new_pool, orders};
use crate::{
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
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_item(&self, item_id: &str) -> Result<Option<CatalogItem>, CatalogError> {
        // A read transaction, so that the item and its variants come from the same snapshot
        let mut tx = self.pool.begin().await?;
        let item = catalog::fetch_item(item_id, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn fetch_customer(&self, customer_id: &str) -> Result<Option<Customer>, CustomerError> {
        let mut conn = self.pool.acquire().await?;
        customers::fetch_customer(customer_id, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        trace!("🗃️ Fetching orders. {query}");
        orders::search_orders(query, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `CKO_DATABASE_URL` environment variable, or the default URL.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        debug!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Adds an item to the catalog, or replaces it (and all its variants) if it already exists.
    pub async fn upsert_item(&self, item: &CatalogItem) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;
        catalog::upsert_item(item, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn upsert_customer(&self, customer: &Customer) -> Result<(), CustomerError> {
        let mut conn = self.pool.acquire().await?;
        customers::upsert_customer(customer, &mut conn).await
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}
