use std::str::FromStr;

use chrono::{DateTime, Utc};
use cko_common::Money;
use log::{debug, trace};
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderLineItem, OrderStatusType, ShippingAddress},
    order_objects::OrderQueryFilter,
    traits::{InsertOrderResult, OrderStoreError},
};

/// The orders table as stored. Money is kept as decimal text and the line items and address as JSON text, so that a
/// whole order is written by a single row insert.
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: i64,
    order_id: String,
    customer_id: Option<String>,
    buyer_name: String,
    email: String,
    items: String,
    grand_total: String,
    discount: String,
    currency: String,
    shipping_address: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = OrderStoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let oid = row.order_id.clone();
        let corrupt =
            move |field: &str, e: String| OrderStoreError::DataIntegrityError(oid.clone(), format!("{field}. {e}"));
        let items =
            serde_json::from_str::<Vec<OrderLineItem>>(&row.items).map_err(|e| corrupt("items", e.to_string()))?;
        let shipping_address = serde_json::from_str::<ShippingAddress>(&row.shipping_address)
            .map_err(|e| corrupt("shipping_address", e.to_string()))?;
        let grand_total = Money::from_str(&row.grand_total).map_err(|e| corrupt("grand_total", e.to_string()))?;
        let discount = Money::from_str(&row.discount).map_err(|e| corrupt("discount", e.to_string()))?;
        let status = OrderStatusType::from_str(&row.status).map_err(|e| corrupt("status", e.to_string()))?;
        Ok(Order {
            id: row.id,
            order_id: OrderId(row.order_id),
            customer_id: row.customer_id,
            buyer_name: row.buyer_name,
            email: row.email,
            items,
            grand_total,
            discount,
            currency: row.currency,
            shipping_address,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, OrderStoreError> {
    rows.into_iter().map(Order::try_from).collect()
}

/// Inserts the order unless one with the same `order_id` already exists.
///
/// The existence check and the insert are the same statement (`ON CONFLICT DO NOTHING`), so two callers racing on the
/// same order id cannot both insert, and the loser sees `AlreadyExists` rather than a constraint violation. Run this
/// inside a transaction (pass `&mut *tx`) and do not read from the orders table earlier in that transaction.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<InsertOrderResult, OrderStoreError> {
    let oid = order.order_id.to_string();
    let items = serde_json::to_string(&order.items)
        .map_err(|e| OrderStoreError::SerializationError(oid.clone(), e.to_string()))?;
    let address = serde_json::to_string(&order.shipping_address)
        .map_err(|e| OrderStoreError::SerializationError(oid.clone(), e.to_string()))?;
    let row: Option<OrderRow> = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                buyer_name,
                email,
                items,
                grand_total,
                discount,
                currency,
                shipping_address,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.customer_id)
    .bind(order.buyer_name)
    .bind(order.email)
    .bind(items)
    .bind(order.grand_total.value().to_string())
    .bind(order.discount.value().to_string())
    .bind(order.currency)
    .bind(address)
    .bind(order.status.to_string())
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => {
            let order = Order::try_from(row)?;
            debug!("📝️ Order [{}] inserted with id {}", order.order_id, order.id);
            Ok(InsertOrderResult::Inserted(order))
        },
        None => {
            let id = order_exists(&order.order_id, conn).await?.ok_or_else(|| {
                OrderStoreError::DatabaseError(format!("Order [{oid}] conflicted on insert but could not be found"))
            })?;
            debug!("📝️ Order [{oid}] already exists with id {id}. Nothing inserted.");
            Ok(InsertOrderResult::AlreadyExists(id))
        },
    }
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let row: Option<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    row.map(Order::try_from).transpose()
}

/// Checks whether the order with the given `OrderId` already exists in the database. If it does exist, the `id` of the
/// order is returned. If it does not exist, `None` is returned.
pub async fn order_exists(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<i64>, OrderStoreError> {
    let id: Option<i64> = sqlx::query_scalar("SELECT id FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderStoreError> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id.0);
    }
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at ASC, id ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<OrderRow>().fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {}", rows.len());
    into_orders(rows)
}
