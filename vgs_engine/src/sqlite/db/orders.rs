use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId},
    traits::{Expected, OrderUpdate, StoreError},
};

/// Inserts a new order using the given connection. Not atomic by itself; embed the call in a
/// transaction and pass `&mut *tx` if atomicity with other writes is needed.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                buyer_id,
                game,
                item,
                player_id,
                zone_id,
                price,
                payment_method,
                contact_email,
                contact_phone,
                created_at,
                expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.buyer_id)
    .bind(order.item.game)
    .bind(order.item.item)
    .bind(order.target.player_id)
    .bind(order.target.zone_id)
    .bind(order.price)
    .bind(order.payment_method)
    .bind(order.contact.email)
    .bind(order.contact.phone)
    .bind(order.created_at)
    .bind(order.expires_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} inserted with id {}", order.order_id, order.id);
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn set_gateway_order(
    order_id: &OrderId,
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Order, StoreError> {
    let order: Option<Order> = sqlx::query_as(
        "UPDATE orders SET gateway_order_id = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 RETURNING *",
    )
    .bind(gateway_order_id)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    order.ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))
}

/// Applies `update` to the order iff it is still in the `expected` pre-state.
///
/// The precondition is part of the `WHERE` clause, so check and write happen in one statement.
/// `None` means the precondition no longer held and nothing was written.
pub async fn checked_transition(
    order_id: &OrderId,
    expected: Expected,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    if update.is_empty() {
        return Err(StoreError::EmptyTransition);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(status) = update.status {
        set_clause.push("status = ");
        set_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(payment_status) = update.payment_status {
        set_clause.push("payment_status = ");
        set_clause.push_bind_unseparated(payment_status.to_string());
    }
    if let Some(topup_status) = update.topup_status {
        set_clause.push("topup_status = ");
        set_clause.push_bind_unseparated(topup_status.to_string());
    }
    if let Some(gateway_response) = update.gateway_response {
        set_clause.push("gateway_response = ");
        set_clause.push_bind_unseparated(gateway_response);
    }
    if let Some(fulfillment_response) = update.fulfillment_response {
        set_clause.push("fulfillment_response = ");
        set_clause.push_bind_unseparated(fulfillment_response);
    }
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id.as_str().to_string());
    if let Some(status) = expected.status {
        builder.push(" AND status = ");
        builder.push_bind(status.to_string());
    }
    if let Some(payment_status) = expected.payment_status {
        builder.push(" AND payment_status = ");
        builder.push_bind(payment_status.to_string());
    }
    if let Some(topup_status) = expected.topup_status {
        builder.push(" AND topup_status = ");
        builder.push_bind(topup_status.to_string());
    }
    builder.push(" RETURNING *");
    trace!("🗃️ Executing conditional transition: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    Ok(order)
}
