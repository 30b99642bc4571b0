use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderId},
    traits::{InsertOrderResult, SyncGatewayError},
};

/// Create-only upsert keyed on the provider uuid.
///
/// If an order with this uuid already exists, nothing is modified and the stored row is
/// returned; corrections arriving from the remote side are deliberately not applied (see
/// DESIGN.md). Only genuinely new identities are inserted.
pub async fn idempotent_insert(
    order: NewOrder,
    machine_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, SyncGatewayError> {
    let result = match fetch_by_uuid(&order.uuid, &mut *conn).await? {
        Some(existing) => InsertOrderResult::AlreadyExists(existing),
        None => {
            let order = insert_order(order, machine_id, conn).await?;
            debug!("🗃️ Order [{}] inserted with id {}", order.uuid, order.id);
            InsertOrderResult::Inserted(order)
        },
    };
    Ok(result)
}

/// Inserts a new order using the given connection. Not atomic on its own; embed the call in a
/// transaction and pass `&mut *tx` when machine updates must land together with the order.
async fn insert_order(
    order: NewOrder,
    machine_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Order, SyncGatewayError> {
    let payload = order
        .source_payload
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| SyncGatewayError::PayloadError(e.to_string()))?;
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                uuid,
                provider,
                source_order_no,
                machine_id,
                product_name,
                slot_number,
                payment_amount,
                payment_time,
                payment_type,
                payment_status,
                delivery_state,
                source_payload,
                sync_status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'Pending')
            RETURNING *;
        "#,
    )
    .bind(order.uuid)
    .bind(order.provider)
    .bind(order.source_order_no)
    .bind(machine_id)
    .bind(order.product_name)
    .bind(order.slot_number)
    .bind(order.payment_amount)
    .bind(order.payment_time)
    .bind(order.payment_type)
    .bind(order.payment_status)
    .bind(order.delivery_state)
    .bind(payload)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_by_uuid(
    uuid: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE uuid = $1").bind(uuid.as_str()).fetch_optional(conn).await?;
    Ok(order)
}
