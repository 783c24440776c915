use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{NewScheduledOrder, ScheduledOrder};

pub async fn insert_scheduled_order(
    id: &str,
    order: NewScheduledOrder,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<ScheduledOrder, sqlx::Error> {
    let window = order.window;
    let order: ScheduledOrder = sqlx::query_as(
        r#"
            INSERT INTO scheduled_orders (
                id,
                customer_id,
                merchant_id,
                items,
                delivery_mode,
                delivery,
                bill,
                payment_mode,
                payment_status,
                start_date,
                end_date,
                time,
                num_of_days,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(order.customer_id)
    .bind(order.merchant_id)
    .bind(Json(order.items))
    .bind(order.delivery_mode)
    .bind(Json(order.delivery))
    .bind(Json(order.bill))
    .bind(order.payment_mode)
    .bind(order.payment_status)
    .bind(window.start_date)
    .bind(window.end_date)
    .bind(window.time)
    .bind(window.num_of_days)
    .bind(at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Scheduled order #{} has been saved in the DB", order.id);
    Ok(order)
}

pub async fn fetch_scheduled_order(id: &str, conn: &mut SqliteConnection) -> Result<Option<ScheduledOrder>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM scheduled_orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn mark_viewed(id: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE scheduled_orders SET is_viewed = TRUE WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_unviewed(merchant_id: &str, conn: &mut SqliteConnection) -> Result<Vec<ScheduledOrder>, sqlx::Error> {
    let orders = sqlx::query_as(
        "SELECT * FROM scheduled_orders WHERE merchant_id = $1 AND is_viewed = FALSE ORDER BY created_at, id",
    )
    .bind(merchant_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
