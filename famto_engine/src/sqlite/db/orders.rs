use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use crate::db_types::{
    CommissionDetail,
    NewOrder,
    Order,
    OrderId,
    OrderStatus,
    OrderStepper,
    Step,
    StepRecord,
};

/// Inserts a new order in Pending status with the `created` step stamped.
pub async fn insert_order(
    id: OrderId,
    order: NewOrder,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let stepper = OrderStepper { created: Some(StepRecord::new(&order.created_by, at)), ..Default::default() };
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                customer_id,
                merchant_id,
                items,
                delivery_mode,
                delivery_option,
                delivery,
                bill,
                status,
                payment_mode,
                payment_status,
                payment_id,
                stepper,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'Pending', $9, $10, $11, $12, $13, $13)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(order.customer_id)
    .bind(order.merchant_id)
    .bind(Json(order.items))
    .bind(order.delivery_mode)
    .bind(order.delivery_option)
    .bind(Json(order.delivery))
    .bind(Json(order.bill))
    .bind(order.payment_mode)
    .bind(order.payment_status)
    .bind(order.payment_id)
    .bind(Json(stepper))
    .bind(at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{} has been saved in the DB", order.id);
    Ok(order)
}

pub async fn fetch_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Moves the order to `to` and stamps `step`, provided its current status is one of `from` and no refund claim is
/// held on it.
///
/// If `require_agent` is set, the order must also have an agent. Returns false, without changing anything, when the
/// order is missing or not in an expected state.
pub async fn transition_status(
    id: &OrderId,
    from: &[OrderStatus],
    to: OrderStatus,
    step: Step,
    record: &StepRecord,
    require_agent: bool,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
    builder.push_bind(to);
    builder.push(", ");
    push_step(&mut builder, step, record);
    builder.push(" WHERE id = ");
    builder.push_bind(id.as_str().to_string());
    builder.push(" AND status IN (");
    let mut statuses = builder.separated(", ");
    for status in from {
        statuses.push_bind(*status);
    }
    statuses.push_unseparated(")");
    builder.push(" AND refund_claimed_at IS NULL");
    if require_agent {
        builder.push(" AND agent_id IS NOT NULL");
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

/// Stamps `step` on an On-going order without changing its status.
pub async fn stamp_step(
    id: &OrderId,
    step: Step,
    record: &StepRecord,
    require_agent: bool,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE orders SET ");
    push_step(&mut builder, step, record);
    builder.push(" WHERE id = ");
    builder.push_bind(id.as_str().to_string());
    builder.push(" AND status = 'On-going' AND refund_claimed_at IS NULL");
    if require_agent {
        builder.push(" AND agent_id IS NOT NULL");
    }
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

/// Claims an open order for cancellation by gateway refund, using `at` as the claim token. A claim taken before
/// `stale_before` is assumed abandoned and is taken over. Returns false if the order is closed or already claimed.
pub async fn claim_for_refund(
    id: &OrderId,
    at: DateTime<Utc>,
    stale_before: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET refund_claimed_at = $2
        WHERE id = $1 AND status IN ('Pending', 'On-going')
        AND (refund_claimed_at IS NULL OR refund_claimed_at < $3)
        "#,
    )
    .bind(id.as_str())
    .bind(at)
    .bind(stale_before)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Drops the refund claim taken at `claimed_at`. Returns false if that claim is no longer held.
pub async fn release_refund_claim(
    id: &OrderId,
    claimed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET refund_claimed_at = NULL WHERE id = $1 AND refund_claimed_at = $2")
        .bind(id.as_str())
        .bind(claimed_at)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Stores the gateway refund id on an order still held under the claim taken at `claimed_at`. The claim stays in
/// place until the cancellation commits. Returns false if that claim is no longer held.
pub async fn record_refund(
    id: &OrderId,
    claimed_at: DateTime<Utc>,
    refund_id: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET refund_id = $3 WHERE id = $1 AND refund_claimed_at = $2")
        .bind(id.as_str())
        .bind(claimed_at)
        .bind(refund_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Cancels an order whose gateway refund went through under the claim taken at `claimed_at`. The refund id is
/// stored and the claim cleared. Returns false if that claim is no longer held.
pub async fn cancel_claimed(
    id: &OrderId,
    claimed_at: DateTime<Utc>,
    record: &StepRecord,
    refund_id: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE orders SET status = 'Cancelled', refund_claimed_at = NULL, refund_id = ");
    builder.push_bind(refund_id.to_string());
    builder.push(", ");
    push_step(&mut builder, Step::Cancelled, record);
    builder.push(" WHERE id = ");
    builder.push_bind(id.as_str().to_string());
    builder.push(" AND status IN ('Pending', 'On-going') AND refund_claimed_at = ");
    builder.push_bind(claimed_at);
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

fn push_step(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, step: Step, record: &StepRecord) {
    builder.push("stepper = json_set(stepper, ");
    builder.push_bind(step.json_path());
    builder.push(", json(");
    builder.push_bind(Json(record.clone()));
    builder.push(")), updated_at = ");
    builder.push_bind(record.date);
}

pub async fn set_commission(
    id: &OrderId,
    commission: &CommissionDetail,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET merchant_earnings = $2, famto_earnings = $3 WHERE id = $1")
        .bind(id.as_str())
        .bind(commission.merchant_earnings)
        .bind(commission.famto_earnings)
        .execute(conn)
        .await?;
    Ok(())
}

/// Records the delivery agent on an On-going order. The agent can only be set once.
pub async fn assign_agent(
    id: &OrderId,
    agent_id: &str,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET agent_id = $2, updated_at = $3
        WHERE id = $1 AND agent_id IS NULL AND status = 'On-going' AND refund_claimed_at IS NULL
        "#,
    )
    .bind(id.as_str())
    .bind(agent_id)
    .bind(at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
