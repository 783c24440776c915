use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{OfferStatus, OrderId, TaskId, TaskOffer};

/// Records a pending offer for each agent, provided the task is still Unassigned and its order is still On-going.
/// Agents that already have an offer for the task, in any state, are skipped. Returns the agents that were offered
/// the task by this call.
pub async fn insert_offers(
    task_id: TaskId,
    agent_ids: &[String],
    offered_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<String>, sqlx::Error> {
    let mut offered = Vec::with_capacity(agent_ids.len());
    for agent_id in agent_ids {
        let result = sqlx::query(
            r#"
            INSERT INTO task_offers (task_id, agent_id, status, offered_at, expires_at)
            SELECT $1, $2, 'Pending', $3, $4
            WHERE EXISTS (
                SELECT 1 FROM tasks JOIN orders ON orders.id = tasks.order_id
                WHERE tasks.id = $1 AND tasks.status = 'Unassigned'
                AND orders.status = 'On-going' AND orders.refund_claimed_at IS NULL
            )
            ON CONFLICT (task_id, agent_id) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(agent_id)
        .bind(offered_at)
        .bind(expires_at)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 1 {
            offered.push(agent_id.clone());
        }
    }
    debug!("🗃️ Task {task_id} offered to {} agents", offered.len());
    Ok(offered)
}

pub async fn fetch_offers(task_id: TaskId, conn: &mut SqliteConnection) -> Result<Vec<TaskOffer>, sqlx::Error> {
    let offers =
        sqlx::query_as("SELECT * FROM task_offers WHERE task_id = $1 ORDER BY id").bind(task_id).fetch_all(conn).await?;
    Ok(offers)
}

pub async fn fetch_offer(
    task_id: TaskId,
    agent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<TaskOffer>, sqlx::Error> {
    let offer = sqlx::query_as("SELECT * FROM task_offers WHERE task_id = $1 AND agent_id = $2")
        .bind(task_id)
        .bind(agent_id)
        .fetch_optional(conn)
        .await?;
    Ok(offer)
}

/// Moves the agent's offer from Pending to `status`. Returns false if the agent had no pending offer.
pub async fn resolve_offer(
    task_id: TaskId,
    agent_id: &str,
    status: OfferStatus,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE task_offers SET status = $3 WHERE task_id = $1 AND agent_id = $2 AND status = 'Pending'")
            .bind(task_id)
            .bind(agent_id)
            .bind(status)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() == 1)
}

/// Withdraws every pending offer for the task. Returns the number of offers withdrawn.
pub async fn withdraw_offers(task_id: TaskId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE task_offers SET status = 'Withdrawn' WHERE task_id = $1 AND status = 'Pending'")
        .bind(task_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Withdraws the pending offers for the order's task, if it has one.
pub async fn withdraw_offers_for_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE task_offers SET status = 'Withdrawn'
        WHERE status = 'Pending' AND task_id IN (SELECT id FROM tasks WHERE order_id = $1)
        "#,
    )
    .bind(order_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Expires every pending offer whose deadline has passed by `at` and returns the affected tasks, without duplicates.
pub async fn expire_offers(at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<TaskId>, sqlx::Error> {
    let mut task_ids: Vec<TaskId> = sqlx::query_scalar(
        "UPDATE task_offers SET status = 'Expired' WHERE status = 'Pending' AND expires_at <= $1 RETURNING task_id",
    )
    .bind(at)
    .fetch_all(conn)
    .await?;
    task_ids.sort();
    task_ids.dedup();
    Ok(task_ids)
}
