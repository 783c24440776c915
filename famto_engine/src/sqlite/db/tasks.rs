use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{NewTask, OrderId, Task, TaskId};

/// Creates the task for an order. If the order already has a task, nothing is written and the existing task is
/// returned. The flag is true if the task was created by this call.
pub async fn insert_task(
    task: NewTask,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(Task, bool), sqlx::Error> {
    let order_id = task.order_id.clone();
    let result = sqlx::query(
        r#"
        INSERT INTO tasks (order_id, delivery_mode, pickup, drop_off, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 'Unassigned', $5, $5)
        ON CONFLICT (order_id) DO NOTHING
        "#,
    )
    .bind(task.order_id)
    .bind(task.delivery_mode)
    .bind(Json(task.pickup))
    .bind(Json(task.drop_off))
    .bind(at)
    .execute(&mut *conn)
    .await?;
    let created = result.rows_affected() == 1;
    let task = fetch_task_for_order(&order_id, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
    if created {
        debug!("🗃️ Task {} created for order {order_id}", task.id);
    }
    Ok((task, created))
}

pub async fn fetch_task(id: TaskId, conn: &mut SqliteConnection) -> Result<Option<Task>, sqlx::Error> {
    let task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(task)
}

pub async fn fetch_task_for_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Task>, sqlx::Error> {
    let task =
        sqlx::query_as("SELECT * FROM tasks WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(task)
}

/// Hands an Unassigned task to `agent_id`, provided the agent holds a pending offer for it that has not lapsed by
/// `at`. This is the single conditional update that decides an accept race.
pub async fn assign_task(
    id: TaskId,
    agent_id: &str,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Task>, sqlx::Error> {
    let task = sqlx::query_as(
        r#"
        UPDATE tasks SET status = 'Assigned', agent_id = $2, updated_at = $3
        WHERE id = $1 AND status = 'Unassigned' AND agent_id IS NULL
        AND EXISTS (
            SELECT 1 FROM task_offers
            WHERE task_id = $1 AND agent_id = $2 AND status = 'Pending' AND expires_at > $3
        )
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(agent_id)
    .bind(at)
    .fetch_optional(conn)
    .await?;
    Ok(task)
}

/// Completes the Assigned task of an order. Returns `None` if the order has no Assigned task.
pub async fn complete_task(
    order_id: &OrderId,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Task>, sqlx::Error> {
    let task = sqlx::query_as(
        "UPDATE tasks SET status = 'Completed', updated_at = $2 WHERE order_id = $1 AND status = 'Assigned' RETURNING *",
    )
    .bind(order_id.as_str())
    .bind(at)
    .fetch_optional(conn)
    .await?;
    Ok(task)
}

/// Unassigned tasks of On-going orders, without any live offer at `at`.
pub async fn fetch_unclaimed_tasks(at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<Task>, sqlx::Error> {
    let tasks = sqlx::query_as(
        r#"
        SELECT tasks.* FROM tasks JOIN orders ON orders.id = tasks.order_id
        WHERE tasks.status = 'Unassigned' AND orders.status = 'On-going'
        AND NOT EXISTS (
            SELECT 1 FROM task_offers
            WHERE task_offers.task_id = tasks.id AND task_offers.status = 'Pending' AND task_offers.expires_at > $1
        )
        ORDER BY tasks.id
        "#,
    )
    .bind(at)
    .fetch_all(conn)
    .await?;
    Ok(tasks)
}
