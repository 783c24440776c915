use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Agent, NewAgent};

pub async fn insert_agent(agent: NewAgent, at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Agent, sqlx::Error> {
    let agent: Agent = sqlx::query_as(
        r#"
        INSERT INTO agents (id, name, status, approval, latitude, longitude, tag, salary_structure_id, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(agent.id)
    .bind(agent.name)
    .bind(agent.status)
    .bind(agent.approval)
    .bind(agent.location.map(|p| p.latitude))
    .bind(agent.location.map(|p| p.longitude))
    .bind(agent.tag)
    .bind(agent.salary_structure_id)
    .bind(at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Agent {} registered as {:?}", agent.id, agent.status);
    Ok(agent)
}

pub async fn fetch_agent(id: &str, conn: &mut SqliteConnection) -> Result<Option<Agent>, sqlx::Error> {
    let agent = sqlx::query_as("SELECT * FROM agents WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(agent)
}

/// Agents that are approved and free to take a delivery, in id order.
pub async fn fetch_available_agents(conn: &mut SqliteConnection) -> Result<Vec<Agent>, sqlx::Error> {
    let agents = sqlx::query_as("SELECT * FROM agents WHERE status = 'Free' AND approval = 'Approved' ORDER BY id")
        .fetch_all(conn)
        .await?;
    Ok(agents)
}

/// Marks a Free, approved agent as Busy. Returns false if the agent was not available.
pub async fn claim_agent(id: &str, at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE agents SET status = 'Busy', updated_at = $2 WHERE id = $1 AND status = 'Free' AND approval = 'Approved'",
    )
    .bind(id)
    .bind(at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Marks a Busy agent as Free again. Returns false if the agent was not Busy.
pub async fn release_agent(id: &str, at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE agents SET status = 'Free', updated_at = $2 WHERE id = $1 AND status = 'Busy'")
        .bind(id)
        .bind(at)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}
