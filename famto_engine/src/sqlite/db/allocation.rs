use sqlx::SqliteConnection;

use crate::db_types::AutoAllocation;

pub async fn fetch_policy(conn: &mut SqliteConnection) -> Result<Option<AutoAllocation>, sqlx::Error> {
    let policy = sqlx::query_as(
        "SELECT allocation_type, priority_type, max_radius_km, expire_time_secs, is_active FROM auto_allocation WHERE \
         id = 1",
    )
    .fetch_optional(conn)
    .await?;
    Ok(policy)
}

pub async fn upsert_policy(policy: &AutoAllocation, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO auto_allocation (id, allocation_type, priority_type, max_radius_km, expire_time_secs, is_active)
        VALUES (1, $1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE SET
            allocation_type = excluded.allocation_type,
            priority_type = excluded.priority_type,
            max_radius_km = excluded.max_radius_km,
            expire_time_secs = excluded.expire_time_secs,
            is_active = excluded.is_active
        "#,
    )
    .bind(policy.allocation_type)
    .bind(policy.priority_type)
    .bind(policy.max_radius_km)
    .bind(policy.expire_time_secs)
    .bind(policy.is_active)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_pricing_rule(id: &str, rule_name: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO agent_pricing_rules (id, rule_name) VALUES ($1, $2)")
        .bind(id)
        .bind(rule_name)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_pricing_rule_id(rule_name: &str, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let id = sqlx::query_scalar("SELECT id FROM agent_pricing_rules WHERE rule_name = $1 ORDER BY id LIMIT 1")
        .bind(rule_name)
        .fetch_optional(conn)
        .await?;
    Ok(id)
}
