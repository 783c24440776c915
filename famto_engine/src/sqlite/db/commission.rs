use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{CommissionLog, CommissionRuleRecord, OrderId},
    traits::CommissionEntry,
};

pub async fn fetch_rule(merchant_id: &str, conn: &mut SqliteConnection) -> Result<Option<CommissionRuleRecord>, sqlx::Error> {
    let rule = sqlx::query_as("SELECT * FROM commission_rules WHERE merchant_id = $1")
        .bind(merchant_id)
        .fetch_optional(conn)
        .await?;
    Ok(rule)
}

/// Sets the merchant's commission rule, replacing any previous one.
pub async fn upsert_rule(rule: &CommissionRuleRecord, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO commission_rules (merchant_id, commission_type, commission_value) VALUES ($1, $2, $3)
        ON CONFLICT (merchant_id) DO UPDATE SET
            commission_type = excluded.commission_type,
            commission_value = excluded.commission_value
        "#,
    )
    .bind(&rule.merchant_id)
    .bind(rule.commission_type)
    .bind(rule.commission_value)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_log(
    order_id: &OrderId,
    entry: &CommissionEntry,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<CommissionLog, sqlx::Error> {
    let log: CommissionLog = sqlx::query_as(
        r#"
        INSERT INTO commission_logs
            (order_id, merchant_id, total_amount, merchant_earnings, famto_earnings, payment_mode, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, 'Unpaid', $7)
        RETURNING *
        "#,
    )
    .bind(order_id.as_str())
    .bind(&entry.merchant_id)
    .bind(entry.total_amount)
    .bind(entry.split.merchant_earnings)
    .bind(entry.split.famto_earnings)
    .bind(entry.payment_mode)
    .bind(at)
    .fetch_one(conn)
    .await?;
    debug!(
        "🗃️ Commission logged for order {order_id}. Merchant: {}, Famto: {}",
        log.merchant_earnings, log.famto_earnings
    );
    Ok(log)
}

pub async fn fetch_logs(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<CommissionLog>, sqlx::Error> {
    let logs = sqlx::query_as("SELECT * FROM commission_logs WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(logs)
}
