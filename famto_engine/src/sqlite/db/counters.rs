use sqlx::SqliteConnection;

/// Increments and returns the sequence number for `period`, starting at 1.
///
/// This is a write, so when it is the first statement of a transaction, that transaction holds the write lock from
/// the start and concurrent callers can never be handed the same number.
pub async fn next_in_period(period: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let seq = sqlx::query_scalar(
        r#"
        INSERT INTO period_counters (period, seq) VALUES ($1, 1)
        ON CONFLICT (period) DO UPDATE SET seq = seq + 1
        RETURNING seq
        "#,
    )
    .bind(period)
    .fetch_one(conn)
    .await?;
    Ok(seq)
}
