use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Customer, CustomerTransaction, Money, MoneyChannel, OrderId, TransactionType};

pub async fn insert_customer(
    id: &str,
    name: &str,
    wallet_balance: Money,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Customer, sqlx::Error> {
    let customer = sqlx::query_as(
        r#"
        INSERT INTO customers (id, name, wallet_balance, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(wallet_balance)
    .bind(at)
    .fetch_one(conn)
    .await?;
    Ok(customer)
}

pub async fn fetch_customer(id: &str, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(customer)
}

/// Adds a non-negative `amount` to the customer's wallet and returns the new balance.
///
/// Returns `None`, without changing anything, if the customer does not exist or the new balance would not fit in
/// [`Money`].
pub async fn credit_wallet(
    id: &str,
    amount: Money,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Money>, sqlx::Error> {
    let ceiling = i64::MAX.saturating_sub(amount.value());
    let balance = sqlx::query_scalar(
        r#"
        UPDATE customers SET wallet_balance = wallet_balance + $2, updated_at = $3
        WHERE id = $1 AND wallet_balance <= $4
        RETURNING wallet_balance
        "#,
    )
    .bind(id)
    .bind(amount)
    .bind(at)
    .bind(ceiling)
    .fetch_optional(conn)
    .await?;
    if let Some(b) = &balance {
        debug!("🗃️ Wallet of customer {id} credited with {amount}. Balance is now {b}");
    }
    Ok(balance)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_transaction(
    customer_id: &str,
    order_id: &OrderId,
    transaction_type: TransactionType,
    amount: Money,
    channel: MoneyChannel,
    reference: Option<&str>,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<CustomerTransaction, sqlx::Error> {
    let tx = sqlx::query_as(
        r#"
        INSERT INTO customer_transactions (customer_id, order_id, transaction_type, amount, channel, reference, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(customer_id)
    .bind(order_id.as_str())
    .bind(transaction_type)
    .bind(amount)
    .bind(channel)
    .bind(reference)
    .bind(at)
    .fetch_one(conn)
    .await?;
    Ok(tx)
}

pub async fn fetch_transactions(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<CustomerTransaction>, sqlx::Error> {
    let txs = sqlx::query_as("SELECT * FROM customer_transactions WHERE customer_id = $1 ORDER BY id")
        .bind(customer_id)
        .fetch_all(conn)
        .await?;
    Ok(txs)
}
