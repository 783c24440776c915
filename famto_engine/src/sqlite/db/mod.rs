//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Functions that change shared state (order status, task assignment, agent status) are conditional updates. They
//! report whether the row was in the expected state by returning `false` (or `None`) rather than an error.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod agents;
pub mod allocation;
pub mod commission;
pub mod counters;
pub mod customers;
pub mod managers;
pub mod merchants;
pub mod offers;
pub mod orders;
pub mod scheduled_orders;
pub mod tasks;

const SQLITE_DB_URL: &str = "sqlite://data/famto_store.db";

/// How long a writer waits for the database lock before giving up. Competing conditional updates (accept races)
/// queue up behind each other for at most this long.
const BUSY_TIMEOUT: Duration = Duration::from_secs(15);

pub fn db_url() -> String {
    let result = env::var("FAMTO_DATABASE_URL").unwrap_or_else(|_| {
        info!("FAMTO_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
