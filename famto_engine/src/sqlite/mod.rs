//! SQLite database module for the Famto engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
