//! # SQLite database methods
//!
//! Low-level SQLite interactions for the cafe engine.
//!
//! Everything here is a plain function that accepts a `&mut SqliteConnection`. Callers take a connection from the
//! pool, or open a transaction when several statements must succeed or fail together, and pass it straight through.
//! State-machine guards live one level up, in [`super::SqliteDatabase`].
use std::{env, str::FromStr};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod menus;
pub mod order_items;
pub mod orders;
pub mod profiles;
pub mod tables;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/cafe.db";

pub fn db_url() -> String {
    let result = env::var("CAFE_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ CAFE_DATABASE_URL is not set. Using the default.");
        DEFAULT_DATABASE_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool, creating the database file if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
