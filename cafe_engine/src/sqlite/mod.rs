//! SQLite backend for the cafe engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
