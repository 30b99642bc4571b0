//! SQLite backend for the vending sync engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
