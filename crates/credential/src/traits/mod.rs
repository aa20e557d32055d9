//! Traits implemented by database plugins

mod database;

pub use database::Database;
