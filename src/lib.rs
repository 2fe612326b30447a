//! Restaurant POS engine: menu and order storage, GST billing math,
//! table-status derivation, and sales reporting over a local SQLite store.

pub mod billing;
pub mod commands;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod money;
pub mod reports;
pub mod tables;


pub use db::Database;
pub use errors::{PosError, Result};
