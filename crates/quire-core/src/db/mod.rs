//! Local `SQLite` persistence for Quire

mod connection;
mod migrations;
mod repository;
mod state_repository;

pub use connection::Database;
pub use repository::SqliteStore;
