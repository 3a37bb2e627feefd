//! Storage bootstrap: connection with retry, schema creation, demo seed data.

pub mod config;
pub mod connection;
pub mod schema;
pub mod seed;

pub use config::{DatabaseConfig, redact_database_url};
pub use connection::connect_with_retry;
pub use schema::ensure_schema;
pub use seed::seed_demo_data;
pub use sea_orm;
