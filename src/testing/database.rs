//! SQLite-backed test database.
//!
//! # Example
//!
//! ```rust,ignore
//! use orgauth::testing::TestDb;
//!
//! #[tokio::test]
//! async fn test_with_database() {
//!     let test_db = TestDb::new().await.expect("Failed to create test database");
//!     // Use test_db.connection in your tests
//! }
//! ```

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::database::ensure_schema;

/// A private in-memory SQLite database with the orgauth schema applied.
///
/// The pool holds exactly one connection: every SQLite `:memory:`
/// connection is its own database.
pub struct TestDb {
    pub connection: DatabaseConnection,
}

impl TestDb {
    pub async fn new() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        let connection = Database::connect(opt).await?;
        ensure_schema(&connection)
            .await
            .map_err(|e| DbErr::Custom(e.to_string()))?;

        Ok(Self { connection })
    }
}
