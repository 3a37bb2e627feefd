//! Testing utilities for orgauth
//!
//! - Alba-style HTTP endpoint testing without running a server
//! - Fixture-backed apps
//! - A SQLite in-memory database (`sqlite` feature, or the crate's own tests)
//!
//! # Example
//!
//! ```rust,ignore
//! use orgauth::testing;
//!
//! #[tokio::test]
//! async fn test_admin_lists_members() {
//!     let app = testing::fixture_app();
//!     let token = testing::login(app.clone(), "alice", "pw1").await;
//!
//!     let body: serde_json::Value = testing::get(app, "/users")
//!         .cookie(orgauth::auth::AUTH_COOKIE, &token)
//!         .execute()
//!         .await
//!         .assert_ok()
//!         .json()
//!         .await;
//!     assert_eq!(body["data"]["users"][0]["username"], "bob");
//! }
//! ```

#[cfg(any(test, feature = "sqlite"))]
mod database;
mod fixtures;
mod scenario;

#[cfg(any(test, feature = "sqlite"))]
pub use database::TestDb;
pub use fixtures::{app_with_repository, fake, fixture_app, fixture_repository, login, test_hasher};
pub use scenario::{Scenario, ScenarioAssert, delete, get, post};
