//! orgauth - organization-scoped account service
//!
//! Users belong to exactly one organization and carry a role. They sign in
//! with a username and password and receive a signed token in an
//! `Authorization` cookie. Admins manage the members of their own
//! organization; nobody can see or touch another organization's users.
//!
//! # Features
//!
//! - **HTTP**: Axum routes for login, logout and member management
//! - **Authentication**: HS256 JWTs in an `HttpOnly` cookie, Argon2id passwords
//! - **Database**: SeaORM store for Postgres, with an in-memory store for tests
//! - **Testing**: Alba-style HTTP scenarios and a SQLite test database
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use orgauth::{App, AppState, ConfigBuilder};
//! use orgauth::auth::PasswordHasher;
//! use orgauth::repository::InMemoryUserRepository;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     orgauth::init_tracing_with_config(&config);
//!
//!     let hasher = PasswordHasher::default();
//!     let repo = InMemoryUserRepository::with_fixtures(hasher.clone())?;
//!     let state = AppState::new(Arc::new(repo), hasher, &config.auth);
//!
//!     App::new(config, state).serve().await?;
//!     Ok(())
//! }
//! ```

mod app;
pub mod auth;
mod config;
pub mod cors;
pub mod database;
mod error;
pub mod http;
pub mod members;
mod middleware;
pub mod models;
pub mod repository;
pub mod testing;
pub mod utils;

// Re-exports for public API
pub use app::{App, AppState};
pub use config::{AuthConfig, Config, ConfigBuilder, DEFAULT_JWT_SECRET, LoggingConfig, ServerConfig};
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use error::{OrgAuthError, Result};
pub use http::{ApiResponse, JsonResponse};
pub use middleware::MakeRequestUuid;
pub use models::{NewUser, Organization, Role, User};
pub use repository::{RepositoryError, UserRepository};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "orgauth=debug")
/// - `ORGAUTH_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("ORGAUTH_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing from a loaded [`Config`]. `RUST_LOG` still wins when set.
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    install_subscriber(env_filter, config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    // try_init: a second call (tests, embedding) keeps the first subscriber.
    let result = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}
