//! Ready-made apps and helpers for HTTP-level tests.

use axum::Router;
use std::sync::Arc;

use crate::app::{App, AppState};
use crate::auth::{AUTH_COOKIE, PasswordConfig, PasswordHasher};
use crate::config::Config;
use crate::repository::{InMemoryUserRepository, UserRepository};

/// Hasher with cheap Argon2 parameters.
pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(PasswordConfig::fast())
}

/// In-memory store holding the `A`/`B` organization fixtures.
pub fn fixture_repository() -> InMemoryUserRepository {
    InMemoryUserRepository::with_fixtures(test_hasher()).expect("fixture hashing failed")
}

/// Fully layered router over a fresh fixture store.
pub fn fixture_app() -> Router {
    app_with_repository(Arc::new(fixture_repository()))
}

/// Fully layered router over any repository, with default config.
pub fn app_with_repository(repo: Arc<dyn UserRepository>) -> Router {
    let config = Config::default();
    let state = AppState::new(repo, test_hasher(), &config.auth);
    App::new(config, state).router()
}

/// Log in through `POST /login` and return the token from the cookie.
///
/// Panics if the login is rejected.
pub async fn login(app: Router, username: &str, password: &str) -> String {
    let response = super::post(app, "/login")
        .json_body(&serde_json::json!({ "username": username, "password": password }))
        .execute()
        .await
        .assert_ok();

    response
        .set_cookie(AUTH_COOKIE)
        .unwrap_or_else(|| panic!("login for '{}' did not set a cookie", username))
        .value()
        .to_string()
}

/// Generated values for tests that need unique data
pub mod fake {
    use uuid::Uuid;

    /// Generate a fake username
    pub fn username() -> String {
        format!("user_{}", &Uuid::new_v4().simple().to_string()[..8])
    }

    /// Generate a fake password
    pub fn password() -> String {
        format!("pw-{}", Uuid::new_v4().simple())
    }
}
