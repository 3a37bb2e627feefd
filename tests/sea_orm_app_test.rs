use std::sync::Arc;
use std::time::Duration;

use orgauth::auth::AUTH_COOKIE;
use orgauth::database::sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use orgauth::database::{ensure_schema, seed_demo_data};
use orgauth::repository::SeaOrmUserRepository;
use orgauth::testing::{self, app_with_repository, test_hasher};
use orgauth::{NewUser, Role, UserRepository};
use serde_json::json;

/// Private in-memory SQLite database; one connection, since each
/// `:memory:` connection is its own database.
async fn sqlite() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.expect("sqlite connection");
    ensure_schema(&db).await.expect("schema");
    db
}

async fn repository() -> SeaOrmUserRepository {
    SeaOrmUserRepository::new(sqlite().await, test_hasher(), Duration::from_secs(2))
}

#[tokio::test]
async fn test_end_to_end_on_relational_store() {
    let repo = repository().await;
    let org = repo.create_organization("A").await.unwrap();
    repo.insert(NewUser::new("alice", "pw1", Role::Admin, &org.id))
        .await
        .unwrap();
    repo.insert(NewUser::member("bob", "pw2", &org.id))
        .await
        .unwrap();

    let repo = Arc::new(repo);
    let app = app_with_repository(repo.clone());
    let token = testing::login(app.clone(), "alice", "pw1").await;

    testing::post(app.clone(), "/add")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "carol", "password": "pw3"}))
        .execute()
        .await
        .assert_ok()
        .assert_json_path("data.user.role", json!("member"))
        .await;

    testing::get(app.clone(), "/users")
        .cookie(AUTH_COOKIE, &token)
        .execute()
        .await
        .assert_ok()
        .assert_json_path("data.users.0.username", json!("bob"))
        .await
        .assert_json_path("data.users.1.username", json!("carol"))
        .await;

    testing::delete(app, "/delete")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "bob"}))
        .execute()
        .await
        .assert_ok();
    assert!(repo.find_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_seeded_demo_users_can_sign_in() {
    let repo = repository().await;
    seed_demo_data(&repo).await.unwrap();

    let app = app_with_repository(Arc::new(repo));
    let token = testing::login(app.clone(), "User-1", "password").await;

    let body: serde_json::Value = testing::get(app, "/users")
        .cookie(AUTH_COOKIE, &token)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unreadable_stored_digest_is_internal() {
    let repo = repository().await;
    let org = repo.create_organization("A").await.unwrap();
    repo.insert(NewUser::new("alice", "pw1", Role::Admin, &org.id))
        .await
        .unwrap();
    repo.connection()
        .execute_unprepared("UPDATE users SET password_hash = 'garbage'")
        .await
        .unwrap();

    let app = app_with_repository(Arc::new(repo));
    testing::post(app, "/login")
        .json_body(&json!({"username": "alice", "password": "pw1"}))
        .execute()
        .await
        .assert_server_error()
        .assert_no_set_cookie()
        .assert_json_path("message", json!("internal server error"))
        .await
        .assert_json_path("error", json!("internal"))
        .await;
}
