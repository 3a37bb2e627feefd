use std::sync::Arc;
use std::time::Duration;

use orgauth::DEFAULT_JWT_SECRET;
use orgauth::UserRepository;
use orgauth::auth::{AUTH_COOKIE, TokenIssuer};
use orgauth::testing::{self, app_with_repository, fixture_app, fixture_repository};
use serde_json::json;

fn usernames(body: &serde_json::Value) -> Vec<String> {
    body["data"]["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_admin_adds_member_and_lists_organization() {
    let repo = Arc::new(fixture_repository());
    let app = app_with_repository(repo.clone());
    let token = testing::login(app.clone(), "alice", "pw1").await;

    let added: serde_json::Value = testing::post(app.clone(), "/add")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "carol", "password": "pw3"}))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(added["data"]["user"]["username"], "carol");
    assert_eq!(added["data"]["user"]["role"], "member");
    assert_eq!(added["data"]["user"]["organization_id"], "org-a");

    let listed: serde_json::Value = testing::get(app.clone(), "/users")
        .cookie(AUTH_COOKIE, &token)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(usernames(&listed), vec!["bob", "carol"]);

    // carol can sign in with the password she was given
    testing::login(app, "carol", "pw3").await;
    let stored = repo.find_by_username("carol").await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "pw3");
}

#[tokio::test]
async fn test_member_lists_own_organization_only() {
    let app = fixture_app();
    let token = testing::login(app.clone(), "erin", "pw5").await;

    let listed: serde_json::Value = testing::get(app, "/users")
        .cookie(AUTH_COOKIE, &token)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(usernames(&listed), vec!["dave"]);
}

#[tokio::test]
async fn test_member_cannot_add_or_delete() {
    let repo = Arc::new(fixture_repository());
    let app = app_with_repository(repo.clone());
    let token = testing::login(app.clone(), "bob", "pw2").await;

    testing::post(app.clone(), "/add")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "mallory", "password": "pw"}))
        .execute()
        .await
        .assert_unauthorized();
    assert!(repo.find_by_username("mallory").await.unwrap().is_none());

    testing::delete(app, "/delete")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "alice"}))
        .execute()
        .await
        .assert_unauthorized();
    assert!(repo.find_by_username("alice").await.unwrap().is_some());
}

#[tokio::test]
async fn test_role_check_precedes_body_validation() {
    let app = fixture_app();
    let token = testing::login(app.clone(), "bob", "pw2").await;

    testing::post(app, "/add")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({}))
        .execute()
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_admin_missing_fields_is_bad_request() {
    let app = fixture_app();
    let token = testing::login(app.clone(), "alice", "pw1").await;

    testing::post(app.clone(), "/add")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "carol"}))
        .execute()
        .await
        .assert_bad_request();

    testing::delete(app, "/delete")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({}))
        .execute()
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn test_cross_organization_delete_is_unauthorized() {
    let repo = Arc::new(fixture_repository());
    let app = app_with_repository(repo.clone());
    let token = testing::login(app.clone(), "alice", "pw1").await;

    let cross_org = testing::delete(app.clone(), "/delete")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "erin"}))
        .execute()
        .await
        .assert_unauthorized()
        .body_string()
        .await;
    assert!(repo.find_by_username("erin").await.unwrap().is_some());

    // Indistinguishable from a username that does not exist anywhere.
    let absent = testing::delete(app, "/delete")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "nobody"}))
        .execute()
        .await
        .assert_unauthorized()
        .body_string()
        .await;
    assert_eq!(cross_org, absent);
}

#[tokio::test]
async fn test_admin_deletes_member_but_not_admin() {
    let repo = Arc::new(fixture_repository());
    let app = app_with_repository(repo.clone());
    let token = testing::login(app.clone(), "dave", "pw4").await;

    testing::delete(app.clone(), "/delete")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "erin"}))
        .execute()
        .await
        .assert_ok();
    assert!(repo.find_by_username("erin").await.unwrap().is_none());

    testing::delete(app, "/delete")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "dave"}))
        .execute()
        .await
        .assert_bad_request();
    assert!(repo.find_by_username("dave").await.unwrap().is_some());
}

#[tokio::test]
async fn test_duplicate_username_is_internal() {
    let app = fixture_app();
    let token = testing::login(app.clone(), "alice", "pw1").await;

    testing::post(app, "/add")
        .cookie(AUTH_COOKIE, &token)
        .json_body(&json!({"username": "erin", "password": "pw"}))
        .execute()
        .await
        .assert_server_error()
        .assert_json_path("message", json!("internal server error"))
        .await;
}

#[tokio::test]
async fn test_token_organization_must_match_stored_user() {
    let token = TokenIssuer::new(DEFAULT_JWT_SECRET)
        .issue("user-alice", Some("org-b"), Duration::from_secs(60))
        .unwrap();

    testing::get(fixture_app(), "/users")
        .cookie(AUTH_COOKIE, &token)
        .execute()
        .await
        .assert_unauthorized();
}
