use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, header},
    response::{AppendHeaders, IntoResponse},
};
use cookie::Cookie;
use serde::{Deserialize, Serialize};

use super::response::{ApiResponse, JsonResponse};
use crate::app::AppState;
use crate::auth::{AuthenticatedUser, Credentials};
use crate::error::{OrgAuthError, Result};
use crate::models::User;

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UsersData {
    pub users: Vec<User>,
}

/// Body of `DELETE /delete`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteRequest {
    pub username: String,
}

fn set_cookie(cookie: &Cookie<'static>) -> Result<AppendHeaders<[(header::HeaderName, HeaderValue); 1]>> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| OrgAuthError::internal(format!("invalid Set-Cookie value: {}", e)))?;
    Ok(AppendHeaders([(header::SET_COOKIE, value)]))
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(credentials) = payload?;
    let outcome = state.flow.login(&credentials).await?;

    Ok((
        set_cookie(&outcome.cookie)?,
        ApiResponse::success("User signed in", UserData { user: outcome.user }),
    ))
}

/// `POST /logout`
pub async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok((
        set_cookie(&state.flow.logout())?,
        ApiResponse::message("Logged out successfully"),
    ))
}

/// `GET /users`
pub async fn list_users(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
) -> JsonResponse<UsersData> {
    let users = state.members.list_other_users(&identity).await?;
    Ok(ApiResponse::success(
        "Successfully retrieved other users in organization",
        UsersData { users },
    ))
}

/// `POST /add`
pub async fn add_user(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> JsonResponse<UserData> {
    // Role is checked before the body is looked at.
    let credentials = payload.map(|Json(c)| c).unwrap_or_default();
    let user = state
        .members
        .add_member(&identity, &credentials.username, &credentials.password)
        .await?;

    Ok(ApiResponse::success(
        "Successfully added new user",
        UserData { user },
    ))
}

/// `DELETE /delete`
pub async fn delete_user(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
    payload: std::result::Result<Json<DeleteRequest>, JsonRejection>,
) -> JsonResponse<()> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    state
        .members
        .delete_member(&identity, &request.username)
        .await?;

    Ok(ApiResponse::message(
        "Successfully deleted user from organization",
    ))
}

/// `GET /health`
pub async fn health() -> ApiResponse<()> {
    ApiResponse::message("ok")
}
