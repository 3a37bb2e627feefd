use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use super::handlers;
use crate::app::AppState;
use crate::auth::require_auth;

/// All service routes, with the auth middleware on the protected ones.
///
/// | Route | Auth |
/// |---|---|
/// | `POST /login`, `POST /logout`, `GET /health` | none |
/// | `GET /users`, `POST /add`, `DELETE /delete` | token cookie |
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users", get(handlers::list_users))
        .route("/add", post(handlers::add_user))
        .route("/delete", delete(handlers::delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.issuer.clone(),
            require_auth,
        ));

    Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/health", get(handlers::health))
        .merge(protected)
        .with_state(state)
}
