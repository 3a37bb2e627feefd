use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::cookie::token_from_cookie;
use super::extractors::AuthenticatedUser;
use super::jwt::TokenIssuer;
use crate::error::OrgAuthError;

/// Middleware that requires a valid token cookie for all routes it wraps.
///
/// On success the [`AuthenticatedUser`] is stored in request extensions for
/// downstream handlers. Any token problem stops the request with 401.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, middleware, routing::get};
/// use orgauth::auth::{TokenIssuer, require_auth};
///
/// let protected = Router::new()
///     .route("/users", get(list_users))
///     .layer(middleware::from_fn_with_state(issuer.clone(), require_auth));
/// ```
pub async fn require_auth(
    State(issuer): State<TokenIssuer>,
    mut request: Request,
    next: Next,
) -> Result<Response, OrgAuthError> {
    let token = token_from_cookie(request.headers()).inspect_err(|_| {
        tracing::debug!(path = %request.uri().path(), "request without token cookie");
    })?;

    let claims = issuer.validate(&token).inspect_err(|e| {
        tracing::warn!(path = %request.uri().path(), reason = %e, "token rejected");
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.subject,
        org_id: claims.org_id,
    });

    Ok(next.run(request).await)
}
