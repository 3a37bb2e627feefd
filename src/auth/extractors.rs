use axum::{extract::FromRequestParts, http::request::Parts};
use std::future::Future;

use crate::error::OrgAuthError;

/// Identity established by [`require_auth`](super::require_auth) for the
/// current request.
///
/// Use it as a handler argument on routes behind the middleware:
///
/// ```rust,ignore
/// async fn list_users(user: AuthenticatedUser) -> JsonResponse<UsersData> {
///     // user.user_id is the token subject
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub org_id: Option<String>,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = OrgAuthError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let user = parts.extensions.get::<AuthenticatedUser>().cloned();

        async move { user.ok_or_else(|| OrgAuthError::unauthorized("not authorized")) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_reads_identity_from_extensions() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(AuthenticatedUser {
            user_id: "user-1".to_string(),
            org_id: Some("org-a".to_string()),
        });

        let user = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(user.user_id, "user-1");
    }

    #[tokio::test]
    async fn test_without_middleware_is_unauthorized() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let result = AuthenticatedUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(OrgAuthError::Unauthorized(_))));
    }
}
