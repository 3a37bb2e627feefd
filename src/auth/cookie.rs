//! Cookie transport for identity tokens.
//!
//! The token travels in an `HttpOnly`, `SameSite=Lax` cookie named
//! `Authorization`. Logout overwrites it with an empty, already-expired one.

use axum::http::{HeaderMap, header};
use cookie::{Cookie, SameSite, time::Duration as CookieDuration, time::OffsetDateTime};
use std::time::Duration;

use super::jwt::AuthError;

/// Name of the cookie carrying the identity token.
pub const AUTH_COOKIE: &str = "Authorization";

/// Cookie set on successful login.
pub fn login_cookie(token: impl Into<String>, ttl: Duration, secure: bool) -> Cookie<'static> {
    let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

    Cookie::build((AUTH_COOKIE, token.into()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::seconds(max_age))
        .build()
}

/// Empty cookie with a negative max-age that makes the browser drop the token.
pub fn logout_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::seconds(-1))
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Pull the token out of the request's `Cookie` headers.
///
/// A missing cookie and a cookie with an empty value are both `Missing`.
pub fn token_from_cookie(headers: &HeaderMap) -> Result<String, AuthError> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|cookie| cookie.ok())
        .find(|cookie| cookie.name() == AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::Missing)
}
