//! Authentication: password hashing, identity tokens, cookie transport,
//! the login flow, and the middleware guarding protected routes.

pub mod cookie;
pub mod extractors;
pub mod flow;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use cookie::{AUTH_COOKIE, login_cookie, logout_cookie, token_from_cookie};
pub use extractors::AuthenticatedUser;
pub use flow::{AuthenticationFlow, Credentials, LoginOutcome};
pub use jwt::{AuthError, TokenClaims, TokenIssuer};
pub use middleware::require_auth;
pub use password::{PasswordConfig, PasswordError, PasswordHasher};
