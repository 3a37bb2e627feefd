//! Login and logout.
//!
//! A login attempt moves through: credentials present, user resolved,
//! password checked, token issued, cookie attached. The first unmet step
//! ends the attempt.

use cookie::Cookie;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::cookie::{login_cookie, logout_cookie};
use super::jwt::TokenIssuer;
use super::password::PasswordHasher;
use crate::error::{OrgAuthError, Result};
use crate::models::User;
use crate::repository::UserRepository;

/// Username/password pair submitted to `POST /login` and `POST /add`.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful login: the user, the raw token, and the cookie carrying it.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
    pub cookie: Cookie<'static>,
}

/// Orchestrates credential checks, token issuance and cookie transport.
#[derive(Clone)]
pub struct AuthenticationFlow {
    repo: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    token_ttl: Duration,
    secure_cookie: bool,
}

impl AuthenticationFlow {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        issuer: TokenIssuer,
        token_ttl: Duration,
        secure_cookie: bool,
    ) -> Self {
        Self {
            repo,
            hasher,
            issuer,
            token_ttl,
            secure_cookie,
        }
    }

    /// Authenticate a username/password pair.
    ///
    /// Unknown usernames and wrong passwords produce the same
    /// `InvalidCredentials` error, and both pay for one password hash.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(OrgAuthError::bad_request(
                "username and password are required",
            ));
        }

        let user = match self.repo.find_by_username(&credentials.username).await? {
            Some(user) => user,
            None => {
                self.hasher.burn(&credentials.password);
                warn!("login rejected: unknown username");
                return Err(OrgAuthError::invalid_credentials());
            }
        };

        let matched = self
            .hasher
            .verify(&credentials.password, &user.password_hash)
            .map_err(|e| OrgAuthError::internal(e.to_string()))?;
        if !matched {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(OrgAuthError::invalid_credentials());
        }

        let token = self.issuer.issue(
            &user.id,
            Some(user.organization_id.as_str()),
            self.token_ttl,
        )?;
        let cookie = login_cookie(token.clone(), self.token_ttl, self.secure_cookie);

        info!(user_id = %user.id, org_id = %user.organization_id, "user logged in");
        Ok(LoginOutcome {
            user,
            token,
            cookie,
        })
    }

    /// Cookie that clears the token on the client. Always succeeds.
    pub fn logout(&self) -> Cookie<'static> {
        logout_cookie(self.secure_cookie)
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}
