//! Storage-agnostic persistence for users and organizations.
//!
//! [`UserRepository`] is the only way the rest of the crate touches storage.
//! Two implementations satisfy it with identical error semantics:
//!
//! - [`SeaOrmUserRepository`]: relational store (Postgres in production,
//!   SQLite in tests) with a per-query timeout.
//! - [`InMemoryUserRepository`]: deterministic fixtures for tests and demos.
//!
//! Both hash plaintext passwords on insert and both refuse to delete admins,
//! independently of any role check done by the caller.

mod in_memory;
mod sea_orm_store;

pub use in_memory::{InMemoryUserRepository, fixtures};
pub use sea_orm_store::SeaOrmUserRepository;
pub(crate) use sea_orm_store::entity;

use async_trait::async_trait;

use crate::auth::PasswordError;
use crate::error::OrgAuthError;
use crate::models::{NewUser, Organization, User};

/// Storage failures and storage-level policy violations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("admin users cannot be deleted")]
    AdminProtected,

    #[error("record not found")]
    NotFound,

    #[error("organization '{0}' does not exist")]
    UnknownOrganization(String),

    #[error("organization name '{0}' is already taken")]
    OrganizationNameTaken(String),

    #[error("storage operation timed out")]
    Timeout,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<PasswordError> for RepositoryError {
    fn from(err: PasswordError) -> Self {
        RepositoryError::Hashing(err.to_string())
    }
}

impl From<RepositoryError> for OrgAuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::AdminProtected => {
                OrgAuthError::bad_request("admin users cannot be deleted")
            }
            other => OrgAuthError::internal(other.to_string()),
        }
    }
}

/// Persistence capability set for users and organizations.
///
/// Lookups return `Ok(None)` when nothing matches; `Err` is reserved for
/// storage failures.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    /// Persist a new user under a freshly generated id.
    ///
    /// The plaintext password is hashed before it is stored. Fails with
    /// `UsernameTaken` on a duplicate username and `UnknownOrganization`
    /// when the organization does not exist.
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Remove a user. Admins are refused with `AdminProtected`.
    async fn delete(&self, user: &User) -> Result<(), RepositoryError>;

    /// Every user in `user`'s organization except `user`, ordered by username.
    async fn list_other_members(&self, user: &User) -> Result<Vec<User>, RepositoryError>;

    /// Provision an organization with a fresh id and a unique name.
    async fn create_organization(&self, name: &str) -> Result<Organization, RepositoryError>;

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, RepositoryError>;

    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, RepositoryError>;
}
