//! SeaORM-backed user and organization storage.
//!
//! # Database Schema
//!
//! Tables are created from the entities below by
//! [`ensure_schema`](crate::database::ensure_schema):
//!
//! ```sql
//! CREATE TABLE organizations (
//!     id VARCHAR PRIMARY KEY,
//!     name VARCHAR UNIQUE NOT NULL,
//!     created_at BIGINT NOT NULL,
//!     updated_at BIGINT NOT NULL
//! );
//!
//! CREATE TABLE users (
//!     id VARCHAR PRIMARY KEY,
//!     username VARCHAR UNIQUE NOT NULL,
//!     password_hash VARCHAR NOT NULL,
//!     role VARCHAR NOT NULL,
//!     organization_id VARCHAR NOT NULL REFERENCES organizations(id),
//!     created_at BIGINT NOT NULL,
//!     updated_at BIGINT NOT NULL
//! );
//! ```

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use std::future::Future;
use std::time::Duration;

use super::{RepositoryError, UserRepository};
use crate::auth::PasswordHasher;
use crate::models::{NewUser, Organization, Role, User, now_unix};

// =============================================================================
// SeaORM Entities
// =============================================================================

pub(crate) mod entity {
    pub mod organization {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "organizations")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            #[sea_orm(unique)]
            pub name: String,
            pub created_at: i64,
            pub updated_at: i64,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #[sea_orm(has_many = "super::user::Entity")]
            Users,
        }

        impl Related<super::user::Entity> for Entity {
            fn to() -> RelationDef {
                Relation::Users.def()
            }
        }

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod user {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "users")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            #[sea_orm(unique)]
            pub username: String,
            pub password_hash: String,
            pub role: String,
            pub organization_id: String,
            pub created_at: i64,
            pub updated_at: i64,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #[sea_orm(
                belongs_to = "super::organization::Entity",
                from = "Column::OrganizationId",
                to = "super::organization::Column::Id"
            )]
            Organization,
        }

        impl Related<super::organization::Entity> for Entity {
            fn to() -> RelationDef {
                Relation::Organization.def()
            }
        }

        impl ActiveModelBehavior for ActiveModel {}
    }
}

use entity::{organization, user};

// =============================================================================
// Helper Functions
// =============================================================================

/// Convert i64 to u64 safely (negative values become 0).
#[inline]
fn i64_to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Convert u64 to i64 safely (values > i64::MAX become i64::MAX).
#[inline]
fn u64_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn db_error(err: DbErr) -> RepositoryError {
    RepositoryError::Database(err.to_string())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn model_to_user(model: user::Model) -> Result<User, RepositoryError> {
    let role: Role = model.role.parse().map_err(|e| {
        RepositoryError::Database(format!("user {} has {}", model.id, e))
    })?;

    Ok(User {
        id: model.id,
        username: model.username,
        password_hash: model.password_hash,
        role,
        organization_id: model.organization_id,
        created_at: i64_to_u64(model.created_at),
        updated_at: i64_to_u64(model.updated_at),
    })
}

fn model_to_organization(model: organization::Model) -> Organization {
    Organization {
        id: model.id,
        name: model.name,
        created_at: i64_to_u64(model.created_at),
        updated_at: i64_to_u64(model.updated_at),
    }
}

// =============================================================================
// SeaOrmUserRepository
// =============================================================================

/// Relational [`UserRepository`].
///
/// Every query is bounded by `query_timeout`; an expired query surfaces as
/// [`RepositoryError::Timeout`] and the in-flight future is dropped.
#[derive(Clone)]
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
    hasher: PasswordHasher,
    query_timeout: Duration,
}

impl SeaOrmUserRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection, hasher: PasswordHasher, query_timeout: Duration) -> Self {
        Self {
            db,
            hasher,
            query_timeout,
        }
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Await `query` within the timeout, leaving the driver result untouched.
    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        query: F,
    ) -> Result<Result<T, DbErr>, RepositoryError>
    where
        F: Future<Output = Result<T, DbErr>> + Send,
    {
        tokio::time::timeout(self.query_timeout, query)
            .await
            .map_err(|_| {
                tracing::warn!(
                    operation,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "storage query timed out"
                );
                RepositoryError::Timeout
            })
    }

    async fn run<T, F>(&self, operation: &'static str, query: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, DbErr>> + Send,
    {
        self.bounded(operation, query).await?.map_err(db_error)
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        tracing::debug!(username = %username, "finding user by username");

        self.run(
            "find_user_by_username",
            user::Entity::find()
                .filter(user::Column::Username.eq(username))
                .one(&self.db),
        )
        .await?
        .map(model_to_user)
        .transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        tracing::debug!(user_id = %id, "finding user by id");

        self.run("find_user_by_id", user::Entity::find_by_id(id).one(&self.db))
            .await?
            .map(model_to_user)
            .transpose()
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        tracing::debug!(
            username = %new_user.username,
            org_id = %new_user.organization_id,
            "inserting user"
        );

        if self
            .find_organization(&new_user.organization_id)
            .await?
            .is_none()
        {
            return Err(RepositoryError::UnknownOrganization(
                new_user.organization_id,
            ));
        }

        if self.find_by_username(&new_user.username).await?.is_some() {
            return Err(RepositoryError::UsernameTaken(new_user.username));
        }

        let now = now_unix();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            password_hash: self.hasher.hash(&new_user.password)?,
            username: new_user.username,
            role: new_user.role,
            organization_id: new_user.organization_id,
            created_at: now,
            updated_at: now,
        };

        let model = user::ActiveModel {
            id: Set(user.id.clone()),
            username: Set(user.username.clone()),
            password_hash: Set(user.password_hash.clone()),
            role: Set(user.role.as_str().to_string()),
            organization_id: Set(user.organization_id.clone()),
            created_at: Set(u64_to_i64(user.created_at)),
            updated_at: Set(u64_to_i64(user.updated_at)),
        };

        // The pre-check above can race with a concurrent insert; the unique
        // index is the final word.
        match self
            .bounded(
                "insert_user",
                user::Entity::insert(model).exec_without_returning(&self.db),
            )
            .await?
        {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::UsernameTaken(user.username)),
            Err(e) => Err(db_error(e)),
        }
    }

    async fn delete(&self, target: &User) -> Result<(), RepositoryError> {
        tracing::debug!(user_id = %target.id, "deleting user");

        if target.is_admin() {
            return Err(RepositoryError::AdminProtected);
        }

        // The role filter keeps the refusal atomic even if the caller's copy
        // of the user is stale.
        let result = self
            .run(
                "delete_user",
                user::Entity::delete_many()
                    .filter(user::Column::Id.eq(target.id.as_str()))
                    .filter(user::Column::Role.ne(Role::Admin.as_str()))
                    .exec(&self.db),
            )
            .await?;

        if result.rows_affected == 0 {
            return match self.find_by_id(&target.id).await? {
                Some(stored) if stored.is_admin() => Err(RepositoryError::AdminProtected),
                Some(_) => Err(RepositoryError::Database(
                    "delete affected no rows".to_string(),
                )),
                None => Err(RepositoryError::NotFound),
            };
        }

        Ok(())
    }

    async fn list_other_members(&self, member: &User) -> Result<Vec<User>, RepositoryError> {
        tracing::debug!(
            user_id = %member.id,
            org_id = %member.organization_id,
            "listing other members"
        );

        self.run(
            "list_other_members",
            user::Entity::find()
                .filter(user::Column::OrganizationId.eq(member.organization_id.as_str()))
                .filter(user::Column::Id.ne(member.id.as_str()))
                .order_by_asc(user::Column::Username)
                .all(&self.db),
        )
        .await?
        .into_iter()
        .map(model_to_user)
        .collect()
    }

    async fn create_organization(&self, name: &str) -> Result<Organization, RepositoryError> {
        tracing::debug!(name = %name, "creating organization");

        if self.find_organization_by_name(name).await?.is_some() {
            return Err(RepositoryError::OrganizationNameTaken(name.to_string()));
        }

        let now = now_unix();
        let org = Organization {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        let model = organization::ActiveModel {
            id: Set(org.id.clone()),
            name: Set(org.name.clone()),
            created_at: Set(u64_to_i64(org.created_at)),
            updated_at: Set(u64_to_i64(org.updated_at)),
        };

        match self
            .bounded(
                "create_organization",
                organization::Entity::insert(model).exec_without_returning(&self.db),
            )
            .await?
        {
            Ok(_) => Ok(org),
            Err(e) if is_unique_violation(&e) => {
                Err(RepositoryError::OrganizationNameTaken(org.name))
            }
            Err(e) => Err(db_error(e)),
        }
    }

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, RepositoryError> {
        tracing::debug!(org_id = %id, "finding organization by id");

        Ok(self
            .run(
                "find_organization",
                organization::Entity::find_by_id(id).one(&self.db),
            )
            .await?
            .map(model_to_organization))
    }

    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, RepositoryError> {
        tracing::debug!(name = %name, "finding organization by name");

        Ok(self
            .run(
                "find_organization_by_name",
                organization::Entity::find()
                    .filter(organization::Column::Name.eq(name))
                    .one(&self.db),
            )
            .await?
            .map(model_to_organization))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordConfig;
    use crate::testing::TestDb;

    async fn repo() -> (TestDb, SeaOrmUserRepository) {
        let db = TestDb::new().await.unwrap();
        let repo = SeaOrmUserRepository::new(
            db.connection.clone(),
            PasswordHasher::new(PasswordConfig::fast()),
            Duration::from_secs(2),
        );
        (db, repo)
    }

    #[test]
    fn test_i64_to_u64() {
        assert_eq!(i64_to_u64(100), 100);
        assert_eq!(i64_to_u64(-1), 0);
        assert_eq!(i64_to_u64(i64::MAX), i64::MAX as u64);
    }

    #[test]
    fn test_u64_to_i64() {
        assert_eq!(u64_to_i64(100), 100);
        assert_eq!(u64_to_i64(u64::MAX), i64::MAX);
    }

    #[test]
    fn test_unknown_role_is_storage_error() {
        let model = user::Model {
            id: "u1".to_string(),
            username: "x".to_string(),
            password_hash: "h".to_string(),
            role: "superuser".to_string(),
            organization_id: "o".to_string(),
            created_at: 0,
            updated_at: 0,
        };
        assert!(matches!(
            model_to_user(model),
            Err(RepositoryError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let (_db, repo) = repo().await;
        let org = repo.create_organization("A").await.unwrap();

        let alice = repo
            .insert(NewUser::new("alice", "pw1", Role::Admin, &org.id))
            .await
            .unwrap();
        assert_ne!(alice.password_hash, "pw1");

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found, alice);
        assert_eq!(repo.find_by_id(&alice.id).await.unwrap().unwrap(), alice);
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (_db, repo) = repo().await;
        let a = repo.create_organization("A").await.unwrap();
        let b = repo.create_organization("B").await.unwrap();

        repo.insert(NewUser::member("bob", "pw2", &a.id)).await.unwrap();
        let result = repo.insert(NewUser::member("bob", "other", &b.id)).await;
        assert!(matches!(result, Err(RepositoryError::UsernameTaken(_))));
    }

    #[tokio::test]
    async fn test_unknown_organization_rejected() {
        let (_db, repo) = repo().await;
        let result = repo.insert(NewUser::member("bob", "pw2", "missing")).await;
        assert!(matches!(result, Err(RepositoryError::UnknownOrganization(_))));
    }

    #[tokio::test]
    async fn test_duplicate_organization_name_rejected() {
        let (_db, repo) = repo().await;
        repo.create_organization("A").await.unwrap();
        assert!(matches!(
            repo.create_organization("A").await,
            Err(RepositoryError::OrganizationNameTaken(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_refuses_admin_even_with_stale_role() {
        let (_db, repo) = repo().await;
        let org = repo.create_organization("A").await.unwrap();
        let alice = repo
            .insert(NewUser::new("alice", "pw1", Role::Admin, &org.id))
            .await
            .unwrap();

        assert!(matches!(
            repo.delete(&alice).await,
            Err(RepositoryError::AdminProtected)
        ));

        let mut stale = alice.clone();
        stale.role = Role::Member;
        assert!(matches!(
            repo.delete(&stale).await,
            Err(RepositoryError::AdminProtected)
        ));
        assert!(repo.find_by_id(&alice.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_member() {
        let (_db, repo) = repo().await;
        let org = repo.create_organization("A").await.unwrap();
        let bob = repo.insert(NewUser::member("bob", "pw2", &org.id)).await.unwrap();

        repo.delete(&bob).await.unwrap();
        assert!(repo.find_by_id(&bob.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&bob).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_other_members() {
        let (_db, repo) = repo().await;
        let a = repo.create_organization("A").await.unwrap();
        let b = repo.create_organization("B").await.unwrap();

        let alice = repo
            .insert(NewUser::new("alice", "pw1", Role::Admin, &a.id))
            .await
            .unwrap();
        repo.insert(NewUser::member("carol", "pw3", &a.id)).await.unwrap();
        repo.insert(NewUser::member("bob", "pw2", &a.id)).await.unwrap();
        repo.insert(NewUser::member("erin", "pw5", &b.id)).await.unwrap();

        let names: Vec<String> = repo
            .list_other_members(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn test_stalled_query_times_out() {
        use sea_orm::TransactionTrait;

        let db = TestDb::new().await.unwrap();
        let repo = SeaOrmUserRepository::new(
            db.connection.clone(),
            PasswordHasher::new(PasswordConfig::fast()),
            Duration::from_millis(50),
        );

        // The open transaction holds the pool's only connection.
        let _txn = db.connection.begin().await.unwrap();

        let started = std::time::Instant::now();
        let result = repo.find_by_username("alice").await;
        assert!(matches!(result, Err(RepositoryError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
