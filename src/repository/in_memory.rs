//! In-memory repository with deterministic fixtures.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{RepositoryError, UserRepository};
use crate::auth::PasswordHasher;
use crate::models::{NewUser, Organization, Role, User, now_unix};

/// Fixed ids and credentials loaded by [`InMemoryUserRepository::with_fixtures`].
pub mod fixtures {
    pub const ORG_A_ID: &str = "org-a";
    pub const ORG_A_NAME: &str = "A";
    pub const ORG_B_ID: &str = "org-b";
    pub const ORG_B_NAME: &str = "B";

    /// `(id, username, password, is_admin, organization id)`
    pub const USERS: [(&str, &str, &str, bool, &str); 4] = [
        ("user-alice", "alice", "pw1", true, ORG_A_ID),
        ("user-bob", "bob", "pw2", false, ORG_A_ID),
        ("user-dave", "dave", "pw4", true, ORG_B_ID),
        ("user-erin", "erin", "pw5", false, ORG_B_ID),
    ];
}

struct Inner {
    hasher: PasswordHasher,
    users: RwLock<HashMap<String, User>>,
    usernames: RwLock<HashMap<String, String>>, // username -> id
    organizations: RwLock<HashMap<String, Organization>>,
}

/// In-memory [`UserRepository`].
///
/// Cloning shares the same underlying data.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    inner: Arc<Inner>,
}

impl InMemoryUserRepository {
    /// Empty repository.
    pub fn new(hasher: PasswordHasher) -> Self {
        Self::from_parts(hasher, HashMap::new(), HashMap::new())
    }

    /// Repository preloaded with two organizations:
    ///
    /// - `A`: `alice`/`pw1` (admin), `bob`/`pw2` (member)
    /// - `B`: `dave`/`pw4` (admin), `erin`/`pw5` (member)
    pub fn with_fixtures(hasher: PasswordHasher) -> Result<Self, RepositoryError> {
        let now = now_unix();

        let organizations = [
            (fixtures::ORG_A_ID, fixtures::ORG_A_NAME),
            (fixtures::ORG_B_ID, fixtures::ORG_B_NAME),
        ]
        .into_iter()
        .map(|(id, name)| {
            (
                id.to_string(),
                Organization {
                    id: id.to_string(),
                    name: name.to_string(),
                    created_at: now,
                    updated_at: now,
                },
            )
        })
        .collect();

        let mut users = HashMap::new();
        for (id, username, password, is_admin, org_id) in fixtures::USERS {
            let role = if is_admin { Role::Admin } else { Role::Member };
            users.insert(
                id.to_string(),
                User {
                    id: id.to_string(),
                    username: username.to_string(),
                    password_hash: hasher.hash(password)?,
                    role,
                    organization_id: org_id.to_string(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }

        Ok(Self::from_parts(hasher, organizations, users))
    }

    fn from_parts(
        hasher: PasswordHasher,
        organizations: HashMap<String, Organization>,
        users: HashMap<String, User>,
    ) -> Self {
        let usernames = users
            .values()
            .map(|u| (u.username.clone(), u.id.clone()))
            .collect();

        Self {
            inner: Arc::new(Inner {
                hasher,
                users: RwLock::new(users),
                usernames: RwLock::new(usernames),
                organizations: RwLock::new(organizations),
            }),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let usernames = self.inner.usernames.read().await;
        let Some(id) = usernames.get(username) else {
            return Ok(None);
        };
        Ok(self.inner.users.read().await.get(id).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.inner.users.read().await.get(id).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        if !self
            .inner
            .organizations
            .read()
            .await
            .contains_key(&new_user.organization_id)
        {
            return Err(RepositoryError::UnknownOrganization(new_user.organization_id));
        }

        let password_hash = self.inner.hasher.hash(&new_user.password)?;

        // Lock order: usernames, then users.
        let mut usernames = self.inner.usernames.write().await;
        if usernames.contains_key(&new_user.username) {
            return Err(RepositoryError::UsernameTaken(new_user.username));
        }

        let now = now_unix();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: new_user.username,
            password_hash,
            role: new_user.role,
            organization_id: new_user.organization_id,
            created_at: now,
            updated_at: now,
        };

        usernames.insert(user.username.clone(), user.id.clone());
        self.inner
            .users
            .write()
            .await
            .insert(user.id.clone(), user.clone());

        Ok(user)
    }

    async fn delete(&self, user: &User) -> Result<(), RepositoryError> {
        let mut usernames = self.inner.usernames.write().await;
        let mut users = self.inner.users.write().await;

        let stored = users.get(&user.id).ok_or(RepositoryError::NotFound)?;
        if stored.role == Role::Admin || user.role == Role::Admin {
            return Err(RepositoryError::AdminProtected);
        }

        if let Some(removed) = users.remove(&user.id) {
            usernames.remove(&removed.username);
        }
        Ok(())
    }

    async fn list_other_members(&self, user: &User) -> Result<Vec<User>, RepositoryError> {
        let mut members: Vec<User> = self
            .inner
            .users
            .read()
            .await
            .values()
            .filter(|u| u.organization_id == user.organization_id && u.id != user.id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(members)
    }

    async fn create_organization(&self, name: &str) -> Result<Organization, RepositoryError> {
        let mut organizations = self.inner.organizations.write().await;
        if organizations.values().any(|o| o.name == name) {
            return Err(RepositoryError::OrganizationNameTaken(name.to_string()));
        }

        let now = now_unix();
        let organization = Organization {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        organizations.insert(organization.id.clone(), organization.clone());
        Ok(organization)
    }

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, RepositoryError> {
        Ok(self.inner.organizations.read().await.get(id).cloned())
    }

    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, RepositoryError> {
        Ok(self
            .inner
            .organizations
            .read()
            .await
            .values()
            .find(|o| o.name == name)
            .cloned())
    }
}
