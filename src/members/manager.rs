use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::auth::AuthenticatedUser;
use crate::error::{OrgAuthError, Result};
use crate::models::{NewUser, User};
use crate::repository::UserRepository;

const NOT_AUTHORIZED: &str = "not authorized";

/// List, add and delete users within the caller's organization.
///
/// # Example
///
/// ```rust,ignore
/// use orgauth::members::MemberManager;
///
/// let manager = MemberManager::new(repo.clone());
/// let peers = manager.list_other_users(&identity).await?;
/// let carol = manager.add_member(&identity, "carol", "pw3").await?;
/// manager.delete_member(&identity, "carol").await?;
/// ```
#[derive(Clone)]
pub struct MemberManager {
    repo: Arc<dyn UserRepository>,
}

impl MemberManager {
    #[must_use]
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Load the caller's current record.
    ///
    /// A subject that no longer exists, or whose token names a different
    /// organization than the stored record, is unauthorized.
    async fn resolve(&self, identity: &AuthenticatedUser) -> Result<User> {
        let user = self
            .repo
            .find_by_id(&identity.user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %identity.user_id, "token subject no longer exists");
                OrgAuthError::unauthorized(NOT_AUTHORIZED)
            })?;

        if let Some(org_id) = &identity.org_id {
            if *org_id != user.organization_id {
                warn!(user_id = %user.id, "token organization does not match stored user");
                return Err(OrgAuthError::unauthorized(NOT_AUTHORIZED));
            }
        }

        Ok(user)
    }

    async fn resolve_admin(&self, identity: &AuthenticatedUser) -> Result<User> {
        let caller = self.resolve(identity).await?;
        if !caller.role.can_manage_members() {
            warn!(user_id = %caller.id, role = %caller.role, "member management denied");
            return Err(OrgAuthError::unauthorized(NOT_AUTHORIZED));
        }
        Ok(caller)
    }

    /// Everyone in the caller's organization except the caller.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn list_other_users(&self, identity: &AuthenticatedUser) -> Result<Vec<User>> {
        let caller = self.resolve(identity).await?;
        let users = self.repo.list_other_members(&caller).await?;
        debug!(count = users.len(), "listed organization members");
        Ok(users)
    }

    /// Create a `member` in the caller's organization. Admin only.
    #[instrument(skip(self, identity, password), fields(user_id = %identity.user_id))]
    pub async fn add_member(
        &self,
        identity: &AuthenticatedUser,
        username: &str,
        password: &str,
    ) -> Result<User> {
        let admin = self.resolve_admin(identity).await?;

        if username.is_empty() || password.is_empty() {
            return Err(OrgAuthError::bad_request(
                "username and password are required",
            ));
        }

        let user = self
            .repo
            .insert(NewUser::member(username, password, &admin.organization_id))
            .await?;

        info!(
            new_user_id = %user.id,
            org_id = %user.organization_id,
            added_by = %admin.id,
            "member added"
        );
        Ok(user)
    }

    /// Delete a user from the caller's organization. Admin only.
    ///
    /// A target that does not exist and a target in another organization get
    /// the same `Unauthorized` answer.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn delete_member(
        &self,
        identity: &AuthenticatedUser,
        username: &str,
    ) -> Result<()> {
        let admin = self.resolve_admin(identity).await?;

        if username.is_empty() {
            return Err(OrgAuthError::bad_request("username is required"));
        }

        let target = match self.repo.find_by_username(username).await? {
            Some(target) if target.shares_organization_with(&admin) => target,
            _ => {
                warn!(target = %username, "delete target absent or outside caller's organization");
                return Err(OrgAuthError::unauthorized(NOT_AUTHORIZED));
            }
        };

        self.repo.delete(&target).await?;

        info!(
            deleted_user_id = %target.id,
            org_id = %target.organization_id,
            deleted_by = %admin.id,
            "member deleted"
        );
        Ok(())
    }
}
