use crate::models::{NewUser, Role};
use crate::repository::{RepositoryError, UserRepository};

/// Password shared by every demo account.
pub const DEMO_PASSWORD: &str = "password";

/// `(organization, [(username, role)])` for the demo data set.
const DEMO_ORGANIZATIONS: [(&str, [(&str, Role); 4]); 2] = [
    (
        "ORG-1",
        [
            ("User-1", Role::Admin),
            ("User-2", Role::Admin),
            ("User-3", Role::Member),
            ("User-4", Role::Member),
        ],
    ),
    (
        "ORG-2",
        [
            ("User-5", Role::Admin),
            ("User-6", Role::Admin),
            ("User-7", Role::Member),
            ("User-8", Role::Member),
        ],
    ),
];

/// Provision the demo organizations and their users.
///
/// Organizations and users that already exist are left alone, so running this
/// on every start is safe and completes a run that failed partway. Returns the
/// number of users created.
pub async fn seed_demo_data(repo: &dyn UserRepository) -> Result<usize, RepositoryError> {
    let mut created = 0;

    for (org_name, users) in DEMO_ORGANIZATIONS {
        let org = match repo.find_organization_by_name(org_name).await? {
            Some(org) => org,
            None => {
                let org = repo.create_organization(org_name).await?;
                tracing::info!(organization = org_name, org_id = %org.id, "seeded demo organization");
                org
            }
        };

        for (username, role) in users {
            if repo.find_by_username(username).await?.is_some() {
                tracing::debug!(username, "demo user exists, skipping");
                continue;
            }
            repo.insert(NewUser::new(username, DEMO_PASSWORD, role, &org.id))
                .await?;
            created += 1;
        }
    }

    Ok(created)
}
