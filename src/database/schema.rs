use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema};

use crate::error::{OrgAuthError, Result};
use crate::repository::entity::{organization, user};

/// Create the `organizations` and `users` tables if they do not exist.
///
/// Table definitions come from the SeaORM entities, so the unique
/// constraints and the `users.organization_id` foreign key follow them.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<()> {
    create_table(db, organization::Entity).await?;
    create_table(db, user::Entity).await?;
    tracing::debug!("database schema ensured");
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();

    db.execute(backend.build(&stmt)).await.map_err(|e| {
        OrgAuthError::internal(format!(
            "Failed to create table {}: {}",
            entity.table_name(),
            e
        ))
    })?;
    Ok(())
}
