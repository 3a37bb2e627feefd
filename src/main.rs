use std::sync::Arc;

use anyhow::Context;
use orgauth::auth::PasswordHasher;
use orgauth::database::{connect_with_retry, ensure_schema, seed_demo_data};
use orgauth::repository::SeaOrmUserRepository;
use orgauth::{App, AppState, ConfigBuilder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new()
        .from_env()
        .build()
        .context("invalid configuration")?;

    orgauth::init_tracing_with_config(&config);
    config.warn_on_fallbacks();

    let db = connect_with_retry(&config.database)
        .await
        .context("database unavailable")?;
    ensure_schema(&db).await.context("failed to create schema")?;

    let hasher = PasswordHasher::default();
    let repo = SeaOrmUserRepository::new(db, hasher.clone(), config.database.query_timeout());

    if config.database.seed {
        let created = seed_demo_data(&repo).await.context("failed to seed demo data")?;
        tracing::info!(created, "demo data seeded");
    }

    let state = AppState::new(Arc::new(repo), hasher, &config.auth);
    App::new(config, state).serve().await?;

    Ok(())
}
