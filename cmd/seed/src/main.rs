//! Creates the configured administrator in the SQLite database, applying
//! migrations first. Safe to run repeatedly.

use anyhow::Context;
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth_adapters::{ensure_admin, AdminSeed};
use configs::Settings;
use domains::AgeGroup;
use storage_adapters::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .init();

    if settings.database.is_memory() {
        anyhow::bail!("seeding needs a persistent database; database.url is \"memory\"");
    }
    let password = settings
        .admin
        .password
        .as_ref()
        .context("set admin.password (GATEPOST__ADMIN__PASSWORD) to seed the admin user")?;
    let age_group: AgeGroup = settings.admin.age_group.parse().context("admin.age_group")?;

    let store = SqliteStore::connect(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| format!("opening database {}", settings.database.url))?;

    let created = ensure_admin(
        &store,
        AdminSeed {
            username: settings.admin.username.clone(),
            email: settings.admin.email.clone(),
            password: password.expose_secret().to_string(),
            age_group,
        },
    )
    .await?;

    match created {
        Some(user) => info!(user = %user.username, id = %user.id, "seeded admin"),
        None => info!(user = %settings.admin.username, "nothing to seed"),
    }
    Ok(())
}
