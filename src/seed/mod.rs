pub mod demo;
pub mod permissions;
pub mod reference;

use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::{info, warn};

use crate::auth::password::hash_password;
use crate::config::Config;
use crate::model::role::Role;

/// Creates the bootstrap administrator when credentials are configured
/// and the username is still free.
async fn seed_admin(pool: &MySqlPool, config: &Config) -> Result<()> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set, skipping admin bootstrap");
        return Ok(());
    };
    let username = username.trim().to_lowercase();

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)",
    )
    .bind(&username)
    .fetch_one(pool)
    .await?;
    if exists {
        return Ok(());
    }

    let hashed = hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;
    sqlx::query("INSERT INTO users (username, password, role_id) VALUES (?, ?, ?)")
        .bind(&username)
        .bind(hashed)
        .bind(Role::Admin.id())
        .execute(pool)
        .await
        .context("Failed to create admin user")?;

    info!(username = %username, "Admin user created");
    Ok(())
}

/// Runs every idempotent seeder; safe on each startup.
pub async fn run(pool: &MySqlPool, config: &Config) -> Result<()> {
    permissions::seed_roles(pool).await?;
    permissions::seed_permissions(pool).await?;
    permissions::seed_role_grants(pool).await?;
    reference::seed(pool).await?;
    seed_admin(pool, config).await?;

    if config.seed_demo_data {
        demo::seed(pool).await?;
    }
    Ok(())
}
