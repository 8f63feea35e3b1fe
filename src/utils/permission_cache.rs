use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// role id => permission strings granted to that role
pub static ROLE_PERMISSIONS: Lazy<Cache<u8, Arc<Vec<String>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(64)
        .time_to_live(Duration::from_secs(600)) // grants change rarely
        .build()
});

async fn load_role(pool: &MySqlPool, role_id: u8) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT p.name
        FROM role_has_permissions rhp
        JOIN permissions p ON p.id = rhp.permission_id
        WHERE rhp.role_id = ?
        ORDER BY p.name
        "#,
    )
    .bind(role_id)
    .fetch_all(pool)
    .await
}

/// Permissions for a role, served from cache when possible
pub async fn permissions_for_role(
    pool: &MySqlPool,
    role_id: u8,
) -> Result<Arc<Vec<String>>, sqlx::Error> {
    if let Some(cached) = ROLE_PERMISSIONS.get(&role_id).await {
        return Ok(cached);
    }

    let permissions = Arc::new(load_role(pool, role_id).await?);
    ROLE_PERMISSIONS.insert(role_id, permissions.clone()).await;
    Ok(permissions)
}

/// Drop a role's cached grants after they change
pub async fn invalidate(role_id: u8) {
    ROLE_PERMISSIONS.invalidate(&role_id).await;
}

/// Load every role's grants into the cache in one pass
pub async fn warmup_permission_cache(pool: &MySqlPool) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (u8, String)>(
        r#"
        SELECT rhp.role_id, p.name
        FROM role_has_permissions rhp
        JOIN permissions p ON p.id = rhp.permission_id
        ORDER BY rhp.role_id, p.name
        "#,
    )
    .fetch(pool);

    let mut grouped: HashMap<u8, Vec<String>> = HashMap::new();
    while let Some(row) = stream.next().await {
        let (role_id, name) = row?;
        grouped.entry(role_id).or_default().push(name);
    }

    let roles = grouped.len();
    for (role_id, permissions) in grouped {
        ROLE_PERMISSIONS.insert(role_id, Arc::new(permissions)).await;
    }

    log::info!("Permission cache warmup complete: {} roles", roles);
    Ok(())
}
