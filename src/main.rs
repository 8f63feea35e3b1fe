use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod seed;
mod utils;

use config::Config;
use db::{init_db, run_migrations};

use crate::docs::ApiDoc;
use crate::utils::permission_cache;
use tracing::{info, warn};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Business Suite API"
}

/// Daily rolling file log; keep the guard alive for the whole run.
fn init_tracing(log_dir: &str) -> WorkerGuard {
    let file_appender = rolling::daily(log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .pretty()
        .init();

    guard
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    let _guard = init_tracing(&config.log_dir);

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;

    if config.run_migrations {
        run_migrations(&pool).await?;
    }
    if config.run_seeders {
        seed::run(&pool, &config).await.context("Seeding failed")?;
    }

    let pool_for_cache_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = permission_cache::warmup_permission_cache(&pool_for_cache_warmup).await {
            warn!(error = ?e, "Failed to warm up permission cache");
        }
    });

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            // auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
