mod auth;
mod config;
mod db;
mod errors;
mod interviews;
mod jobs;
mod models;
mod profile;
mod resumes;
mod routes;
mod state;
mod storage;
mod store;
mod validation;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::password::{PasswordHasher, StandardPasswordPolicy};
use crate::auth::tokens::TokenIssuer;
use crate::config::{Config, StorageSettings};
use crate::db::{create_pool, run_migrations};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{BlobStore, LocalBlobStore, S3BlobStore};
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ApplyTrack API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    if config.run_migrations {
        run_migrations(&pool).await?;
    }

    // Initialize blob storage
    let blobs: Arc<dyn BlobStore> = match &config.storage {
        StorageSettings::Local { media_root } => {
            info!("Storing uploads under {}", media_root.display());
            Arc::new(LocalBlobStore::new(media_root.clone()))
        }
        StorageSettings::S3(settings) => {
            info!("Storing uploads in S3 bucket {}", settings.bucket);
            Arc::new(S3BlobStore::from_settings(settings).await)
        }
    };

    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
        blobs,
        tokens: TokenIssuer::new(
            &config.jwt_secret,
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        ),
        passwords: PasswordHasher::new(config.bcrypt_cost),
        password_policy: Arc::new(StandardPasswordPolicy::new(config.password_min_length)),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
