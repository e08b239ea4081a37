mod config;

use std::sync::Arc;

use anyhow::Context;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use blaxgram_api::{AppState, AppStateInner};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "blaxgram=debug,blaxgram_api=debug,blaxgram_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = blaxgram_db::Database::open(&config.db_path)?;

    let token_ttl = chrono::TimeDelta::try_days(config.token_ttl_days)
        .context("token lifetime out of range")?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        token_ttl,
    });

    let mut app = blaxgram_api::router(state);
    if let Some(dir) = &config.static_dir {
        info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    let app = app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Blaxgram server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
