use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studyboard::api;
use studyboard::config::Config;
use studyboard::db;
use studyboard::services::DiskStorage;
use studyboard::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "studyboard=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::connect(&config.database_url, config.max_connections).await?;
    db::migrate(&pool).await?;

    let storage = Arc::new(DiskStorage::new(
        config.upload_dir.clone(),
        config.upload_url_prefix.clone(),
    ));
    tokio::fs::create_dir_all(storage.root()).await?;

    let state = AppState {
        db: pool.clone(),
        storage,
        session_ttl: Duration::hours(config.session_ttl_hours),
    };

    let app = api::app(state, &config.upload_url_prefix, &config.upload_dir);

    let addr = SocketAddr::from((config.host, config.port));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
