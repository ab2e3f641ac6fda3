use anyhow::{Context, Result};
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use activity_board::config::ServerConfig;
use activity_board::database::ActivityStore;
use activity_board::web;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let store = ActivityStore::seeded();
    info!(
        activities = store.list().await.len(),
        static_dir = %config.static_dir.display(),
        "activity board seeded"
    );

    let app = web::build_router(store, &config.static_dir);

    // Bind, falling back to the next port once
    let addr = config.addr()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback = config.fallback_addr()?;
            warn!(%addr, %fallback, error = %e, "bind failed, trying fallback port");
            tokio::net::TcpListener::bind(fallback)
                .await
                .with_context(|| format!("cannot bind {} or {}", addr, fallback))?
        }
    };

    let bound_addr = listener.local_addr()?;
    info!("board running on http://{}{}", bound_addr, web::INDEX_PATH);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
