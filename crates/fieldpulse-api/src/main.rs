mod config;
mod db;
mod error;
mod migrations;
mod routes;
mod tables;

use std::sync::Arc;

use config::AppConfig;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fieldpulse_api=info".parse().expect("valid directive")),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!("Starting fieldpulse-api with config: {:?}", config);

    let conn = db::open(&config.db_path).await?;
    let state = AppState {
        config: config.clone(),
        conn,
    };
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("fieldpulse-api listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
