use recipe_cascade::{config::AppConfig, db, services::quality};
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const PAGE_SIZE: u32 = 200;
const PASS_INTERVAL_SECS: u64 = 6 * 60 * 60; // 6 hours

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting recipe cache maintenance");

    let run_once = std::env::args().any(|arg| arg == "--once");

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize database
    tracing::info!("Opening SQLite recipe cache");
    let db_pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to open recipe cache database");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    loop {
        let start = std::time::Instant::now();
        match quality::rescore_cache(&db_pool, PAGE_SIZE).await {
            Ok(summary) => {
                tracing::info!(
                    scanned = summary.scanned,
                    updated = summary.updated,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Quality re-scoring pass complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Quality re-scoring pass failed, will retry");
            }
        }

        if run_once {
            break;
        }
        sleep(Duration::from_secs(PASS_INTERVAL_SECS)).await;
    }
}
