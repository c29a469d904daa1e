use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use recipe_cascade::app_state::AppState;
use recipe_cascade::config::AppConfig;
use recipe_cascade::db;
use recipe_cascade::routes;
use recipe_cascade::services::{
    aggregator::ProviderAggregator,
    cascade::{Resolver, ResolverSettings},
    generator::Chef,
    knowledge::Knowledge,
    local_cache::LocalCache,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing recipe-cascade server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!(
        "cascade_resolutions_total",
        "Resolved requests, labelled by the cascade level that produced the recipe"
    );
    metrics::describe_counter!(
        "cascade_unresolved_total",
        "Requests that exhausted every cascade level"
    );
    metrics::describe_histogram!(
        "cascade_resolve_seconds",
        "Time to resolve one recipe request"
    );
    metrics::describe_counter!(
        "provider_failures_total",
        "Provider calls that failed or timed out"
    );
    metrics::describe_counter!(
        "cache_write_backs_total",
        "Recipes written back to the local cache"
    );

    // Load culinary knowledge (atlas, ingredient catalog, dish-type indicators)
    let knowledge = Knowledge::load(&config).expect("Failed to load culinary knowledge files");

    // Initialize database connection pool
    tracing::info!("Opening SQLite recipe cache");
    let db_pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to open recipe cache database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let cache = LocalCache::new(
        db_pool.clone(),
        knowledge.catalog.clone(),
        config.local_candidate_limit,
    );

    let aggregator = ProviderAggregator::from_config(
        &config,
        knowledge.catalog.clone(),
        knowledge.dish_types.clone(),
    )
    .expect("Failed to initialize recipe providers");

    let chef = Chef::from_config(&config, knowledge.catalog.clone())
        .expect("Failed to initialize recipe generator");

    let resolver = Resolver::new(
        cache,
        aggregator,
        knowledge.atlas.clone(),
        knowledge.catalog.clone(),
        chef,
        ResolverSettings::from_config(&config),
    );

    // Create shared application state
    let state = AppState::new(db_pool, resolver);

    let app = routes::api_router(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(64 * 1024)); // 64 KB limit

    tracing::info!("Starting recipe-cascade on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
