mod api;
mod app;
mod auth;
mod config;
mod db;
mod domain;
mod error;
mod logging;
mod routes;
mod scheduling;
mod services;
mod store;

use anyhow::Result;
use std::sync::Arc;

use scheduling::orchestrator::EngineConfig;
use scheduling::AdminBookingOrchestrator;
use services::ScoringClient;
use store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting Pawdesk backend"
    );

    // Create database pool and apply migrations
    let pool = db::create_pool(&settings).await?;
    sqlx::migrate!().run(&pool).await?;

    // Create scoring service client
    let scoring_client = ScoringClient::new(
        &settings.scoring_service_url,
        &settings.scoring_service_token,
        settings.scoring_service_timeout_seconds,
    )?;

    // Check scoring service health without blocking startup; the local
    // fallback scorer covers an outage
    tokio::spawn({
        let scoring_client = scoring_client.clone();
        async move {
            match scoring_client.health_check().await {
                Ok(()) => tracing::info!("Scoring service is healthy"),
                Err(e) => tracing::warn!(
                    error = %e,
                    "Scoring service health check failed - local fallback scoring will apply"
                ),
            }
        }
    });

    // Create JWKS cache for JWT verification
    let jwks_cache = auth::JwksCache::new(
        settings.identity_jwks_url.clone(),
        settings.identity_jwt_issuer.clone(),
        settings.identity_jwt_audience.clone(),
        settings.jwks_cache_ttl_seconds,
    );

    if let Err(e) = jwks_cache.warm_cache().await {
        tracing::warn!(error = %e, "Failed to warm JWKS cache - will fetch on first request");
    }

    // Wire the scheduling engine against the Postgres store
    let store = PgStore::new(pool.clone());
    let pg = Arc::new(store.clone());
    let orchestrator = AdminBookingOrchestrator::new(
        pg.clone(),
        pg.clone(),
        pg,
        Arc::new(scoring_client.clone()),
        EngineConfig::from_settings(&settings),
    );

    // Create application state
    let state = app::AppState::new(
        pool,
        settings.clone(),
        jwks_cache,
        scoring_client,
        store,
        orchestrator,
    );

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
