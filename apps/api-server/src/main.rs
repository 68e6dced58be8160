//! # Bazaar API Server
//!
//! The marketplace identity and session core behind an Actix-web HTTP
//! server: token issuance and verification, role-based route authorization,
//! and the authoritative cart/wishlist lists.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod state;

use bazaar_core::ports::RateLimiter;
use bazaar_infra::rate_limit::KeyedRateLimiter;

use config::AppConfig;
use middleware::auth::AuthMiddleware;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Bazaar API server on {}:{}",
        config.host,
        config.port
    );

    // Build application state
    let state = AppState::new(&config).await;
    let limiter: Arc<dyn RateLimiter> = Arc::new(KeyedRateLimiter::new(config.rate_limit.clone()));

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(state.clone()))
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes(limiter.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,api_server=debug,bazaar_infra=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}
