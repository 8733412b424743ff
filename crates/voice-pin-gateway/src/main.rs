//! Voice PIN Gateway - Entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use voice_pin_gateway::{
    api::{create_router, AppState},
    config::Config,
    janitor::{spawn_janitor, SessionJanitor},
    CallFlow, MerchantClient, SessionRegistry,
};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Voice PIN Gateway");

    let registry = SessionRegistry::new()
        .with_duplicate_phone_rejection(config.registry.reject_duplicate_phone);

    // Initialize merchant client
    let merchant = match MerchantClient::new(config.verifier.timeout) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create merchant client: {}", e);
            std::process::exit(1);
        }
    };

    let flow = CallFlow::new(registry.clone(), Arc::new(merchant))
        .with_capture(config.capture.clone())
        .with_settings(config.flow.clone())
        .with_prompts(config.prompts.clone());

    // Evict verified and abandoned sessions in the background
    spawn_janitor(SessionJanitor::new(registry, config.janitor.clone()));

    let state = AppState::new(flow, config.auth.api_key.clone());
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
