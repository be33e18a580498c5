//! Karaoke room server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin karaoke-server -- --tokens tokens.json --catalog catalog.json
//! KARAOKE_PORT=3000 KARAOKE_EVICTION_GRACE_MS=30000 cargo run --bin karaoke-server
//! ```

use std::sync::Arc;

use clap::Parser;
use karaoke_server::{
    bootstrap::{RoomSettings, build_server},
    config::ServerConfig,
};
use karaoke_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    let identity_resolver = match config.load_tokens() {
        Ok(tokens) => {
            tracing::info!("Loaded {} identity tokens", tokens.len());
            Arc::new(tokens)
        }
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let catalog = match config.load_catalog() {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let settings = RoomSettings {
        eviction_grace: config.eviction_grace(),
        claim_requires_admin: config.claim_requires_admin,
    };
    tracing::info!(
        "Room settings: eviction grace {:?}, claim requires admin: {}",
        settings.eviction_grace,
        settings.claim_requires_admin
    );

    let server = build_server(settings, identity_resolver, catalog, Arc::new(SystemClock));
    if let Err(e) = server.run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
