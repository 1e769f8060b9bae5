// src/main.rs
mod api;
mod auth;
mod config;
mod error;
mod ledger;
mod market;
mod models;
mod store;
mod users;

use crate::config::Config;
use crate::store::Store;
use env_logger::Builder;
use log::{error, info, LevelFilter};
use std::sync::Arc;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return;
        }
    };

    info!("Starting the stock dashboard...");
    let store = Arc::new(Store::new(&config));
    let api = api::routes(store);

    match warp::serve(api).try_bind_with_graceful_shutdown(config.addr, shutdown_signal()) {
        Ok((addr, server)) => {
            info!("Server running on http://{}", addr);
            server.await;
            info!("Server stopped.");
        }
        Err(e) => error!("Failed to bind {}: {}", config.addr, e),
    }
}
