// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use social_feed_core::api::{self, AppState};
use social_feed_core::config::{Config, LogFormat};
use social_feed_core::db::Database;
use social_feed_core::metrics::SocialMetrics;
use social_feed_core::store::PgStore;
use social_feed_core::SocialCore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Load configuration
    let config = Config::init()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,social_feed_core=debug".into()),
    );
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
    info!("Initialized configuration");

    // Initialize database
    let db = Database::new(&config.database).await?;
    info!("Connected to database");

    let store = Arc::new(PgStore::new(db, config.database.reaction_retry_attempts));
    let metrics = SocialMetrics::new().context("failed to register metrics")?;
    let state = AppState {
        core: SocialCore::new(store, metrics),
        limits: config.limits.clone(),
    };

    api::start_api_server(state, &config.server).await?;

    info!("Social feed core shutdown complete");
    Ok(())
}
