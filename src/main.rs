// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! MewScore purchase webhook service
//!
//! Receives subscription lifecycle events from the purchase SDK and keeps
//! the premium flag on user profiles in sync.

use anyhow::Context;
use mewscore::{config::Config, provider::FirebaseProvider, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting MewScore API");

    let provider = FirebaseProvider::connect(&config)
        .await
        .context("Failed to connect to Firebase")?;
    tracing::info!(project = %config.firebase_project_id, "Firebase provider ready");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        provider: Arc::new(provider),
    });

    // Build router
    let app = mewscore::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mewscore=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
