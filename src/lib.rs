// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! MewScore: session, entitlement and navigation core of the face-analysis
//! app, plus the purchase webhook service.
//!
//! The client side is assembled into an [`AppContext`] that is passed
//! explicitly to whatever renders screens. The server side shares an
//! [`AppState`] between axum handlers.

pub mod config;
pub mod db;
pub mod entitlement;
pub mod error;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod onboarding;
pub mod preferences;
pub mod provider;
pub mod routes;
pub mod services;
pub mod session;
pub mod theme;
pub mod time_utils;
pub mod validation;

use std::sync::Arc;

use config::Config;
use provider::RemoteProvider;
use services::{Analyzer, ScanService};
use session::{SessionListener, SessionStore};
use preferences::Preferences;
use theme::ThemeSettings;

/// Shared state of the webhook service.
pub struct AppState {
    pub config: Config,
    pub provider: Arc<dyn RemoteProvider>,
}

/// Everything the screens need, created once at startup.
pub struct AppContext {
    pub session: Arc<SessionStore>,
    pub scans: ScanService,
    pub theme: tokio::sync::Mutex<ThemeSettings>,
    listener: SessionListener,
}

impl AppContext {
    /// Load the theme, then start resolving the persisted session.
    pub async fn bootstrap(
        provider: Arc<dyn RemoteProvider>,
        analyzer: Arc<dyn Analyzer>,
        preferences: Preferences,
    ) -> Self {
        let theme = ThemeSettings::load(preferences).await;
        tracing::debug!(mode = ?theme.mode(), "Theme loaded");

        let session = Arc::new(SessionStore::new(provider));
        let listener = session.start();
        let scans = ScanService::new(session.clone(), analyzer);

        Self {
            session,
            scans,
            theme: tokio::sync::Mutex::new(theme),
            listener,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_running()
    }

    /// Stop the identity listener.
    pub fn shutdown(self) {
        self.listener.shutdown();
    }
}
