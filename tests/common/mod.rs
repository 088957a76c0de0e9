// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

use mewscore::config::Config;
use mewscore::models::{Gender, UserProfile};
use mewscore::provider::InMemoryProvider;
use mewscore::routes::create_router;
use mewscore::session::{SessionState, SessionStore};
use mewscore::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Store over a fresh in-memory provider.
#[allow(dead_code)]
pub fn test_store() -> (Arc<SessionStore>, Arc<InMemoryProvider>) {
    let provider = Arc::new(InMemoryProvider::new());
    let store = Arc::new(SessionStore::new(provider.clone()));
    (store, provider)
}

/// Store with a registered, signed-in free-tier user.
#[allow(dead_code)]
pub async fn signed_in_store() -> (Arc<SessionStore>, Arc<InMemoryProvider>, UserProfile) {
    let (store, provider) = test_store();
    let profile = store
        .register("user@example.com", "secret1", &Default::default())
        .await
        .expect("registration should succeed");
    (store, provider, profile)
}

/// Profile document as the backend would hold it.
#[allow(dead_code)]
pub fn profile(id: &str, is_premium: bool, scans_remaining: u32) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: Some(format!("{}@example.com", id)),
        gender: Gender::Unset,
        age: 30,
        is_premium,
        scans_remaining,
        created_at: "2026-01-01T00:00:00.000Z".to_string(),
    }
}

/// Wait until the store publishes a settled state.
#[allow(dead_code)]
pub async fn settled(store: &SessionStore) -> SessionState {
    let mut rx = store.subscribe();
    let state = tokio::time::timeout(
        Duration::from_secs(2),
        rx.wait_for(|state| !state.is_loading()),
    )
    .await
    .expect("store did not settle")
    .expect("store dropped")
    .clone();
    state
}

/// Unique scratch file path under the system temp directory.
#[allow(dead_code)]
pub fn scratch_path(name: &str) -> PathBuf {
    let nonce: u64 = rand::random();
    std::env::temp_dir().join(format!("mewscore-{}-{:x}.json", name, nonce))
}

/// Create a test app over an in-memory provider.
/// Returns the router and the provider.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<InMemoryProvider>) {
    let provider = Arc::new(InMemoryProvider::new());
    let state = Arc::new(AppState {
        config: Config::test_default(),
        provider: provider.clone(),
    });

    (create_router(state), provider)
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> mewscore::db::FirestoreDb {
    mewscore::db::FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}
