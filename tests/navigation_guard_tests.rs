// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Navigation guard decisions and the spawned guard task.

mod common;

use mewscore::navigation::{NavigationGuard, Navigator, APP_ROUTE, ONBOARDING_ROUTE};
use mewscore::onboarding::OnboardingDraft;
use mewscore::session::SessionState;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Navigator that records replacements and moves the location.
struct RecordingNavigator {
    location: watch::Sender<String>,
    replaced: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn new(start: &str) -> Arc<Self> {
        let (location, _) = watch::channel(start.to_string());
        Arc::new(Self {
            location,
            replaced: Mutex::new(Vec::new()),
        })
    }

    fn replaced(&self) -> Vec<String> {
        self.replaced.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&self, route: &str) {
        self.replaced.lock().unwrap().push(route.to_string());
        self.location.send_replace(route.to_string());
    }
}

async fn pause() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[test]
fn test_authenticated_leaves_public_zones() {
    let state = SessionState::Authenticated(common::profile("u", false, 3));

    assert_eq!(NavigationGuard::evaluate(&state, "/onboarding"), Some(APP_ROUTE));
    assert_eq!(NavigationGuard::evaluate(&state, "/(auth)/login"), Some(APP_ROUTE));
    assert_eq!(NavigationGuard::evaluate(&state, "/(tabs)/profile"), None);
    assert_eq!(NavigationGuard::evaluate(&state, "/result"), None);
}

#[test]
fn test_evaluate_is_idempotent_after_redirect() {
    let signed_out = SessionState::Unauthenticated;
    let route = NavigationGuard::evaluate(&signed_out, "/(tabs)").unwrap();
    assert_eq!(NavigationGuard::evaluate(&signed_out, route), None);

    let signed_in = SessionState::Authenticated(common::profile("u", true, 0));
    let route = NavigationGuard::evaluate(&signed_in, "/(auth)/register").unwrap();
    assert_eq!(NavigationGuard::evaluate(&signed_in, route), None);
}

#[tokio::test]
async fn test_guard_waits_for_loading_then_redirects() {
    let (store, _provider) = common::test_store();
    let navigator = RecordingNavigator::new("/(tabs)");

    let _guard = NavigationGuard::spawn(
        store.subscribe(),
        navigator.location.subscribe(),
        navigator.clone(),
    );
    pause().await;
    assert!(navigator.replaced().is_empty());

    let _listener = store.start();
    common::settled(&store).await;
    pause().await;

    assert_eq!(navigator.replaced(), vec![ONBOARDING_ROUTE.to_string()]);
}

#[tokio::test]
async fn test_guard_follows_login_and_logout() {
    let (store, _provider) = common::test_store();
    let navigator = RecordingNavigator::new("/onboarding");
    let _listener = store.start();
    common::settled(&store).await;

    let _guard = NavigationGuard::spawn(
        store.subscribe(),
        navigator.location.subscribe(),
        navigator.clone(),
    );
    pause().await;
    assert!(navigator.replaced().is_empty());

    // Moving within public zones is allowed while signed out.
    navigator.location.send_replace("/(auth)/register".to_string());
    pause().await;
    assert!(navigator.replaced().is_empty());

    store
        .register("nav@example.com", "secret1", &OnboardingDraft::default())
        .await
        .unwrap();
    pause().await;
    assert_eq!(navigator.replaced(), vec![APP_ROUTE.to_string()]);

    store.logout().await.unwrap();
    pause().await;
    assert_eq!(
        navigator.replaced(),
        vec![APP_ROUTE.to_string(), ONBOARDING_ROUTE.to_string()]
    );
}

#[tokio::test]
async fn test_dropping_guard_stops_redirects() {
    let (store, _provider) = common::test_store();
    let navigator = RecordingNavigator::new("/(tabs)");

    let guard = NavigationGuard::spawn(
        store.subscribe(),
        navigator.location.subscribe(),
        navigator.clone(),
    );
    guard.stop();
    tokio::task::yield_now().await;

    let _listener = store.start();
    common::settled(&store).await;
    pause().await;

    assert!(navigator.replaced().is_empty());
}
