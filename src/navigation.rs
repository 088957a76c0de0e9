// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Navigation guard: keeps the visible route consistent with the session.
//!
//! Routes belong to one of three zones, taken from their first segment.
//! Signed-out users are kept in the onboarding/auth zones and signed-in
//! users are kept out of them. Nothing is decided while the session is
//! still loading.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::session::SessionState;

/// Entry route for signed-out users.
pub const ONBOARDING_ROUTE: &str = "/onboarding";
/// Entry route for signed-in users.
pub const APP_ROUTE: &str = "/(tabs)";

/// Top-level navigation area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Onboarding,
    Auth,
    App,
}

impl Zone {
    /// Zone of a route path such as `/(auth)/login`.
    pub fn for_path(path: &str) -> Self {
        let first = path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();

        match first {
            "onboarding" => Zone::Onboarding,
            "(auth)" => Zone::Auth,
            _ => Zone::App,
        }
    }

    fn is_public(self) -> bool {
        matches!(self, Zone::Onboarding | Zone::Auth)
    }
}

/// Performs the actual route replacement.
pub trait Navigator: Send + Sync {
    /// Replace the current route (no back-stack entry).
    fn replace(&self, route: &str);
}

/// Running guard task. Dropping it stops the guard.
pub struct NavigationGuard {
    handle: JoinHandle<()>,
}

impl NavigationGuard {
    /// Route to replace the current one with, if any.
    pub fn evaluate(state: &SessionState, path: &str) -> Option<&'static str> {
        let zone = Zone::for_path(path);

        match state {
            SessionState::Loading => None,
            SessionState::Unauthenticated if !zone.is_public() => Some(ONBOARDING_ROUTE),
            SessionState::Authenticated(_) if zone.is_public() => Some(APP_ROUTE),
            _ => None,
        }
    }

    /// Re-evaluate on every session or location change and redirect
    /// through `navigator`.
    pub fn spawn(
        mut states: watch::Receiver<SessionState>,
        mut locations: watch::Receiver<String>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                let redirect = {
                    let state = states.borrow_and_update();
                    let location = locations.borrow_and_update();
                    Self::evaluate(&state, &location).map(|route| (route, location.to_string()))
                };

                if let Some((route, from)) = redirect {
                    tracing::debug!(from = %from, to = route, "Redirecting");
                    navigator.replace(route);
                }

                tokio::select! {
                    changed = states.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = locations.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { handle }
    }

    pub fn stop(self) {}
}

impl Drop for NavigationGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_for_path() {
        assert_eq!(Zone::for_path("/onboarding"), Zone::Onboarding);
        assert_eq!(Zone::for_path("/onboarding/age"), Zone::Onboarding);
        assert_eq!(Zone::for_path("/(auth)/login"), Zone::Auth);
        assert_eq!(Zone::for_path("/(tabs)"), Zone::App);
        assert_eq!(Zone::for_path("/"), Zone::App);
        assert_eq!(Zone::for_path(""), Zone::App);
    }

    #[test]
    fn test_loading_never_redirects() {
        assert_eq!(NavigationGuard::evaluate(&SessionState::Loading, "/(tabs)"), None);
        assert_eq!(NavigationGuard::evaluate(&SessionState::Loading, "/onboarding"), None);
    }

    #[test]
    fn test_unauthenticated_kept_in_public_zones() {
        let state = SessionState::Unauthenticated;
        assert_eq!(NavigationGuard::evaluate(&state, "/(tabs)/scan"), Some(ONBOARDING_ROUTE));
        assert_eq!(NavigationGuard::evaluate(&state, "/(auth)/register"), None);
        assert_eq!(NavigationGuard::evaluate(&state, "/onboarding"), None);
    }
}
