// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Session store: the single source of truth for who is signed in and
//! what they are entitled to.
//!
//! State is published through a `watch` channel (every transition,
//! loading included) and to observers registered with
//! [`SessionStore::observe`] (settled states only). Mutating operations
//! are serialized by a single-slot in-flight guard: a second call made
//! while one is running fails with [`SessionError::Busy`] and leaves the
//! state untouched.

mod observers;

pub use observers::Subscription;

use std::future::Future;
use std::sync::{Arc, Weak};

use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::entitlement::{self, ResetOutcome};
use crate::error::SessionError;
use crate::models::{Gender, Identity, ProfilePatch, ScanRecord, UserProfile};
use crate::onboarding::OnboardingDraft;
use crate::provider::RemoteProvider;
use crate::time_utils::now_rfc3339;
use crate::validation::{self, LoginForm, RegistrationForm};
use observers::ObserverRegistry;

/// What the store currently knows about the session.
///
/// A profile only exists alongside an authenticated identity, so
/// "loading with a stale user" or "user without session" cannot be
/// represented.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Startup resolution or a user action is in progress.
    #[default]
    Loading,
    Authenticated(UserProfile),
    Unauthenticated,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.profile().map(|p| p.id.as_str())
    }
}

/// Session store backed by a [`RemoteProvider`].
pub struct SessionStore {
    provider: Arc<dyn RemoteProvider>,
    state: watch::Sender<SessionState>,
    observers: Arc<ObserverRegistry>,
    in_flight: Mutex<()>,
}

impl SessionStore {
    /// Create a store in the `Loading` state. Call [`SessionStore::start`]
    /// to resolve the persisted identity.
    pub fn new(provider: Arc<dyn RemoteProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            provider,
            state,
            observers: Arc::new(ObserverRegistry::default()),
            in_flight: Mutex::new(()),
        }
    }

    pub fn provider(&self) -> &Arc<dyn RemoteProvider> {
        &self.provider
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver over every state transition, loading included.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Register `callback` for every settled (non-loading) state.
    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.observers.register(Arc::new(callback))
    }

    /// Spawn the identity listener.
    ///
    /// The current identity is resolved immediately, then again on every
    /// change reported by the provider. The listener holds only a weak
    /// reference to the store.
    pub fn start(self: &Arc<Self>) -> SessionListener {
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut identities = self.provider.identity_changes();

        let handle = tokio::spawn(async move {
            loop {
                let Some(store) = weak.upgrade() else {
                    break;
                };
                store.resolve_identity(&mut identities).await;
                drop(store);

                if identities.changed().await.is_err() {
                    break;
                }
            }
            tracing::debug!("Identity listener stopped");
        });

        SessionListener { handle }
    }

    // ─── User Actions ────────────────────────────────────────────

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, SessionError> {
        let credentials = LoginForm::new(email, password).into_credentials()?;
        let _guard = self.begin()?;

        tracing::info!(email = %credentials.email, "Login");
        self.sign_in(async {
            let identity = self
                .provider
                .authenticate(&credentials.email, &credentials.password)
                .await
                .map_err(SessionError::Auth)?;
            self.load_profile_or_sign_out(&identity).await
        })
        .await
    }

    /// Create a password account and its profile, seeded from `draft`.
    ///
    /// If the profile cannot be written the new account is discarded, so a
    /// failed registration leaves nothing behind.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        draft: &OnboardingDraft,
    ) -> Result<UserProfile, SessionError> {
        let credentials = RegistrationForm::without_confirmation(email, password).into_credentials()?;
        let _guard = self.begin()?;

        tracing::info!(email = %credentials.email, "Register");
        self.sign_in(async {
            let identity = self
                .provider
                .create_account(&credentials.email, &credentials.password)
                .await
                .map_err(SessionError::Auth)?;

            let profile = UserProfile::new_account(&identity, Some(draft), &now_rfc3339());
            if let Err(e) = self.provider.put_profile(&profile).await {
                tracing::error!(user_id = %identity.id, error = %e, "Profile write failed, rolling back account");
                self.roll_back_account(&identity).await;
                return Err(SessionError::Profile(e));
            }

            Ok(profile)
        })
        .await
    }

    /// Sign in with a Google ID token.
    ///
    /// The first sign-in (no profile document yet) creates the free-tier
    /// profile, seeded from `draft`. Later sign-ins only load the profile.
    pub async fn login_with_google(
        &self,
        id_token: &str,
        draft: Option<&OnboardingDraft>,
    ) -> Result<UserProfile, SessionError> {
        let id_token = validation::id_token(id_token)?;
        let _guard = self.begin()?;

        self.sign_in(async {
            let signed_in = self
                .provider
                .authenticate_federated(id_token)
                .await
                .map_err(SessionError::Auth)?;
            let identity = signed_in.identity;

            match self.provider.get_profile(&identity.id).await {
                Ok(Some(profile)) => Ok(profile),
                Ok(None) => {
                    let profile = UserProfile::new_account(&identity, draft, &now_rfc3339());
                    if let Err(e) = self.provider.put_profile(&profile).await {
                        self.sign_out_quietly().await;
                        return Err(SessionError::Profile(e));
                    }
                    tracing::info!(
                        user_id = %identity.id,
                        is_new_user = signed_in.is_new_user,
                        "Created profile on first federated sign-in"
                    );
                    Ok(profile)
                }
                Err(e) => {
                    self.sign_out_quietly().await;
                    Err(SessionError::Profile(e))
                }
            }
        })
        .await
    }

    /// Sign out.
    ///
    /// Local state is cleared even if the provider call fails. Without an
    /// active session this does nothing.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let _guard = self.begin()?;

        let has_identity = self.provider.identity_changes().borrow().is_some();
        if !has_identity && !self.state().is_authenticated() {
            tracing::debug!("Logout without a session");
            return Ok(());
        }

        let result = self.provider.sign_out().await;
        self.publish(SessionState::Unauthenticated);

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Provider sign-out failed, local session cleared anyway");
        }
        result.map_err(SessionError::Auth)
    }

    /// Re-fetch the profile and replace the cached copy.
    pub async fn refresh_user_data(&self) -> Result<(), SessionError> {
        let _guard = self.begin()?;
        self.refresh_locked().await.map(|_| ())
    }

    /// Edit the demographic fields of the current profile.
    pub async fn update_profile(&self, gender: Gender, age: u32) -> Result<UserProfile, SessionError> {
        let age = validation::age(age)?;
        let _guard = self.begin()?;
        let user_id = self.current_user_id()?;

        self.provider
            .set_profile(&user_id, &ProfilePatch::demographics(gender, age))
            .await
            .map_err(SessionError::Profile)?;

        self.refresh_locked()
            .await?
            .ok_or(SessionError::NotAuthenticated)
    }

    /// Charge one completed analysis to the current user.
    ///
    /// The decrement is computed from a fresh copy of the remote profile.
    /// Premium users are never written to.
    pub async fn consume_scan(&self) -> Result<UserProfile, SessionError> {
        let _guard = self.begin()?;
        let user_id = self.current_user_id()?;
        self.charge_locked(&user_id).await
    }

    /// Reserve the store for one scan and load a fresh copy of the
    /// current profile.
    ///
    /// The returned ticket holds the in-flight guard, so the entitlement
    /// check, the analysis and the charge run without any other store
    /// operation in between.
    pub async fn begin_scan(&self) -> Result<ScanTicket<'_>, SessionError> {
        let guard = self.begin()?;
        let user_id = self.current_user_id()?;

        let profile = self.fetch_profile(&user_id).await?;
        let stale = self.state.borrow().profile() != Some(&profile);
        if stale {
            self.publish(SessionState::Authenticated(profile.clone()));
        }

        Ok(ScanTicket {
            store: self,
            profile,
            _guard: guard,
        })
    }

    /// Clear the current user's scan history.
    pub async fn reset_progression(&self) -> ResetOutcome {
        let guard = match self.begin() {
            Ok(guard) => guard,
            Err(e) => return ResetOutcome::failed(e.user_message()),
        };
        let user_id = match self.current_user_id() {
            Ok(id) => id,
            Err(e) => return ResetOutcome::failed(e.user_message()),
        };

        let outcome = entitlement::reset_progression(self.provider.as_ref(), &user_id).await;
        drop(guard);
        outcome
    }

    /// Scans of the current user, most recent first.
    pub async fn scan_history(&self) -> Result<Vec<ScanRecord>, SessionError> {
        let user_id = self.current_user_id()?;
        self.provider
            .scan_history(&user_id)
            .await
            .map_err(SessionError::Profile)
    }

    // ─── Helper Methods ──────────────────────────────────────────

    fn begin(&self) -> Result<MutexGuard<'_, ()>, SessionError> {
        self.in_flight.try_lock().map_err(|_| {
            tracing::debug!("Rejected concurrent session operation");
            SessionError::Busy
        })
    }

    fn current_user_id(&self) -> Result<String, SessionError> {
        self.state
            .borrow()
            .user_id()
            .map(str::to_string)
            .ok_or(SessionError::NotAuthenticated)
    }

    /// Replace the state and notify observers of settled states.
    fn publish(&self, state: SessionState) {
        self.state.send_replace(state.clone());
        if !state.is_loading() {
            self.observers.notify(&state);
        }
    }

    /// Run a sign-in flow between a `Loading` and a settled state.
    async fn sign_in<F>(&self, flow: F) -> Result<UserProfile, SessionError>
    where
        F: Future<Output = Result<UserProfile, SessionError>>,
    {
        let previous = self.state();
        self.publish(SessionState::Loading);

        match flow.await {
            Ok(profile) => {
                tracing::info!(user_id = %profile.id, "Session established");
                self.publish(SessionState::Authenticated(profile.clone()));
                Ok(profile)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in failed");
                self.publish(self.fallback_state(previous));
                Err(e)
            }
        }
    }

    /// State to restore after a failed sign-in: the previous session if the
    /// provider still holds that identity, otherwise unauthenticated.
    fn fallback_state(&self, previous: SessionState) -> SessionState {
        let current_id = self
            .provider
            .identity_changes()
            .borrow()
            .as_ref()
            .map(|identity| identity.id.clone());

        match previous {
            SessionState::Authenticated(profile) if current_id.as_deref() == Some(profile.id.as_str()) => {
                SessionState::Authenticated(profile)
            }
            _ => SessionState::Unauthenticated,
        }
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, SessionError> {
        self.provider
            .get_profile(user_id)
            .await
            .map_err(SessionError::Profile)?
            .ok_or_else(|| SessionError::ProfileMissing(user_id.to_string()))
    }

    /// Decrement a metered user's allowance and publish the result.
    /// The caller holds the in-flight guard.
    async fn charge_locked(&self, user_id: &str) -> Result<UserProfile, SessionError> {
        let fresh = self.fetch_profile(user_id).await?;
        let next = entitlement::decrement_if_metered(&fresh);
        if next.scans_remaining != fresh.scans_remaining {
            self.provider
                .set_profile(user_id, &ProfilePatch::scans_remaining(next.scans_remaining))
                .await
                .map_err(SessionError::Profile)?;
            tracing::debug!(user_id, scans_remaining = next.scans_remaining, "Scan consumed");
        }

        self.refresh_locked()
            .await?
            .ok_or(SessionError::NotAuthenticated)
    }

    /// Load the profile for a freshly authenticated identity. On failure the
    /// identity is signed out again so no half session remains.
    async fn load_profile_or_sign_out(&self, identity: &Identity) -> Result<UserProfile, SessionError> {
        match self.fetch_profile(&identity.id).await {
            Ok(profile) => Ok(profile),
            Err(e) => {
                self.sign_out_quietly().await;
                Err(e)
            }
        }
    }

    /// Fetch and publish the current user's profile. Returns `None` when
    /// nobody is signed in.
    async fn refresh_locked(&self) -> Result<Option<UserProfile>, SessionError> {
        let Some(user_id) = self.state.borrow().user_id().map(str::to_string) else {
            return Ok(None);
        };

        let profile = self.fetch_profile(&user_id).await?;
        if self.state.borrow().user_id() == Some(user_id.as_str()) {
            self.publish(SessionState::Authenticated(profile.clone()));
        }
        Ok(Some(profile))
    }

    async fn roll_back_account(&self, identity: &Identity) {
        if let Err(e) = self.provider.discard_account(identity).await {
            tracing::error!(user_id = %identity.id, error = %e, "Account rollback failed");
            self.sign_out_quietly().await;
        }
    }

    async fn sign_out_quietly(&self) {
        if let Err(e) = self.provider.sign_out().await {
            tracing::warn!(error = %e, "Sign-out after failed sign-in failed");
        }
    }

    /// Bring the session in line with the provider's current identity.
    ///
    /// Waits for a user action in flight to finish and only then reads the
    /// identity, so a change made during the action is still applied.
    /// Nothing is published when the state already matches.
    async fn resolve_identity(&self, identities: &mut watch::Receiver<Option<Identity>>) {
        let _guard = self.in_flight.lock().await;
        let identity = identities.borrow_and_update().clone();

        if self.matches_identity(identity.as_ref()) {
            tracing::debug!("Session already matches provider identity");
            return;
        }

        let state = match identity {
            None => SessionState::Unauthenticated,
            Some(identity) => match self.provider.get_profile(&identity.id).await {
                Ok(Some(profile)) => SessionState::Authenticated(profile),
                Ok(None) => {
                    tracing::warn!(user_id = %identity.id, "Signed-in identity has no profile");
                    SessionState::Unauthenticated
                }
                Err(e) => {
                    tracing::warn!(user_id = %identity.id, error = %e, "Failed to load profile");
                    SessionState::Unauthenticated
                }
            },
        };

        self.publish(state);
    }

    fn matches_identity(&self, identity: Option<&Identity>) -> bool {
        match (&*self.state.borrow(), identity) {
            (SessionState::Authenticated(profile), Some(identity)) => profile.id == identity.id,
            (SessionState::Unauthenticated, None) => true,
            _ => false,
        }
    }
}

/// Exclusive slot for one metered scan, issued by
/// [`SessionStore::begin_scan`]. Dropping it frees the store.
pub struct ScanTicket<'a> {
    store: &'a SessionStore,
    profile: UserProfile,
    _guard: MutexGuard<'a, ()>,
}

impl ScanTicket<'_> {
    /// Remote profile as read when the ticket was issued.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Charge the scan. The slot stays held until the ticket is dropped.
    pub async fn charge(&self) -> Result<UserProfile, SessionError> {
        self.store.charge_locked(&self.profile.id).await
    }
}

/// Handle to the identity listener spawned by [`SessionStore::start`].
///
/// Dropping the handle stops the listener.
pub struct SessionListener {
    handle: JoinHandle<()>,
}

impl SessionListener {
    pub fn shutdown(self) {}

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SessionListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InMemoryProvider;

    #[tokio::test]
    async fn test_starts_loading() {
        let store = SessionStore::new(Arc::new(InMemoryProvider::new()));
        assert!(store.state().is_loading());
        assert!(store.state().profile().is_none());
    }

    #[tokio::test]
    async fn test_validation_rejects_before_provider() {
        let provider = Arc::new(InMemoryProvider::new());
        let store = SessionStore::new(provider.clone());

        let err = store.login("  ", "secret").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(err.user_message(), "Remplis tous les champs.");
        assert_eq!(
            provider.calls(crate::provider::memory::Operation::Authenticate),
            0
        );
        // No transition happened.
        assert!(store.state().is_loading());
    }
}
