// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Firebase-backed provider: Identity Toolkit for accounts, Firestore for
//! profile and scan documents.
//!
//! The refresh token of the signed-in user is kept in the local
//! preferences file, so a restart resumes the session instead of asking
//! the user to sign in again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};

use super::{FederatedSignIn, RemoteProvider};
use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::ProviderError;
use crate::models::{AuthMethod, Identity, ProfilePatch, ScanRecord, UserProfile};
use crate::preferences::Preferences;
use crate::services::firebase_auth::{token_lifetime, AuthResponse, FirebaseAuthClient, TokenResponse};

/// Preference key holding the persisted session.
pub const SESSION_KEY: &str = "@mewscore_session";

/// ID tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Tokens for the identity currently signed in.
struct ActiveSession {
    user_id: String,
    email: Option<String>,
    method: AuthMethod,
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl ActiveSession {
    fn from_response(response: AuthResponse, method: AuthMethod) -> Self {
        Self {
            expires_at: Utc::now() + token_lifetime(response.expires_in.as_deref()),
            user_id: response.local_id,
            email: response.email,
            method,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
        }
    }

    fn resumed(stored: StoredSession, tokens: TokenResponse) -> Self {
        Self {
            expires_at: Utc::now() + token_lifetime(tokens.expires_in.as_deref()),
            user_id: tokens.user_id,
            email: stored.email,
            method: stored.method,
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
        }
    }

    fn renew(&mut self, tokens: TokenResponse) {
        self.expires_at = Utc::now() + token_lifetime(tokens.expires_in.as_deref());
        self.id_token = tokens.id_token;
        self.refresh_token = tokens.refresh_token;
    }

    fn is_expired(&self) -> bool {
        Utc::now() + chrono::Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }

    fn identity(&self) -> Identity {
        Identity {
            id: self.user_id.clone(),
            email: self.email.clone(),
            method: self.method,
        }
    }

    fn stored(&self) -> StoredSession {
        StoredSession {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            method: self.method,
            refresh_token: self.refresh_token.clone(),
        }
    }
}

/// What survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    user_id: String,
    #[serde(default)]
    email: Option<String>,
    method: AuthMethod,
    refresh_token: String,
}

/// Provider talking to a Firebase project.
pub struct FirebaseProvider {
    auth: FirebaseAuthClient,
    db: FirestoreDb,
    preferences: Option<Preferences>,
    session: Mutex<Option<ActiveSession>>,
    identity: watch::Sender<Option<Identity>>,
}

impl FirebaseProvider {
    /// Provider without session persistence.
    pub fn new(auth: FirebaseAuthClient, db: FirestoreDb) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            auth,
            db,
            preferences: None,
            session: Mutex::new(None),
            identity,
        }
    }

    /// Keep the signed-in session in `preferences`.
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Connect to the project named in `config` and resume the persisted
    /// session, if there is one.
    pub async fn connect(config: &Config) -> Result<Self, ProviderError> {
        let auth = FirebaseAuthClient::new(config.firebase_api_key.clone())?;
        let db = FirestoreDb::new(&config.firebase_project_id).await?;
        let provider = Self::new(auth, db).with_preferences(Preferences::from_config(config));

        if let Err(e) = provider.restore_session().await {
            tracing::warn!(error = %e, "Could not resume persisted session");
        }
        Ok(provider)
    }

    /// Resume the session saved by the last sign-in.
    ///
    /// A refresh token the backend rejects is forgotten. Any other failure
    /// (e.g. offline) keeps it for the next start.
    pub async fn restore_session(&self) -> Result<Option<Identity>, ProviderError> {
        let Some(stored) = self.load_stored().await else {
            return Ok(None);
        };

        match self.auth.refresh_session(&stored.refresh_token).await {
            Ok(tokens) => {
                let identity = self.activate(ActiveSession::resumed(stored, tokens)).await;
                tracing::info!(user_id = %identity.id, "Resumed persisted session");
                Ok(Some(identity))
            }
            Err(
                e @ (ProviderError::InvalidCredential(_)
                | ProviderError::PermissionDenied(_)
                | ProviderError::NotFound(_)),
            ) => {
                tracing::info!(user_id = %stored.user_id, error = %e, "Persisted session rejected");
                self.forget().await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Record a successful sign-in, persist it and announce the identity.
    async fn activate(&self, active: ActiveSession) -> Identity {
        let identity = active.identity();
        self.persist(&active.stored()).await;

        *self.session.lock().await = Some(active);
        self.identity.send_replace(Some(identity.clone()));

        tracing::info!(user_id = %identity.id, method = ?identity.method, "Firebase sign-in");
        identity
    }

    // ─── Persistence ─────────────────────────────────────────────
    // Failures here are logged only: the session still works for this run.

    async fn load_stored(&self) -> Option<StoredSession> {
        let preferences = self.preferences.as_ref()?;

        let raw = match preferences.get(SESSION_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(stored) => Some(stored),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable persisted session");
                self.forget().await;
                None
            }
        }
    }

    async fn persist(&self, stored: &StoredSession) {
        let Some(preferences) = &self.preferences else {
            return;
        };

        let result = match serde_json::to_string(stored) {
            Ok(json) => preferences.set(SESSION_KEY, &json).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!(user_id = %stored.user_id, error = %e, "Failed to persist session");
        }
    }

    async fn forget(&self) {
        let Some(preferences) = &self.preferences else {
            return;
        };

        if let Err(e) = preferences.remove(SESSION_KEY).await {
            tracing::warn!(error = %e, "Failed to clear persisted session");
        }
    }
}

#[async_trait]
impl RemoteProvider for FirebaseProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let response = self.auth.sign_up(email, password).await?;
        Ok(self
            .activate(ActiveSession::from_response(response, AuthMethod::Password))
            .await)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let response = self.auth.sign_in_with_password(email, password).await?;
        Ok(self
            .activate(ActiveSession::from_response(response, AuthMethod::Password))
            .await)
    }

    async fn authenticate_federated(
        &self,
        id_token: &str,
    ) -> Result<FederatedSignIn, ProviderError> {
        let response = self.auth.sign_in_with_google(id_token).await?;
        let is_new_user = response.is_new_user.unwrap_or(false);
        let identity = self
            .activate(ActiveSession::from_response(response, AuthMethod::Federated))
            .await;

        Ok(FederatedSignIn {
            identity,
            is_new_user,
        })
    }

    async fn discard_account(&self, identity: &Identity) -> Result<(), ProviderError> {
        let mut session = self.session.lock().await;

        let active = match session.as_mut() {
            Some(active) if active.user_id == identity.id => active,
            _ => {
                return Err(ProviderError::PermissionDenied(
                    "account is not the active session".to_string(),
                ))
            }
        };

        if active.is_expired() {
            let tokens = self.auth.refresh_session(&active.refresh_token).await?;
            active.renew(tokens);
        }

        self.auth.delete_account(&active.id_token).await?;
        *session = None;
        self.forget().await;
        self.identity.send_replace(None);

        tracing::warn!(user_id = %identity.id, "Discarded half-created account");
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        // Firebase sessions are client-side; dropping the tokens signs out.
        self.session.lock().await.take();
        self.forget().await;
        self.identity.send_if_modified(|current| current.take().is_some());
        Ok(())
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, ProviderError> {
        self.db.get_profile(id).await
    }

    async fn put_profile(&self, profile: &UserProfile) -> Result<(), ProviderError> {
        self.db.put_profile(profile).await
    }

    async fn set_profile(&self, id: &str, patch: &ProfilePatch) -> Result<(), ProviderError> {
        self.db.patch_profile(id, patch).await
    }

    async fn record_scan(&self, record: &ScanRecord) -> Result<(), ProviderError> {
        self.db.insert_scan(record).await
    }

    async fn delete_scan(&self, record: &ScanRecord) -> Result<(), ProviderError> {
        self.db.delete_scan(&record.id).await
    }

    async fn scan_history(&self, id: &str) -> Result<Vec<ScanRecord>, ProviderError> {
        self.db.get_scans_for_user(id).await
    }

    async fn delete_scan_history(&self, id: &str) -> Result<usize, ProviderError> {
        self.db.delete_scans_for_user(id).await
    }
}
