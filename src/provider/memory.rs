// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! In-process provider for tests and offline development.
//!
//! Behaves like the Firebase backend for the operations the core uses,
//! with hooks to inject failures and latency and to count remote calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;

use super::{FederatedSignIn, RemoteProvider};
use crate::error::ProviderError;
use crate::models::{AuthMethod, Identity, ProfilePatch, ScanRecord, UserProfile};

/// Provider operations, used to inject failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAccount,
    Authenticate,
    AuthenticateFederated,
    DiscardAccount,
    SignOut,
    GetProfile,
    PutProfile,
    SetProfile,
    RecordScan,
    DeleteScan,
    ScanHistory,
    DeleteScanHistory,
}

#[derive(Debug, Clone)]
struct Account {
    id: String,
    password: String,
}

/// Identity and document storage kept in memory.
pub struct InMemoryProvider {
    /// Password accounts keyed by email
    accounts: DashMap<String, Account>,
    /// Federated subjects keyed by the ID token that proves them
    federated_tokens: DashMap<String, String>,
    /// Federated accounts already created, keyed by email
    federated_accounts: DashMap<String, String>,
    profiles: DashMap<String, UserProfile>,
    scans: DashMap<String, Vec<ScanRecord>>,
    failures: DashMap<Operation, ProviderError>,
    calls: DashMap<Operation, usize>,
    latency_ms: AtomicU64,
    next_id: AtomicU64,
    identity: watch::Sender<Option<Identity>>,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            accounts: DashMap::new(),
            federated_tokens: DashMap::new(),
            federated_accounts: DashMap::new(),
            profiles: DashMap::new(),
            scans: DashMap::new(),
            failures: DashMap::new(),
            calls: DashMap::new(),
            latency_ms: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
            identity,
        }
    }

    // ─── Test Hooks ──────────────────────────────────────────────

    /// Make the next call to `op` fail with `error`.
    pub fn fail_next(&self, op: Operation, error: ProviderError) {
        self.failures.insert(op, error);
    }

    /// Delay every operation by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of calls made to `op` so far.
    pub fn calls(&self, op: Operation) -> usize {
        self.calls.get(&op).map(|c| *c).unwrap_or(0)
    }

    /// Accept `id_token` as proof of the federated account `email`.
    pub fn register_federated_token(&self, id_token: &str, email: &str) {
        self.federated_tokens
            .insert(id_token.to_string(), email.to_string());
    }

    /// Seed a profile document directly (e.g. a premium user).
    pub fn insert_profile(&self, profile: UserProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    /// Restore a persisted identity, as the SDK does on app start.
    pub fn restore_identity(&self, identity: Option<Identity>) {
        self.identity.send_replace(identity);
    }

    // ─── Helper Methods ──────────────────────────────────────────

    async fn enter(&self, op: Operation) -> Result<(), ProviderError> {
        *self.calls.entry(op).or_insert(0) += 1;

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        match self.failures.remove(&op) {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }

    fn allocate_id(&self) -> String {
        format!("user-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl RemoteProvider for InMemoryProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        self.enter(Operation::CreateAccount).await?;

        if self.accounts.contains_key(email) {
            return Err(ProviderError::AlreadyExists);
        }

        let account = Account {
            id: self.allocate_id(),
            password: password.to_string(),
        };
        let identity = Identity {
            id: account.id.clone(),
            email: Some(email.to_string()),
            method: AuthMethod::Password,
        };
        self.accounts.insert(email.to_string(), account);
        self.identity.send_replace(Some(identity.clone()));

        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        self.enter(Operation::Authenticate).await?;

        let account = self
            .accounts
            .get(email)
            .map(|a| a.value().clone())
            .ok_or_else(|| ProviderError::InvalidCredential("EMAIL_NOT_FOUND".to_string()))?;

        if account.password != password {
            return Err(ProviderError::InvalidCredential(
                "INVALID_PASSWORD".to_string(),
            ));
        }

        let identity = Identity {
            id: account.id,
            email: Some(email.to_string()),
            method: AuthMethod::Password,
        };
        self.identity.send_replace(Some(identity.clone()));

        Ok(identity)
    }

    async fn authenticate_federated(
        &self,
        id_token: &str,
    ) -> Result<FederatedSignIn, ProviderError> {
        self.enter(Operation::AuthenticateFederated).await?;

        let email = self
            .federated_tokens
            .get(id_token)
            .map(|e| e.value().clone())
            .ok_or_else(|| ProviderError::InvalidCredential("INVALID_IDP_RESPONSE".to_string()))?;

        let existing = self
            .federated_accounts
            .get(&email)
            .map(|id| id.value().clone());
        let (id, is_new_user) = match existing {
            Some(id) => (id, false),
            None => {
                let id = self.allocate_id();
                self.federated_accounts.insert(email.clone(), id.clone());
                (id, true)
            }
        };

        let identity = Identity {
            id,
            email: Some(email),
            method: AuthMethod::Federated,
        };
        self.identity.send_replace(Some(identity.clone()));

        Ok(FederatedSignIn {
            identity,
            is_new_user,
        })
    }

    async fn discard_account(&self, identity: &Identity) -> Result<(), ProviderError> {
        self.enter(Operation::DiscardAccount).await?;

        self.accounts.retain(|_, a| a.id != identity.id);
        self.federated_accounts.retain(|_, id| *id != identity.id);
        self.profiles.remove(&identity.id);
        self.identity.send_if_modified(|current| {
            if current.as_ref().is_some_and(|c| c.id == identity.id) {
                *current = None;
                true
            } else {
                false
            }
        });
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.enter(Operation::SignOut).await?;
        self.identity.send_if_modified(|current| current.take().is_some());
        Ok(())
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, ProviderError> {
        self.enter(Operation::GetProfile).await?;
        Ok(self.profiles.get(id).map(|p| p.value().clone()))
    }

    async fn put_profile(&self, profile: &UserProfile) -> Result<(), ProviderError> {
        self.enter(Operation::PutProfile).await?;
        self.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn set_profile(&self, id: &str, patch: &ProfilePatch) -> Result<(), ProviderError> {
        self.enter(Operation::SetProfile).await?;

        let mut profile = self
            .profiles
            .get_mut(id)
            .ok_or_else(|| ProviderError::NotFound(format!("profile {}", id)))?;
        let next = profile.patched(patch);
        *profile = next;
        Ok(())
    }

    async fn record_scan(&self, record: &ScanRecord) -> Result<(), ProviderError> {
        self.enter(Operation::RecordScan).await?;
        self.scans
            .entry(record.user_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn delete_scan(&self, record: &ScanRecord) -> Result<(), ProviderError> {
        self.enter(Operation::DeleteScan).await?;
        if let Some(mut scans) = self.scans.get_mut(&record.user_id) {
            scans.retain(|s| s.id != record.id);
        }
        Ok(())
    }

    async fn scan_history(&self, id: &str) -> Result<Vec<ScanRecord>, ProviderError> {
        self.enter(Operation::ScanHistory).await?;

        let mut records = self.scans.get(id).map(|s| s.value().clone()).unwrap_or_default();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete_scan_history(&self, id: &str) -> Result<usize, ProviderError> {
        self.enter(Operation::DeleteScanHistory).await?;
        Ok(self.scans.remove(id).map(|(_, s)| s.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_password_account_lifecycle() {
        let provider = InMemoryProvider::new();

        let created = provider
            .create_account("a@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(
            provider.create_account("a@example.com", "other1").await,
            Err(ProviderError::AlreadyExists)
        );

        let signed_in = provider
            .authenticate("a@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(signed_in.id, created.id);

        assert!(matches!(
            provider.authenticate("a@example.com", "wrong").await,
            Err(ProviderError::InvalidCredential(_))
        ));
    }

    #[tokio::test]
    async fn test_identity_feed_tracks_sign_in_and_out() {
        let provider = InMemoryProvider::new();
        let mut rx = provider.identity_changes();
        assert!(rx.borrow_and_update().is_none());

        provider
            .create_account("a@example.com", "secret1")
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_some());

        provider.sign_out().await.unwrap();
        assert!(rx.borrow_and_update().is_none());

        // Signing out twice does not notify again.
        provider.sign_out().await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_federated_first_and_repeat() {
        let provider = InMemoryProvider::new();
        provider.register_federated_token("google-token", "g@example.com");

        let first = provider.authenticate_federated("google-token").await.unwrap();
        assert!(first.is_new_user);

        let again = provider.authenticate_federated("google-token").await.unwrap();
        assert!(!again.is_new_user);
        assert_eq!(again.identity.id, first.identity.id);
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let provider = InMemoryProvider::new();
        provider.fail_next(
            Operation::GetProfile,
            ProviderError::NetworkUnavailable("offline".to_string()),
        );

        assert!(provider.get_profile("x").await.is_err());
        assert_eq!(provider.get_profile("x").await, Ok(None));
        assert_eq!(provider.calls(Operation::GetProfile), 2);
    }
}
