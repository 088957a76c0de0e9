// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Remote identity/data provider port.
//!
//! The session store and the entitlement operations only talk to the
//! backend through [`RemoteProvider`]. Two implementations exist:
//! - [`FirebaseProvider`]: Identity Toolkit REST + Firestore
//! - [`InMemoryProvider`]: process-local, used by tests and offline runs

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseProvider;
pub use memory::InMemoryProvider;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::ProviderError;
use crate::models::{Identity, ProfilePatch, ScanRecord, UserProfile};

/// Outcome of a federated (third-party token) sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedSignIn {
    pub identity: Identity,
    /// True when the provider created the account during this exchange.
    pub is_new_user: bool,
}

/// Operations the core needs from the identity/data backend.
///
/// Every call is an opaque remote call that may fail with a
/// [`ProviderError`]. Nothing here retries.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    // ─── Identity ────────────────────────────────────────────────

    async fn create_account(&self, email: &str, password: &str)
        -> Result<Identity, ProviderError>;

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, ProviderError>;

    async fn authenticate_federated(&self, id_token: &str)
        -> Result<FederatedSignIn, ProviderError>;

    /// Delete an account created moments ago whose profile could not be
    /// written. Only used to roll back a half-finished registration.
    async fn discard_account(&self, identity: &Identity) -> Result<(), ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Feed of the provider's current identity. The current value is
    /// available immediately; every sign-in/sign-out marks it changed.
    fn identity_changes(&self) -> watch::Receiver<Option<Identity>>;

    // ─── Profiles ────────────────────────────────────────────────

    async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, ProviderError>;

    /// Write a complete profile document.
    async fn put_profile(&self, profile: &UserProfile) -> Result<(), ProviderError>;

    /// Write only the fields set in `patch`.
    async fn set_profile(&self, id: &str, patch: &ProfilePatch) -> Result<(), ProviderError>;

    // ─── Scan history ────────────────────────────────────────────

    async fn record_scan(&self, record: &ScanRecord) -> Result<(), ProviderError>;

    /// Remove a single record, used when a recorded scan could not be
    /// charged.
    async fn delete_scan(&self, record: &ScanRecord) -> Result<(), ProviderError>;

    /// Scans for a user, most recent first.
    async fn scan_history(&self, id: &str) -> Result<Vec<ScanRecord>, ProviderError>;

    /// Delete every scan record for a user. Returns the number removed.
    async fn delete_scan_history(&self, id: &str) -> Result<usize, ProviderError>;
}
