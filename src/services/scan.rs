// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Scan flow: entitlement check, analysis, history record, charge.

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::entitlement;
use crate::error::{ProviderError, SessionError};
use crate::models::{ScanRecord, UserProfile};
use crate::services::analysis::{AnalysisError, Analyzer, Photo};
use crate::session::SessionStore;
use crate::time_utils::now_rfc3339;

const SCAN_ID_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// No scans left and not premium.
    #[error("Scan allowance exhausted")]
    PaywallRequired,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Failed to record scan: {0}")]
    Record(ProviderError),
}

impl ScanError {
    pub fn user_message(&self) -> String {
        match self {
            ScanError::PaywallRequired => {
                "Tu as utilisé tes scans gratuits. Passe à Premium pour continuer.".to_string()
            }
            ScanError::Session(e) => e.user_message(),
            ScanError::Analysis(e) => e.user_message().to_string(),
            ScanError::Record(e) => e.user_message().to_string(),
        }
    }
}

/// A completed, recorded and charged scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub record: ScanRecord,
    /// Profile after the charge
    pub profile: UserProfile,
}

/// Runs one scan for the signed-in user.
pub struct ScanService {
    store: Arc<SessionStore>,
    analyzer: Arc<dyn Analyzer>,
}

impl ScanService {
    pub fn new(store: Arc<SessionStore>, analyzer: Arc<dyn Analyzer>) -> Self {
        Self { store, analyzer }
    }

    /// Analyse `photo` and charge the scan.
    ///
    /// The whole sequence holds the store's in-flight slot, and the
    /// allowance is checked against the remote profile. The charge happens
    /// once, after the analysis has succeeded and its record is stored. A
    /// failed analysis or record write costs nothing, and a record whose
    /// charge fails is deleted again.
    pub async fn run(&self, photo: &Photo) -> Result<ScanOutcome, ScanError> {
        let ticket = self.store.begin_scan().await?;
        let user_id = ticket.profile().id.clone();

        if !entitlement::can_scan(ticket.profile()) {
            tracing::info!(user_id = %user_id, "Scan refused, paywall");
            return Err(ScanError::PaywallRequired);
        }

        let result = self.analyzer.analyze(photo, ticket.profile().is_premium).await?;

        let record = ScanRecord::new(new_scan_id(), user_id, &result, now_rfc3339());
        self.store
            .provider()
            .record_scan(&record)
            .await
            .map_err(ScanError::Record)?;

        let profile = match ticket.charge().await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(scan_id = %record.id, error = %e, "Charge failed, removing scan record");
                self.discard_record(&record).await;
                return Err(e.into());
            }
        };
        drop(ticket);

        tracing::info!(
            user_id = %profile.id,
            scan_id = %record.id,
            global_score = record.global_score,
            "Scan completed"
        );

        Ok(ScanOutcome { record, profile })
    }

    /// Previous scans, most recent first. Premium only.
    pub async fn history(&self) -> Result<Vec<ScanRecord>, ScanError> {
        let profile = self
            .store
            .state()
            .profile()
            .cloned()
            .ok_or(SessionError::NotAuthenticated)?;

        if !entitlement::can_view_history(&profile) {
            return Err(ScanError::PaywallRequired);
        }

        Ok(self.store.scan_history().await?)
    }

    async fn discard_record(&self, record: &ScanRecord) {
        if let Err(e) = self.store.provider().delete_scan(record).await {
            tracing::error!(scan_id = %record.id, error = %e, "Failed to remove uncharged scan record");
        }
    }
}

/// Random document ID in the style of Firestore auto-IDs.
fn new_scan_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SCAN_ID_LEN)
        .map(char::from)
        .collect()
}
