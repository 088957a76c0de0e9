// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and entitlement documents)
//! - Scans (per-user scan history)

use crate::db::collections;
use crate::error::ProviderError;
use crate::models::{ProfilePatch, ScanRecord, UserProfile};
use firestore::errors::FirestoreError;
use futures_util::{stream, StreamExt};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Maximum concurrent Firestore commits.
const MAX_CONCURRENT_DB_OPS: usize = 4;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, ProviderError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| {
                ProviderError::NetworkUnavailable(format!("Failed to connect to Firestore: {}", e))
            })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, ProviderError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            ProviderError::NetworkUnavailable(format!(
                "Failed to connect to Firestore Emulator: {}",
                e
            ))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, ProviderError> {
        self.client.as_ref().ok_or_else(|| {
            ProviderError::NetworkUnavailable("Database not connected (offline mode)".to_string())
        })
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get a profile by user ID.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, ProviderError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(map_firestore_error)
    }

    /// Create or replace a profile document.
    pub async fn put_profile(&self, profile: &UserProfile) -> Result<(), ProviderError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.id)
            .object(profile)
            .execute()
            .await
            .map_err(map_firestore_error)?;
        Ok(())
    }

    /// Update only the fields set in `patch`.
    ///
    /// The document must already exist.
    pub async fn patch_profile(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<(), ProviderError> {
        if patch.is_empty() {
            return Ok(());
        }

        if self.get_profile(user_id).await?.is_none() {
            return Err(ProviderError::NotFound(format!("profile {}", user_id)));
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(patch.field_paths())
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(patch)
            .execute()
            .await
            .map_err(map_firestore_error)?;
        Ok(())
    }

    // ─── Scan Operations ─────────────────────────────────────────

    /// Store a completed scan.
    pub async fn insert_scan(&self, record: &ScanRecord) -> Result<(), ProviderError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SCANS)
            .document_id(&record.id)
            .object(record)
            .execute()
            .await
            .map_err(map_firestore_error)?;
        Ok(())
    }

    /// Delete one scan document.
    pub async fn delete_scan(&self, scan_id: &str) -> Result<(), ProviderError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SCANS)
            .document_id(scan_id)
            .execute()
            .await
            .map_err(map_firestore_error)
    }

    /// Get all scans for a user, most recent first.
    pub async fn get_scans_for_user(&self, user_id: &str) -> Result<Vec<ScanRecord>, ProviderError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SCANS)
            .filter(|q| q.for_all([q.field("userId").eq(user_id)]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(map_firestore_error)
    }

    /// Delete every scan for a user. Returns the number of documents deleted.
    ///
    /// The profile document (and its entitlement fields) is not touched.
    pub async fn delete_scans_for_user(&self, user_id: &str) -> Result<usize, ProviderError> {
        let scans = self.get_scans_for_user(user_id).await?;
        let count = scans.len();

        self.batch_delete(&scans, collections::SCANS, |scan: &ScanRecord| {
            scan.id.clone()
        })
        .await?;

        tracing::debug!(user_id, count, "Deleted scan history");
        Ok(count)
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    ///
    /// Chunks are committed concurrently, each in its own transaction.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), ProviderError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        let chunks: Vec<Vec<String>> = items
            .chunks(BATCH_SIZE)
            .map(|chunk| chunk.iter().map(&id_extractor).collect())
            .collect();

        stream::iter(chunks)
            .map(|doc_ids| async move {
                let mut transaction = client
                    .begin_transaction()
                    .await
                    .map_err(map_firestore_error)?;

                for doc_id in &doc_ids {
                    client
                        .fluent()
                        .delete()
                        .from(collection)
                        .document_id(doc_id)
                        .add_to_transaction(&mut transaction)
                        .map_err(map_firestore_error)?;
                }

                transaction.commit().await.map_err(map_firestore_error)?;
                Ok::<_, ProviderError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), ProviderError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, ProviderError>>()?;

        Ok(())
    }
}

/// Map Firestore client errors onto the provider error taxonomy.
fn map_firestore_error(err: FirestoreError) -> ProviderError {
    match &err {
        FirestoreError::DataNotFoundError(_) => ProviderError::NotFound(err.to_string()),
        FirestoreError::NetworkError(_) => ProviderError::NetworkUnavailable(err.to_string()),
        _ => {
            let message = err.to_string();
            if message.contains("PermissionDenied") || message.contains("PERMISSION_DENIED") {
                ProviderError::PermissionDenied(message)
            } else if message.contains("NotFound") || message.contains("NOT_FOUND") {
                ProviderError::NotFound(message)
            } else {
                ProviderError::Unexpected(message)
            }
        }
    }
}
