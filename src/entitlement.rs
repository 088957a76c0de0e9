// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Entitlement policy: who may scan, what a scan costs, and resetting
//! progression.
//!
//! Premium users scan without limit. Everyone else gets
//! [`FREE_SCAN_ALLOWANCE`] metered scans, decremented once per completed
//! analysis.

use std::fmt;

use serde::Serialize;

use crate::error::ProviderError;
use crate::models::{ProfilePatch, UserProfile, FREE_SCAN_ALLOWANCE};
use crate::provider::RemoteProvider;

/// Whether `profile` may start a new analysis.
pub fn can_scan(profile: &UserProfile) -> bool {
    profile.is_premium || profile.scans_remaining > 0
}

/// Whether `profile` may browse its full scan history.
pub fn can_view_history(profile: &UserProfile) -> bool {
    profile.is_premium
}

/// Profile after one completed analysis.
///
/// Metered users lose one scan (never below zero). Premium users are
/// returned unchanged.
pub fn decrement_if_metered(profile: &UserProfile) -> UserProfile {
    if profile.is_premium {
        return profile.clone();
    }

    UserProfile {
        scans_remaining: profile.scans_remaining.saturating_sub(1),
        ..profile.clone()
    }
}

/// Result of [`reset_progression`]. Failures are reported here rather than
/// returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of scan records removed
    pub cleared: usize,
}

impl ResetOutcome {
    pub fn cleared(count: usize) -> Self {
        Self {
            success: true,
            error: None,
            cleared: count,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            cleared: 0,
        }
    }
}

/// Delete the scan history of `user_id`.
///
/// Only scan records are removed: `scans_remaining` and `is_premium` are
/// left exactly as they were.
pub async fn reset_progression(provider: &dyn RemoteProvider, user_id: &str) -> ResetOutcome {
    match provider.delete_scan_history(user_id).await {
        Ok(count) => {
            tracing::info!(user_id, count, "Progression reset");
            ResetOutcome::cleared(count)
        }
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Progression reset failed");
            ResetOutcome::failed(e.user_message())
        }
    }
}

/// Mark `user_id` as premium.
pub async fn grant_premium(provider: &dyn RemoteProvider, user_id: &str) -> Result<(), ProviderError> {
    provider
        .set_profile(user_id, &ProfilePatch::premium(true))
        .await?;
    tracing::info!(user_id, "Premium granted");
    Ok(())
}

/// Return `user_id` to metered scanning. The remaining count is kept.
pub async fn revoke_premium(provider: &dyn RemoteProvider, user_id: &str) -> Result<(), ProviderError> {
    provider
        .set_profile(user_id, &ProfilePatch::premium(false))
        .await?;
    tracing::info!(user_id, "Premium revoked");
    Ok(())
}

/// Remaining scans, as shown on the home and profile screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAllowance {
    Unlimited,
    Metered(u32),
}

impl ScanAllowance {
    pub fn for_profile(profile: &UserProfile) -> Self {
        if profile.is_premium {
            ScanAllowance::Unlimited
        } else {
            ScanAllowance::Metered(profile.scans_remaining)
        }
    }
}

impl fmt::Display for ScanAllowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanAllowance::Unlimited => write!(f, "Illimité"),
            ScanAllowance::Metered(n) => write!(f, "{}/{}", n, FREE_SCAN_ALLOWANCE),
        }
    }
}
