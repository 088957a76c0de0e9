// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! User identity and profile models.

use serde::{Deserialize, Serialize};

use crate::onboarding::OnboardingDraft;

/// Number of free scans granted to every new account.
pub const FREE_SCAN_ALLOWANCE: u32 = 3;

/// How an identity authenticated with the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Password,
    Federated,
}

/// Authenticated identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Opaque, immutable user ID (also the profile document ID)
    pub id: String,
    pub email: Option<String>,
    pub method: AuthMethod,
}

/// Gender collected during onboarding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Unset,
    Male,
    Female,
}

/// User profile stored in Firestore.
///
/// Field names are camelCase to match the documents written by the
/// mobile client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Provider user ID (also used as document ID)
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub scans_remaining: u32,
    /// When the profile was created (RFC 3339)
    #[serde(default)]
    pub created_at: String,
}

impl UserProfile {
    /// Build the free-tier profile for a brand new account, seeded from the
    /// onboarding draft when one was collected.
    pub fn new_account(identity: &Identity, draft: Option<&OnboardingDraft>, now: &str) -> Self {
        let (gender, age) = draft
            .map(|d| (d.gender.unwrap_or_default(), d.age.unwrap_or(0)))
            .unwrap_or_default();

        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            gender,
            age,
            is_premium: false,
            scans_remaining: FREE_SCAN_ALLOWANCE,
            created_at: now.to_string(),
        }
    }

    /// Return a copy of this profile with a patch applied.
    pub fn patched(&self, patch: &ProfilePatch) -> Self {
        let mut next = self.clone();
        if let Some(gender) = patch.gender {
            next.gender = gender;
        }
        if let Some(age) = patch.age {
            next.age = age;
        }
        if let Some(is_premium) = patch.is_premium {
            next.is_premium = is_premium;
        }
        if let Some(scans_remaining) = patch.scans_remaining {
            next.scans_remaining = scans_remaining;
        }
        next
    }
}

/// Partial profile update. Only the fields that are set are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scans_remaining: Option<u32>,
}

impl ProfilePatch {
    pub fn demographics(gender: Gender, age: u32) -> Self {
        Self {
            gender: Some(gender),
            age: Some(age),
            ..Default::default()
        }
    }

    pub fn scans_remaining(scans_remaining: u32) -> Self {
        Self {
            scans_remaining: Some(scans_remaining),
            ..Default::default()
        }
    }

    pub fn premium(is_premium: bool) -> Self {
        Self {
            is_premium: Some(is_premium),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    /// Document field paths touched by this patch (Firestore update mask).
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.gender.is_some() {
            paths.push("gender");
        }
        if self.age.is_some() {
            paths.push("age");
        }
        if self.is_premium.is_some() {
            paths.push("isPremium");
        }
        if self.scans_remaining.is_some() {
            paths.push("scansRemaining");
        }
        paths
    }
}
