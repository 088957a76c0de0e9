// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Data models for the application.

pub mod scan;
pub mod user;

pub use scan::{AnalysisResult, CategoryScores, ScanRecord, ScoreBand};
pub use user::{AuthMethod, Gender, Identity, ProfilePatch, UserProfile, FREE_SCAN_ALLOWANCE};
