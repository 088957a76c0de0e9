// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Services module - business logic layer.

pub mod analysis;
pub mod firebase_auth;
pub mod scan;

pub use analysis::{AnalysisError, Analyzer, MockAnalyzer, Photo};
pub use firebase_auth::FirebaseAuthClient;
pub use scan::{ScanError, ScanOutcome, ScanService};
