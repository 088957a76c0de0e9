// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by provider user ID)
    pub const USERS: &str = "users";
    /// Completed scans (one document per scan, `userId` field)
    pub const SCANS: &str = "scans";
}
