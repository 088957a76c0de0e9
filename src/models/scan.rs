// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Scan analysis results and history records.

use serde::{Deserialize, Serialize};

/// Per-category breakdown, only produced for premium users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub skin: u8,
    pub symmetry: u8,
    pub features: u8,
    pub harmony: u8,
}

/// Outcome of analysing one photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub global_score: u8,
    pub percentile: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<CategoryScores>,
}

impl AnalysisResult {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.global_score)
    }
}

/// Qualitative band shown next to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Exceptional,
    VeryGood,
    Good,
    Fair,
    NeedsWork,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => ScoreBand::Exceptional,
            80..=89 => ScoreBand::VeryGood,
            70..=79 => ScoreBand::Good,
            60..=69 => ScoreBand::Fair,
            _ => ScoreBand::NeedsWork,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Exceptional => "Exceptionnel",
            ScoreBand::VeryGood => "Très bien",
            ScoreBand::Good => "Bien",
            ScoreBand::Fair => "Correct",
            ScoreBand::NeedsWork => "À améliorer",
        }
    }
}

/// One completed scan stored in Firestore (the user's scan history).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    /// Document ID
    pub id: String,
    pub user_id: String,
    pub global_score: u8,
    pub percentile: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<CategoryScores>,
    /// When the scan completed (RFC 3339)
    pub created_at: String,
}

impl ScanRecord {
    pub fn new(id: String, user_id: String, result: &AnalysisResult, created_at: String) -> Self {
        Self {
            id,
            user_id,
            global_score: result.global_score,
            percentile: result.percentile,
            details: result.details,
            created_at,
        }
    }

    pub fn result(&self) -> AnalysisResult {
        AnalysisResult {
            global_score: self.global_score,
            percentile: self.percentile,
            details: self.details,
        }
    }
}
