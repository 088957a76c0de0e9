// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Photo analysis.
//!
//! [`MockAnalyzer`] draws plausible scores at random. It stands in for a
//! real vision backend and makes no claim about the photo's content.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::models::{AnalysisResult, CategoryScores};

/// A captured or imported photo, referenced by its local URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub uri: String,
}

impl Photo {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("No photo provided")]
    MissingPhoto,

    #[error("Analysis failed: {0}")]
    Failed(String),
}

impl AnalysisError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::MissingPhoto => "Aucune photo sélectionnée.",
            AnalysisError::Failed(_) => "L'analyse a échoué. Réessaie.",
        }
    }
}

/// Turns a photo into scores.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyse `photo`. The category breakdown is only produced when
    /// `detailed` is set (premium users).
    async fn analyze(&self, photo: &Photo, detailed: bool) -> Result<AnalysisResult, AnalysisError>;
}

/// Random scores after an optional artificial delay.
#[derive(Debug, Clone, Default)]
pub struct MockAnalyzer {
    delay: Duration,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate processing time before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    fn draw(detailed: bool) -> AnalysisResult {
        let mut rng = rand::thread_rng();

        let details = detailed.then(|| CategoryScores {
            skin: rng.gen_range(75..=94),
            symmetry: rng.gen_range(70..=94),
            features: rng.gen_range(75..=94),
            harmony: rng.gen_range(70..=94),
        });

        AnalysisResult {
            global_score: rng.gen_range(65..=94),
            percentile: rng.gen_range(55..=94),
            details,
        }
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(&self, photo: &Photo, detailed: bool) -> Result<AnalysisResult, AnalysisError> {
        if photo.uri.trim().is_empty() {
            return Err(AnalysisError::MissingPhoto);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = Self::draw(detailed);
        tracing::debug!(
            global_score = result.global_score,
            percentile = result.percentile,
            detailed,
            "Mock analysis complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scores_stay_in_range() {
        let analyzer = MockAnalyzer::new();
        let photo = Photo::new("file:///tmp/face.jpg");

        for _ in 0..200 {
            let result = analyzer.analyze(&photo, true).await.unwrap();
            assert!((65..=94).contains(&result.global_score));
            assert!((55..=94).contains(&result.percentile));

            let details = result.details.unwrap();
            assert!((75..=94).contains(&details.skin));
            assert!((70..=94).contains(&details.symmetry));
            assert!((75..=94).contains(&details.features));
            assert!((70..=94).contains(&details.harmony));
        }
    }

    #[tokio::test]
    async fn test_details_only_when_requested() {
        let analyzer = MockAnalyzer::new();
        let result = analyzer
            .analyze(&Photo::new("file:///tmp/face.jpg"), false)
            .await
            .unwrap();
        assert!(result.details.is_none());
    }

    #[tokio::test]
    async fn test_empty_photo_rejected() {
        let analyzer = MockAnalyzer::new();
        assert_eq!(
            analyzer.analyze(&Photo::new(" "), false).await,
            Err(AnalysisError::MissingPhoto)
        );
    }
}
