// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Entitlement policy against a live store and provider.

mod common;

use mewscore::entitlement::{self, ScanAllowance};
use mewscore::error::ProviderError;
use mewscore::models::{AnalysisResult, ScanRecord};
use mewscore::provider::memory::Operation;
use mewscore::provider::{InMemoryProvider, RemoteProvider};

async fn seed_scans(provider: &InMemoryProvider, user_id: &str, count: usize) {
    let result = AnalysisResult {
        global_score: 80,
        percentile: 70,
        details: None,
    };
    for i in 0..count {
        let record = ScanRecord::new(
            format!("scan-{}", i),
            user_id.to_string(),
            &result,
            format!("2026-01-0{}T00:00:00.000Z", i + 1),
        );
        provider.record_scan(&record).await.unwrap();
    }
}

#[test]
fn test_can_scan_truth_table() {
    for is_premium in [false, true] {
        for remaining in [0, 1, 3] {
            let profile = common::profile("u", is_premium, remaining);
            assert_eq!(
                entitlement::can_scan(&profile),
                is_premium || remaining > 0,
                "premium={} remaining={}",
                is_premium,
                remaining
            );
        }
    }
}

#[test]
fn test_decrement_never_underflows_or_touches_premium() {
    let exhausted = common::profile("u", false, 0);
    assert_eq!(entitlement::decrement_if_metered(&exhausted).scans_remaining, 0);

    for remaining in [0, 1, 3] {
        let premium = common::profile("u", true, remaining);
        assert_eq!(entitlement::decrement_if_metered(&premium), premium);
    }
}

#[tokio::test]
async fn test_consume_scan_counts_down_to_zero() {
    let (store, _provider, _) = common::signed_in_store().await;

    for expected in [2, 1, 0, 0] {
        let profile = store.consume_scan().await.unwrap();
        assert_eq!(profile.scans_remaining, expected);
    }
    let profile = store.state().profile().cloned().unwrap();
    assert!(!entitlement::can_scan(&profile));
    assert_eq!(ScanAllowance::for_profile(&profile).to_string(), "0/3");
}

#[tokio::test]
async fn test_consume_scan_never_writes_premium_profile() {
    let (store, provider, registered) = common::signed_in_store().await;
    provider.insert_profile(common::profile(&registered.id, true, 3));
    store.refresh_user_data().await.unwrap();

    let profile = store.consume_scan().await.unwrap();
    assert_eq!(profile.scans_remaining, 3);
    assert_eq!(provider.calls(Operation::SetProfile), 0);
    assert_eq!(ScanAllowance::for_profile(&profile).to_string(), "Illimité");
}

#[tokio::test]
async fn test_reset_progression_keeps_entitlement() {
    let (store, provider, registered) = common::signed_in_store().await;
    store.consume_scan().await.unwrap();
    seed_scans(&provider, &registered.id, 3).await;

    let outcome = store.reset_progression().await;
    assert!(outcome.success);
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.cleared, 3);

    let stored = provider.get_profile(&registered.id).await.unwrap().unwrap();
    assert_eq!(stored.scans_remaining, 2);
    assert!(!stored.is_premium);
    assert!(provider.scan_history(&registered.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_progression_failure_is_a_value() {
    let (store, provider, registered) = common::signed_in_store().await;
    seed_scans(&provider, &registered.id, 2).await;
    provider.fail_next(
        Operation::DeleteScanHistory,
        ProviderError::PermissionDenied("rules".to_string()),
    );

    let outcome = store.reset_progression().await;
    assert!(!outcome.success);
    assert!(!outcome.error.as_deref().unwrap_or_default().is_empty());
    assert_eq!(outcome.cleared, 0);

    assert_eq!(provider.scan_history(&registered.id).await.unwrap().len(), 2);
    assert_eq!(provider.calls(Operation::SetProfile), 0);
}

#[tokio::test]
async fn test_reset_progression_requires_session() {
    let (store, provider) = common::test_store();

    let outcome = store.reset_progression().await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Connecte-toi pour continuer."));
    assert_eq!(provider.calls(Operation::DeleteScanHistory), 0);
}

#[tokio::test]
async fn test_grant_and_revoke_premium() {
    let provider = InMemoryProvider::new();
    provider.insert_profile(common::profile("buyer", false, 1));

    entitlement::grant_premium(&provider, "buyer").await.unwrap();
    let profile = provider.get_profile("buyer").await.unwrap().unwrap();
    assert!(profile.is_premium);
    assert_eq!(profile.scans_remaining, 1);

    entitlement::revoke_premium(&provider, "buyer").await.unwrap();
    let profile = provider.get_profile("buyer").await.unwrap().unwrap();
    assert!(!profile.is_premium);
    assert_eq!(profile.scans_remaining, 1);

    assert!(matches!(
        entitlement::grant_premium(&provider, "nobody").await,
        Err(ProviderError::NotFound(_))
    ));
}
