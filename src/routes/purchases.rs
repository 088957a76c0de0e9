// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Purchase webhook: applies subscription lifecycle events to entitlements.

use crate::entitlement;
use crate::error::{AppError, Result};
use crate::AppState;
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Prefix the purchase SDK uses for users that never signed in.
const ANONYMOUS_PREFIX: &str = "$RCAnonymousID:";

/// Purchase webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhooks/purchases", post(handle_event))
}

/// Webhook envelope.
#[derive(Deserialize, Debug)]
struct PurchaseWebhook {
    event: PurchaseEvent,
}

#[derive(Deserialize, Debug)]
struct PurchaseEvent {
    #[serde(rename = "type")]
    event_type: String,
    app_user_id: String,
    #[serde(default)]
    product_id: Option<String>,
}

/// What an event does to the entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseAction {
    Granted,
    Revoked,
    Ignored,
}

impl PurchaseAction {
    pub fn for_event(event_type: &str) -> Self {
        match event_type {
            "INITIAL_PURCHASE" | "RENEWAL" | "UNCANCELLATION" | "NON_RENEWING_PURCHASE" => {
                PurchaseAction::Granted
            }
            "EXPIRATION" => PurchaseAction::Revoked,
            _ => PurchaseAction::Ignored,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct PurchaseAck {
    pub action: PurchaseAction,
}

/// Handle a purchase lifecycle event (POST).
async fn handle_event(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<PurchaseAck>> {
    let webhook: PurchaseWebhook = serde_json::from_value(payload).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse purchase event");
        AppError::BadRequest(format!("invalid purchase event: {}", e))
    })?;
    let event = webhook.event;

    let mut action = PurchaseAction::for_event(&event.event_type);
    if action != PurchaseAction::Ignored && event.app_user_id.starts_with(ANONYMOUS_PREFIX) {
        tracing::info!(event_type = %event.event_type, "Purchase event for anonymous user ignored");
        action = PurchaseAction::Ignored;
    }

    let provider = &*state.provider;
    match action {
        PurchaseAction::Granted => entitlement::grant_premium(provider, &event.app_user_id).await?,
        PurchaseAction::Revoked => entitlement::revoke_premium(provider, &event.app_user_id).await?,
        PurchaseAction::Ignored => {}
    }

    tracing::info!(
        event_type = %event.event_type,
        user_id = %event.app_user_id,
        product_id = ?event.product_id,
        action = ?action,
        "Purchase event handled"
    );

    Ok(Json(PurchaseAck { action }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_actions() {
        assert_eq!(PurchaseAction::for_event("INITIAL_PURCHASE"), PurchaseAction::Granted);
        assert_eq!(PurchaseAction::for_event("RENEWAL"), PurchaseAction::Granted);
        assert_eq!(PurchaseAction::for_event("UNCANCELLATION"), PurchaseAction::Granted);
        assert_eq!(
            PurchaseAction::for_event("NON_RENEWING_PURCHASE"),
            PurchaseAction::Granted
        );
        assert_eq!(PurchaseAction::for_event("EXPIRATION"), PurchaseAction::Revoked);
        assert_eq!(PurchaseAction::for_event("CANCELLATION"), PurchaseAction::Ignored);
        assert_eq!(PurchaseAction::for_event("TEST"), PurchaseAction::Ignored);
    }
}
