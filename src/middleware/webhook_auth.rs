// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Shared-secret authentication for purchase webhooks.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `Authorization: Bearer <PURCHASE_WEBHOOK_SECRET>`.
pub async fn require_webhook_secret(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();

    if !secrets_match(provided, &state.config.purchase_webhook_secret) {
        tracing::warn!(
            path = %request.uri().path(),
            "Blocked webhook request with invalid secret"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Constant-time comparison. An empty configured secret never matches.
fn secrets_match(provided: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("whsec", "whsec"));
        assert!(!secrets_match("whsec2", "whsec"));
        assert!(!secrets_match("", "whsec"));
        assert!(!secrets_match("", ""));
    }
}
