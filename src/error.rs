// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Error types: remote provider failures, session failures, and the HTTP
//! error type with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::validation::ValidationError;

/// Failures reported by the remote identity/data provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Account already exists")]
    AlreadyExists,

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected provider error: {0}")]
    Unexpected(String),
}

impl ProviderError {
    /// Message shown to the user; never contains a raw provider code.
    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderError::InvalidCredential(_) => "Email ou mot de passe incorrect.",
            ProviderError::AlreadyExists => "Un compte existe déjà avec cet email.",
            ProviderError::NetworkUnavailable(_) => {
                "Connexion impossible. Vérifie ta connexion internet."
            }
            ProviderError::PermissionDenied(_) => "Accès refusé. Réessaie plus tard.",
            ProviderError::NotFound(_) => "Aucun compte ne correspond à ces informations.",
            ProviderError::Unexpected(_) => "Une erreur est survenue",
        }
    }
}

/// Failures returned by session store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Rejected locally, before any remote call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The provider refused to authenticate or create the account.
    #[error("Authentication failed: {0}")]
    Auth(ProviderError),

    /// Authenticated, but the profile could not be read or written.
    #[error("Profile error: {0}")]
    Profile(ProviderError),

    #[error("Profile missing for user {0}")]
    ProfileMissing(String),

    #[error("No active session")]
    NotAuthenticated,

    /// Another session operation is still in flight.
    #[error("Operation already in progress")]
    Busy,
}

impl SessionError {
    /// Message for the single blocking alert shown on failure.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation(e) => e.to_string(),
            SessionError::Auth(e) => e.user_message().to_string(),
            SessionError::Profile(e @ ProviderError::NetworkUnavailable(_)) => {
                e.user_message().to_string()
            }
            SessionError::Profile(_) | SessionError::ProfileMissing(_) => {
                "Impossible de charger ton profil.".to_string()
            }
            SessionError::NotAuthenticated => "Connecte-toi pour continuer.".to_string(),
            SessionError::Busy => "Opération déjà en cours.".to_string(),
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Provider(ProviderError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "not_found", Some(msg.clone()))
            }
            AppError::Provider(err) => {
                tracing::error!(error = %err, "Provider error");
                (StatusCode::BAD_GATEWAY, "provider_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
