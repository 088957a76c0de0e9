// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Firebase Identity Toolkit REST client.
//!
//! Handles:
//! - Email/password account creation and sign-in
//! - Google ID token exchange (signInWithIdp)
//! - Account deletion (registration rollback only)
//! - Refresh-token exchange (securetoken) to resume a persisted session
//! - Mapping Firebase error codes onto [`ProviderError`]

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Identity Toolkit client.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    api_key: String,
}

impl FirebaseAuthClient {
    /// Create a new client for the project owning `api_key`.
    ///
    /// For local development with the emulator, set FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        let (base_url, token_url) = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Auth Emulator");
                (
                    format!("http://{}/identitytoolkit.googleapis.com/v1", host),
                    format!("http://{}/securetoken.googleapis.com/v1", host),
                )
            }
            Err(_) => (DEFAULT_BASE_URL.to_string(), DEFAULT_TOKEN_URL.to_string()),
        };

        let mut client = Self::with_base_url(api_key, base_url)?;
        client.token_url = token_url;
        Ok(client)
    }

    /// Client whose Identity Toolkit and securetoken calls both go to
    /// `base_url`.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Unexpected(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            token_url: base_url.clone(),
            base_url,
            api_key,
        })
    }

    /// Create an email/password account.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, ProviderError> {
        self.post(
            "accounts:signUp",
            &PasswordRequest {
                email,
                password,
                return_secure_token: true,
            },
        )
        .await
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ProviderError> {
        self.post(
            "accounts:signInWithPassword",
            &PasswordRequest {
                email,
                password,
                return_secure_token: true,
            },
        )
        .await
    }

    /// Exchange a Google ID token for a Firebase session.
    pub async fn sign_in_with_google(
        &self,
        google_id_token: &str,
    ) -> Result<AuthResponse, ProviderError> {
        let post_body = format!(
            "id_token={}&providerId=google.com",
            urlencoding::encode(google_id_token)
        );

        self.post(
            "accounts:signInWithIdp",
            &IdpRequest {
                post_body,
                request_uri: "http://localhost",
                return_idp_credential: true,
                return_secure_token: true,
            },
        )
        .await
    }

    /// Delete the account the session token belongs to.
    pub async fn delete_account(&self, id_token: &str) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .post("accounts:delete", &DeleteRequest { id_token })
            .await?;
        Ok(())
    }

    /// Exchange a refresh token for a new ID token.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<TokenResponse, ProviderError> {
        let url = format!("{}/token", self.token_url);
        let body = format!(
            "grant_type=refresh_token&refresh_token={}",
            urlencoding::encode(refresh_token)
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkUnavailable(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// POST a JSON request and parse the JSON response.
    async fn post<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, method);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkUnavailable(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => classify_error(&envelope.error.message),
                Err(_) if status.is_server_error() => {
                    ProviderError::NetworkUnavailable(format!("HTTP {}", status))
                }
                Err(_) => ProviderError::Unexpected(format!("HTTP {}: {}", status, body)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Unexpected(format!("JSON parse error: {}", e)))
    }
}

/// Map an Identity Toolkit error message (e.g. `"WEAK_PASSWORD : ..."`)
/// onto the provider error taxonomy.
pub fn classify_error(message: &str) -> ProviderError {
    let code = message
        .split(|c: char| c == ' ' || c == ':')
        .next()
        .unwrap_or_default();

    match code {
        "EMAIL_EXISTS" => ProviderError::AlreadyExists,
        "EMAIL_NOT_FOUND"
        | "INVALID_PASSWORD"
        | "INVALID_LOGIN_CREDENTIALS"
        | "INVALID_EMAIL"
        | "WEAK_PASSWORD"
        | "INVALID_IDP_RESPONSE"
        | "INVALID_ID_TOKEN"
        | "MISSING_PASSWORD"
        | "MISSING_EMAIL"
        | "TOKEN_EXPIRED"
        | "INVALID_REFRESH_TOKEN" => ProviderError::InvalidCredential(code.to_string()),
        "USER_DISABLED" | "OPERATION_NOT_ALLOWED" | "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            ProviderError::PermissionDenied(code.to_string())
        }
        "USER_NOT_FOUND" => ProviderError::NotFound(code.to_string()),
        _ => ProviderError::Unexpected(message.to_string()),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: &'static str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Successful sign-up/sign-in response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Firebase user ID
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Session ID token
    pub id_token: String,
    pub refresh_token: String,
    /// Seconds until `id_token` expires (as a string)
    #[serde(default)]
    pub expires_in: Option<String>,
    /// Only present on signInWithIdp
    #[serde(default)]
    pub is_new_user: Option<bool>,
}

/// securetoken response. Field names are snake_case, unlike Identity
/// Toolkit.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub user_id: String,
    pub id_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<String>,
}

/// Lifetime of an ID token given its `expiresIn` value. Firebase issues
/// one-hour tokens.
pub fn token_lifetime(expires_in: Option<&str>) -> chrono::Duration {
    let seconds = expires_in
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(3600);
    chrono::Duration::seconds(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_error_codes() {
        assert_eq!(classify_error("EMAIL_EXISTS"), ProviderError::AlreadyExists);
        assert_eq!(
            classify_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            ProviderError::InvalidCredential("WEAK_PASSWORD".to_string())
        );
        assert_eq!(
            classify_error("INVALID_LOGIN_CREDENTIALS"),
            ProviderError::InvalidCredential("INVALID_LOGIN_CREDENTIALS".to_string())
        );
        assert_eq!(
            classify_error("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            ProviderError::PermissionDenied("TOO_MANY_ATTEMPTS_TRY_LATER".to_string())
        );
        assert!(matches!(
            classify_error("SOMETHING_NEW"),
            ProviderError::Unexpected(_)
        ));
    }

    #[test]
    fn test_auth_response_parses_idp_payload() {
        let json = r#"{
            "localId": "uid-123",
            "email": "g@example.com",
            "idToken": "tok",
            "refreshToken": "ref",
            "expiresIn": "3600",
            "isNewUser": true,
            "providerId": "google.com"
        }"#;

        let parsed: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.local_id, "uid-123");
        assert_eq!(parsed.is_new_user, Some(true));
        assert_eq!(parsed.refresh_token, "ref");
    }

    #[test]
    fn test_token_response_parses_snake_case() {
        let json = r#"{
            "expires_in": "3600",
            "token_type": "Bearer",
            "refresh_token": "ref-2",
            "id_token": "tok-2",
            "user_id": "uid-123",
            "project_id": "1234"
        }"#;

        let parsed: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.user_id, "uid-123");
        assert_eq!(parsed.refresh_token, "ref-2");
        assert_eq!(token_lifetime(parsed.expires_in.as_deref()).num_seconds(), 3600);
    }

    #[test]
    fn test_token_lifetime_defaults_to_one_hour() {
        assert_eq!(token_lifetime(None).num_seconds(), 3600);
        assert_eq!(token_lifetime(Some("junk")).num_seconds(), 3600);
        assert_eq!(token_lifetime(Some("120")).num_seconds(), 120);
    }

    #[test]
    fn test_refresh_errors_are_credential_errors() {
        assert_eq!(
            classify_error("INVALID_REFRESH_TOKEN"),
            ProviderError::InvalidCredential("INVALID_REFRESH_TOKEN".to_string())
        );
        assert_eq!(
            classify_error("TOKEN_EXPIRED"),
            ProviderError::InvalidCredential("TOKEN_EXPIRED".to_string())
        );
    }
}
