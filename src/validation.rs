// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Local form validation.
//!
//! Everything here runs before any remote call; a form that fails
//! validation never reaches the identity provider.

use validator::{Validate, ValidationErrors};

/// Upper bound on the age a profile may carry.
pub const MAX_AGE: u32 = 120;

/// Validation failures, displayed verbatim to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Remplis tous les champs.")]
    MissingFields,

    #[error("Les mots de passe ne correspondent pas")]
    PasswordMismatch,

    #[error("Le mot de passe doit contenir au moins 6 caractères.")]
    PasswordTooShort,

    #[error("Adresse email invalide.")]
    InvalidEmail,

    #[error("Connexion Google annulée.")]
    MissingIdToken,

    #[error("Âge invalide.")]
    InvalidAge,
}

impl ValidationError {
    /// Collapse `validator` output into the single error shown to the user.
    ///
    /// Priority: mismatch, then password length, then email syntax.
    fn from_errors(errors: &ValidationErrors) -> Self {
        let fields = errors.field_errors();
        let has = |field: &str, code: &str| {
            fields
                .get(field)
                .is_some_and(|errs| errs.iter().any(|e| e.code == code))
        };

        if has("confirm_password", "must_match") || has("password", "must_match") {
            ValidationError::PasswordMismatch
        } else if has("password", "too_short") {
            ValidationError::PasswordTooShort
        } else if has("email", "email") {
            ValidationError::InvalidEmail
        } else {
            ValidationError::MissingFields
        }
    }
}

/// Trimmed credentials that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Login form as typed by the user.
#[derive(Debug, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, code = "empty"))]
    email: String,
    #[validate(length(min = 1, code = "empty"))]
    password: String,
}

impl LoginForm {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    pub fn into_credentials(self) -> Result<Credentials, ValidationError> {
        if self.password.trim().is_empty() {
            return Err(ValidationError::MissingFields);
        }
        self.validate()
            .map_err(|e| ValidationError::from_errors(&e))?;

        Ok(Credentials {
            email: self.email,
            password: self.password,
        })
    }
}

/// Registration form as typed by the user.
#[derive(Debug, Validate)]
pub struct RegistrationForm {
    #[validate(email(code = "email"))]
    email: String,
    #[validate(length(min = 6, code = "too_short"))]
    password: String,
    #[validate(must_match(other = "password"))]
    confirm_password: String,
}

impl RegistrationForm {
    pub fn new(email: &str, password: &str, confirm_password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        }
    }

    /// Form without a confirmation field (the session store re-checks
    /// credentials it receives directly).
    pub fn without_confirmation(email: &str, password: &str) -> Self {
        Self::new(email, password, password)
    }

    pub fn into_credentials(self) -> Result<Credentials, ValidationError> {
        if self.email.is_empty()
            || self.password.trim().is_empty()
            || self.confirm_password.trim().is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        self.validate()
            .map_err(|e| ValidationError::from_errors(&e))?;

        Ok(Credentials {
            email: self.email,
            password: self.password,
        })
    }
}

/// Check a federated ID token before exchanging it.
pub fn id_token(token: &str) -> Result<&str, ValidationError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ValidationError::MissingIdToken);
    }
    Ok(token)
}

pub fn age(age: u32) -> Result<u32, ValidationError> {
    if age > MAX_AGE {
        return Err(ValidationError::InvalidAge);
    }
    Ok(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_trims_email() {
        let creds = LoginForm::new("  user@example.com ", "secret")
            .into_credentials()
            .unwrap();
        assert_eq!(creds.email, "user@example.com");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_login_rejects_blank_fields() {
        assert_eq!(
            LoginForm::new("   ", "secret").into_credentials(),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            LoginForm::new("user@example.com", "   ").into_credentials(),
            Err(ValidationError::MissingFields)
        );
    }

    #[test]
    fn test_registration_error_priority() {
        assert_eq!(
            RegistrationForm::new("", "abc", "abd").into_credentials(),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            RegistrationForm::new("user@example.com", "abc", "abd").into_credentials(),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            RegistrationForm::new("user@example.com", "abc", "abc").into_credentials(),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            RegistrationForm::new("not-an-email", "abcdef", "abcdef").into_credentials(),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn test_registration_accepts_valid_form() {
        let creds = RegistrationForm::new("user@example.com", "abcdef", "abcdef")
            .into_credentials()
            .unwrap();
        assert_eq!(creds.email, "user@example.com");
    }

    #[test]
    fn test_messages_are_user_facing() {
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "Le mot de passe doit contenir au moins 6 caractères."
        );
    }

    #[test]
    fn test_id_token_and_age() {
        assert_eq!(id_token("  "), Err(ValidationError::MissingIdToken));
        assert_eq!(id_token(" tok "), Ok("tok"));
        assert_eq!(age(25), Ok(25));
        assert_eq!(age(500), Err(ValidationError::InvalidAge));
    }
}
