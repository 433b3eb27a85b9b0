//! User-facing value types and credential validation rules.

use curanet_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
        if parts.len() != 2 {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Minimum password length (NIST SP800-63B).
pub const PASSWORD_MIN_LENGTH: usize = 10;

/// Maximum password length to allow passphrases.
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Validates a plaintext password against length rules.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }

    if password.len() > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {PASSWORD_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}
