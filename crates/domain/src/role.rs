use std::fmt::{Display, Formatter};

use curanet_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Slug of the singleton role that bypasses every permission check.
pub const SUPER_ADMIN_ROLE_SLUG: &str = "super-admin";

/// Slug of the built-in administrator role.
pub const ADMIN_ROLE_SLUG: &str = "admin";

const SYSTEM_ROLE_SLUGS: &[&str] = &[SUPER_ADMIN_ROLE_SLUG, ADMIN_ROLE_SLUG];

const ROLE_SLUG_MAX_LENGTH: usize = 64;

/// Validated machine key for a role.
///
/// Slugs are lowercase kebab-case: ASCII letters, digits, and single interior
/// hyphens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleSlug(String);

impl RoleSlug {
    /// Creates a validated role slug.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "role slug must not be empty".to_owned(),
            ));
        }

        if trimmed.len() > ROLE_SLUG_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "role slug must not exceed {ROLE_SLUG_MAX_LENGTH} characters"
            )));
        }

        let valid_chars = trimmed
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
        if !valid_chars {
            return Err(AppError::Validation(format!(
                "role slug '{trimmed}' may only contain lowercase letters, digits, and hyphens"
            )));
        }

        if trimmed.starts_with('-') || trimmed.ends_with('-') || trimmed.contains("--") {
            return Err(AppError::Validation(format!(
                "role slug '{trimmed}' must use single interior hyphens"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying slug value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns true for the protected super-admin role.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.0 == SUPER_ADMIN_ROLE_SLUG
    }

    /// Returns true for system-managed roles that cannot be disabled.
    #[must_use]
    pub fn is_system(&self) -> bool {
        SYSTEM_ROLE_SLUGS.contains(&self.0.as_str())
    }
}

impl Display for RoleSlug {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<RoleSlug> for String {
    fn from(value: RoleSlug) -> Self {
        value.0
    }
}
