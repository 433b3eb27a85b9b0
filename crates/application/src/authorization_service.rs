use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use curanet_core::{AppError, AppResult};
use curanet_domain::Permission;

/// Effective access resolved for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessProfile {
    /// Whether the user may use the platform at all.
    pub is_active: bool,
    /// Whether the user holds the super-admin role.
    pub is_super_admin: bool,
    /// Union of permissions from active roles and direct grants.
    pub permissions: Vec<Permission>,
}

/// Repository port for permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Resolves the effective access profile for a user, or `None` for an
    /// unknown user.
    ///
    /// The profile's permission list must already exclude permissions that are
    /// only reachable through deactivated roles; direct grants are included
    /// regardless of role state.
    async fn load_access_profile(&self, user_id: Uuid) -> AppResult<Option<AccessProfile>>;
}

/// Application service answering "may this user do X" for every request.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Returns whether the user currently holds the permission.
    ///
    /// Unknown and deactivated users fail closed. Super-admins pass every
    /// check, including permissions a role could not even grant.
    pub async fn has_permission(&self, user_id: Uuid, permission: Permission) -> AppResult<bool> {
        let Some(profile) = self.repository.load_access_profile(user_id).await? else {
            return Ok(false);
        };

        if !profile.is_active {
            return Ok(false);
        }

        if profile.is_super_admin {
            return Ok(true);
        }

        Ok(profile.permissions.contains(&permission))
    }

    /// Ensures the user holds the required permission.
    pub async fn require_permission(&self, user_id: Uuid, permission: Permission) -> AppResult<()> {
        if self.has_permission(user_id, permission).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{user_id}' is missing permission '{}'",
            permission.as_str()
        )))
    }

    /// Ensures the user holds at least one of the listed permissions.
    pub async fn require_any_permission(
        &self,
        user_id: Uuid,
        permissions: &[Permission],
    ) -> AppResult<()> {
        let profile = self
            .repository
            .load_access_profile(user_id)
            .await?
            .filter(|profile| profile.is_active);

        if let Some(profile) = profile {
            if profile.is_super_admin
                || permissions
                    .iter()
                    .any(|permission| profile.permissions.contains(permission))
            {
                return Ok(());
            }
        }

        let wanted = permissions
            .iter()
            .map(Permission::as_str)
            .collect::<Vec<_>>()
            .join("' or '");

        Err(AppError::Forbidden(format!(
            "user '{user_id}' is missing permission '{wanted}'"
        )))
    }

    /// Returns whether the user holds the super-admin role.
    pub async fn is_super_admin(&self, user_id: Uuid) -> AppResult<bool> {
        let profile = self.repository.load_access_profile(user_id).await?;
        Ok(profile.is_some_and(|profile| profile.is_active && profile.is_super_admin))
    }

    /// Returns the resolved access profile for the authenticated-user view.
    pub async fn access_profile(&self, user_id: Uuid) -> AppResult<AccessProfile> {
        self.repository
            .load_access_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
    }
}
