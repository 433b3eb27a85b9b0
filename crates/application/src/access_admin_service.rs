use std::sync::Arc;

use uuid::Uuid;

use curanet_core::{AppError, AppResult, UserIdentity};
use curanet_domain::Permission;

use crate::access_admin_ports::{
    AccessAdminRepository, AuditLogRepository, RoleRecord, UserAccessRecord,
};
use crate::authorization_service::AuthorizationService;

mod assignments;
mod audit;
mod roles;
mod users;

#[cfg(test)]
mod tests;

/// Application service for access-control administration.
///
/// Every operation authorizes the actor through the gate before touching
/// state; every mutation carries an audit context so the repository can
/// persist the change and its audit entry atomically.
#[derive(Clone)]
pub struct AccessAdminService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn AccessAdminRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
}

impl AccessAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn AccessAdminRepository>,
        audit_log_repository: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_log_repository,
        }
    }

    async fn require_rbac_manage(&self, actor: &UserIdentity) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ManageRbac)
            .await
    }

    async fn actor_is_super_admin(&self, actor: &UserIdentity) -> AppResult<bool> {
        self.authorization_service
            .is_super_admin(actor.user_id())
            .await
    }

    async fn load_role(&self, role_id: Uuid) -> AppResult<RoleRecord> {
        self.repository
            .get_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    async fn load_user(&self, user_id: Uuid) -> AppResult<UserAccessRecord> {
        self.repository
            .find_user_access(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
    }
}
