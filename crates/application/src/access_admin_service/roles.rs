use super::*;

use curanet_domain::AuditReason;

use crate::access_admin_ports::{
    AuditContext, CreateRoleInput, PermissionUsage, RoleUpdateOutcome, UpdateRoleInput,
};

impl AccessAdminService {
    /// Returns all roles for administrative users.
    pub async fn list_roles(&self, actor: &UserIdentity) -> AppResult<Vec<RoleRecord>> {
        self.require_rbac_manage(actor).await?;
        self.repository.list_roles().await
    }

    /// Returns one role with its permission set and holder count.
    pub async fn get_role(&self, actor: &UserIdentity, role_id: Uuid) -> AppResult<RoleRecord> {
        self.require_rbac_manage(actor).await?;
        self.load_role(role_id).await
    }

    /// Returns the permission catalog with per-permission role usage.
    pub async fn permission_catalog(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<PermissionUsage>> {
        self.require_rbac_manage(actor).await?;
        self.repository.permission_usage().await
    }

    /// Creates a custom role and records it in the audit trail.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        input: CreateRoleInput,
    ) -> AppResult<RoleRecord> {
        self.authorization_service
            .require_any_permission(
                actor.user_id(),
                &[Permission::ManageRbac, Permission::CreateRoles],
            )
            .await?;

        if input.slug.is_system() {
            return Err(AppError::Validation(format!(
                "role slug '{}' is reserved",
                input.slug
            )));
        }

        self.repository
            .create_role(input, AuditContext::new(actor, None))
            .await
    }

    /// Updates a role's definition and permission set.
    ///
    /// The permission diff is recorded as one `role_permissions_updated`
    /// audit entry in the same transaction as the change.
    pub async fn update_role(
        &self,
        actor: &UserIdentity,
        role_id: Uuid,
        input: UpdateRoleInput,
        reason: AuditReason,
    ) -> AppResult<RoleUpdateOutcome> {
        self.require_rbac_manage(actor).await?;

        let role = self.load_role(role_id).await?;
        if role.slug.is_super_admin() {
            return Err(AppError::Forbidden(
                "the super-admin role cannot be modified".to_owned(),
            ));
        }

        if input.slug.is_system() && input.slug != role.slug {
            return Err(AppError::Validation(format!(
                "role slug '{}' is reserved",
                input.slug
            )));
        }

        self.repository
            .update_role(role_id, input, AuditContext::new(actor, Some(reason)))
            .await
    }

    /// Deletes a role that no user currently holds.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: Uuid) -> AppResult<()> {
        self.require_rbac_manage(actor).await?;

        let role = self.load_role(role_id).await?;
        if role.slug.is_super_admin() {
            return Err(AppError::Forbidden(
                "the super-admin role cannot be deleted".to_owned(),
            ));
        }

        if role.user_count > 0 {
            return Err(AppError::Conflict(format!(
                "cannot delete role '{}' while {} user(s) hold it",
                role.name, role.user_count
            )));
        }

        self.repository
            .delete_role(role_id, AuditContext::new(actor, None))
            .await
    }

    /// Flips a role's active flag.
    pub async fn toggle_role_status(
        &self,
        actor: &UserIdentity,
        role_id: Uuid,
        reason: Option<AuditReason>,
    ) -> AppResult<RoleRecord> {
        self.require_rbac_manage(actor).await?;

        let role = self.load_role(role_id).await?;
        if role.slug.is_system() {
            return Err(AppError::Forbidden(
                "system roles cannot be disabled".to_owned(),
            ));
        }

        self.repository
            .set_role_status(role_id, !role.is_active, AuditContext::new(actor, reason))
            .await
    }
}
