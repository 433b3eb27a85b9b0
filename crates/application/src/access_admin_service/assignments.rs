use super::*;

use curanet_domain::{AuditEventType, AuditReason};

use crate::access_admin_ports::AuditContext;

impl AccessAdminService {
    /// Attaches a role to a user.
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        user_id: Uuid,
        role_id: Uuid,
        reason: AuditReason,
    ) -> AppResult<UserAccessRecord> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::AssignRoles)
            .await?;

        let role = self.load_role(role_id).await?;
        let user = self.load_user(user_id).await?;

        if role.slug.is_super_admin() && !self.actor_is_super_admin(actor).await? {
            return Err(AppError::Forbidden(
                "Only super administrators can assign the super admin role".to_owned(),
            ));
        }

        if user.holds_role(role_id) {
            return Err(AppError::Validation(format!(
                "user '{}' already holds role '{}'",
                user.email, role.name
            )));
        }

        self.repository
            .assign_role(user_id, role_id, AuditContext::new(actor, Some(reason)))
            .await
    }

    /// Detaches a role from a user.
    ///
    /// Stripping the super-admin role, from anyone including the actor
    /// themselves, is reserved to super administrators.
    pub async fn remove_role(
        &self,
        actor: &UserIdentity,
        user_id: Uuid,
        role_id: Uuid,
        reason: AuditReason,
    ) -> AppResult<UserAccessRecord> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::AssignRoles)
            .await?;

        let role = self.load_role(role_id).await?;
        let user = self.load_user(user_id).await?;

        if !user.holds_role(role_id) {
            return Err(AppError::Validation(format!(
                "user '{}' does not hold role '{}'",
                user.email, role.name
            )));
        }

        if role.slug.is_super_admin() && !self.actor_is_super_admin(actor).await? {
            return Err(AppError::Forbidden(
                "Only super administrators can remove the super admin role".to_owned(),
            ));
        }

        self.repository
            .remove_role(user_id, role_id, AuditContext::new(actor, Some(reason)))
            .await
    }

    /// Replaces a user's entire role set.
    pub async fn sync_roles(
        &self,
        actor: &UserIdentity,
        user_id: Uuid,
        role_ids: Vec<Uuid>,
        reason: AuditReason,
    ) -> AppResult<UserAccessRecord> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::AssignRoles)
            .await?;

        let user = self.load_user(user_id).await?;

        let mut distinct_role_ids: Vec<Uuid> = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            if !distinct_role_ids.contains(&role_id) {
                distinct_role_ids.push(role_id);
            }
        }

        let mut grants_super_admin = false;
        for role_id in &distinct_role_ids {
            let role = self.load_role(*role_id).await?;
            grants_super_admin = grants_super_admin || role.slug.is_super_admin();
        }

        if user.is_super_admin() != grants_super_admin
            && !self.actor_is_super_admin(actor).await?
        {
            let message = if grants_super_admin {
                "Only super administrators can assign the super admin role"
            } else {
                "Only super administrators can remove the super admin role"
            };
            return Err(AppError::Forbidden(message.to_owned()));
        }

        self.repository
            .replace_roles(
                user_id,
                &distinct_role_ids,
                AuditEventType::UserRolesSynced,
                AuditContext::new(actor, Some(reason)),
            )
            .await
    }

    /// Moves a user to exactly one replacement role.
    pub async fn update_user_role(
        &self,
        actor: &UserIdentity,
        user_id: Uuid,
        role_id: Uuid,
        reason: AuditReason,
    ) -> AppResult<UserAccessRecord> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::EditUsers)
            .await?;

        let role = self.load_role(role_id).await?;
        let user = self.load_user(user_id).await?;

        if role.slug.is_super_admin() && !self.actor_is_super_admin(actor).await? {
            return Err(AppError::Forbidden(
                "Only super administrators can assign super admin role".to_owned(),
            ));
        }

        if user.is_super_admin()
            && !role.slug.is_super_admin()
            && !self.actor_is_super_admin(actor).await?
        {
            return Err(AppError::Forbidden(
                "Only super administrators can remove the super admin role".to_owned(),
            ));
        }

        self.repository
            .replace_roles(
                user_id,
                &[role_id],
                AuditEventType::UserRoleChanged,
                AuditContext::new(actor, Some(reason)),
            )
            .await
    }
}
