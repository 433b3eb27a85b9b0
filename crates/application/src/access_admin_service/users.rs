use super::*;

use curanet_domain::AuditReason;

use crate::access_admin_ports::{AuditContext, Page, UserDirectoryQuery};

impl AccessAdminService {
    /// Returns the filterable user directory.
    pub async fn list_users(
        &self,
        actor: &UserIdentity,
        query: UserDirectoryQuery,
    ) -> AppResult<Page<UserAccessRecord>> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ViewUsers)
            .await?;

        self.repository.list_users(query).await
    }

    /// Returns one user's access record.
    pub async fn get_user_access(
        &self,
        actor: &UserIdentity,
        user_id: Uuid,
    ) -> AppResult<UserAccessRecord> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ViewUsers)
            .await?;

        self.load_user(user_id).await
    }

    /// Revokes a user's platform access.
    ///
    /// Self-revocation is always refused; revoking a super administrator is
    /// reserved to super administrators.
    pub async fn revoke_access(
        &self,
        actor: &UserIdentity,
        user_id: Uuid,
        reason: AuditReason,
    ) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::DeleteUsers)
            .await?;

        if user_id == actor.user_id() {
            return Err(AppError::Forbidden(
                "You cannot revoke your own access".to_owned(),
            ));
        }

        let user = self.load_user(user_id).await?;
        if user.is_super_admin() && !self.actor_is_super_admin(actor).await? {
            return Err(AppError::Forbidden(
                "Only super administrators can revoke super admin access".to_owned(),
            ));
        }

        self.repository
            .revoke_access(user_id, AuditContext::new(actor, Some(reason)))
            .await
    }
}
