use async_trait::async_trait;
use uuid::Uuid;

use curanet_core::AppResult;
use curanet_domain::AuditEventType;

use super::audit::{ActorRef, AuditContext, AuditEntryRecord, AuditLogQuery, AuditSummary, Page};
use super::roles::{CreateRoleInput, PermissionUsage, RoleRecord, RoleUpdateOutcome, UpdateRoleInput};
use super::users::{DirectoryStats, UserAccessRecord, UserDirectoryQuery};

/// Repository port for role, assignment, and revocation administration.
///
/// Every mutating method writes its audit entry in the same transaction as
/// the mutation; when the audit write fails the mutation rolls back. Role
/// mutations lock the role row so concurrent edits serialize.
#[async_trait]
pub trait AccessAdminRepository: Send + Sync {
    /// Lists all roles with permissions and holder counts.
    async fn list_roles(&self) -> AppResult<Vec<RoleRecord>>;

    /// Loads one role, or `None` when it does not exist.
    async fn get_role(&self, role_id: Uuid) -> AppResult<Option<RoleRecord>>;

    /// Reports catalog permission usage across roles.
    async fn permission_usage(&self) -> AppResult<Vec<PermissionUsage>>;

    /// Creates a role with its grants.
    async fn create_role(
        &self,
        input: CreateRoleInput,
        audit: AuditContext,
    ) -> AppResult<RoleRecord>;

    /// Updates a role's definition and replaces its permission set.
    async fn update_role(
        &self,
        role_id: Uuid,
        input: UpdateRoleInput,
        audit: AuditContext,
    ) -> AppResult<RoleUpdateOutcome>;

    /// Deletes a role that no user holds.
    async fn delete_role(&self, role_id: Uuid, audit: AuditContext) -> AppResult<()>;

    /// Activates or deactivates a role.
    async fn set_role_status(
        &self,
        role_id: Uuid,
        is_active: bool,
        audit: AuditContext,
    ) -> AppResult<RoleRecord>;

    /// Loads one user's access record, or `None` when the user does not exist.
    async fn find_user_access(&self, user_id: Uuid) -> AppResult<Option<UserAccessRecord>>;

    /// Lists the user directory.
    async fn list_users(&self, query: UserDirectoryQuery) -> AppResult<Page<UserAccessRecord>>;

    /// Attaches a role to a user.
    async fn assign_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord>;

    /// Detaches a role from a user.
    async fn remove_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord>;

    /// Replaces a user's role set; `event_type` distinguishes single-role
    /// replacement from a full sync in the audit trail.
    async fn replace_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
        event_type: AuditEventType,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord>;

    /// Revokes a user's platform access with revocation metadata.
    async fn revoke_access(&self, user_id: Uuid, audit: AuditContext) -> AppResult<()>;

    /// Reports point-in-time user and role counts.
    async fn directory_stats(&self) -> AppResult<DirectoryStats>;
}

/// Repository port for reading and reviewing the audit trail.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists entries newest-first, filtered and paginated.
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Page<AuditEntryRecord>>;

    /// Aggregates counts over the trail; `recent_days` bounds the recency
    /// window.
    async fn summary(&self, recent_days: i64) -> AppResult<AuditSummary>;

    /// Stamps one entry as reviewed, last write wins.
    async fn mark_reviewed(
        &self,
        entry_id: i64,
        reviewer: ActorRef,
        notes: Option<String>,
    ) -> AppResult<()>;
}
