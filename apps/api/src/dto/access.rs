use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use curanet_application::{
    ActorRef, AuditEntryRecord, AuditSummary, PermissionUsage, RoleRecord, RoleRef,
    RoleUpdateOutcome, SystemAccessStats, UserAccessRecord,
};
use curanet_domain::Permission;

/// Incoming payload for role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub hierarchy_level: Option<i32>,
    pub permissions: Vec<String>,
}

/// Incoming payload for role updates.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub hierarchy_level: Option<i32>,
    pub permissions: Vec<String>,
    pub reason: String,
}

/// Incoming payload for role status toggles.
#[derive(Debug, Deserialize)]
pub struct ToggleRoleStatusRequest {
    pub reason: Option<String>,
}

/// Incoming payload for role assignment.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Uuid,
    pub reason: String,
}

/// Incoming payload for role removal.
#[derive(Debug, Deserialize)]
pub struct RemoveRoleRequest {
    pub reason: String,
}

/// Incoming payload for full role replacement.
#[derive(Debug, Deserialize)]
pub struct SyncRolesRequest {
    pub role_ids: Vec<Uuid>,
    pub reason: String,
}

/// Incoming payload for single-role replacement.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRoleRequest {
    pub role_id: Uuid,
    pub reason: String,
}

/// Incoming payload for access revocation.
#[derive(Debug, Deserialize)]
pub struct RevokeAccessRequest {
    pub reason: String,
}

/// Incoming payload for marking an audit entry reviewed.
#[derive(Debug, Deserialize)]
pub struct ReviewAuditEntryRequest {
    pub review_notes: Option<String>,
}

/// Query parameters for the audit log listing.
#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub event_type: Option<String>,
    pub risk_level: Option<String>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Query parameters for the user directory.
#[derive(Debug, Deserialize)]
pub struct UserDirectoryParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub hierarchy_level: i32,
    pub is_active: bool,
    pub permissions: Vec<&'static str>,
    pub user_count: i64,
}

impl From<RoleRecord> for RoleResponse {
    fn from(role: RoleRecord) -> Self {
        Self {
            id: role.role_id,
            name: role.name,
            slug: role.slug.into(),
            description: role.description,
            hierarchy_level: role.hierarchy_level,
            is_active: role.is_active,
            permissions: role.permissions.iter().map(Permission::as_str).collect(),
            user_count: role.user_count,
        }
    }
}

/// API representation of a role update with its permission diff.
#[derive(Debug, Serialize)]
pub struct RoleUpdateResponse {
    pub role: RoleResponse,
    pub permissions_added: Vec<&'static str>,
    pub permissions_removed: Vec<&'static str>,
}

impl From<RoleUpdateOutcome> for RoleUpdateResponse {
    fn from(outcome: RoleUpdateOutcome) -> Self {
        Self {
            role: RoleResponse::from(outcome.role),
            permissions_added: outcome
                .permissions_added
                .iter()
                .map(Permission::as_str)
                .collect(),
            permissions_removed: outcome
                .permissions_removed
                .iter()
                .map(Permission::as_str)
                .collect(),
        }
    }
}

/// API representation of one catalog permission with its usage.
#[derive(Debug, Serialize)]
pub struct PermissionCatalogEntryResponse {
    pub slug: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub role_count: i64,
    pub roles: Vec<String>,
}

impl From<PermissionUsage> for PermissionCatalogEntryResponse {
    fn from(usage: PermissionUsage) -> Self {
        Self {
            slug: usage.permission.as_str(),
            label: usage.permission.label(),
            description: usage.permission.description(),
            role_count: usage.role_count,
            roles: usage.role_names,
        }
    }
}

/// API representation of a role held by a user.
#[derive(Debug, Serialize)]
pub struct RoleRefResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<&RoleRef> for RoleRefResponse {
    fn from(role: &RoleRef) -> Self {
        Self {
            id: role.role_id,
            name: role.name.clone(),
            slug: role.slug.as_str().to_owned(),
        }
    }
}

/// API representation of one user's access record.
#[derive(Debug, Serialize)]
pub struct UserAccessResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub roles: Vec<RoleRefResponse>,
    /// Highest-authority role name; dashboard routing only.
    pub primary_role: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<UserAccessRecord> for UserAccessResponse {
    fn from(user: UserAccessRecord) -> Self {
        let primary_role = user.primary_role().map(|role| role.name.clone());
        Self {
            id: user.user_id,
            name: user.name,
            email: user.email,
            is_active: user.is_active,
            roles: user.roles.iter().map(RoleRefResponse::from).collect(),
            primary_role,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// API representation of an audit actor.
#[derive(Debug, Serialize)]
pub struct AuditActorResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

impl From<ActorRef> for AuditActorResponse {
    fn from(actor: ActorRef) -> Self {
        Self {
            id: actor.user_id,
            name: actor.name,
            email: actor.email,
        }
    }
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize)]
pub struct AuditLogEntryResponse {
    pub id: i64,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: String,
    pub performed_by: AuditActorResponse,
    pub target_user_email: Option<String>,
    pub old_values: serde_json::Value,
    pub new_values: serde_json::Value,
    pub changes: serde_json::Value,
    pub reason: Option<String>,
    pub risk_level: &'static str,
    pub risk_factors: Vec<String>,
    pub requires_review: bool,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<AuditEntryRecord> for AuditLogEntryResponse {
    fn from(entry: AuditEntryRecord) -> Self {
        Self {
            id: entry.entry_id,
            event_type: entry.event_type,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            entity_name: entry.entity_name,
            performed_by: AuditActorResponse::from(entry.performed_by),
            target_user_email: entry.target_user.map(|target| target.email),
            old_values: entry.old_values,
            new_values: entry.new_values,
            changes: entry.changes,
            reason: entry.reason,
            risk_level: entry.risk_level.as_str(),
            risk_factors: entry.risk_factors,
            requires_review: entry.requires_review,
            reviewed_at: entry.reviewed_at,
            reviewed_by: entry.reviewed_by,
            metadata: entry.metadata,
            created_at: entry.created_at,
        }
    }
}

/// Summary block returned with audit listings.
#[derive(Debug, Serialize)]
pub struct AuditSummaryResponse {
    pub total_events: i64,
    pub recent_events: i64,
    pub high_risk_events: i64,
    pub pending_reviews: i64,
}

impl From<AuditSummary> for AuditSummaryResponse {
    fn from(summary: AuditSummary) -> Self {
        Self {
            total_events: summary.total_events,
            recent_events: summary.recent_events,
            high_risk_events: summary.high_risk_events,
            pending_reviews: summary.pending_reviews,
        }
    }
}

/// Audit listing envelope.
#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub audit_logs: super::common::Paginated<AuditLogEntryResponse>,
    pub summary: AuditSummaryResponse,
}

/// Security posture counts for the administrative dashboard.
#[derive(Debug, Serialize)]
pub struct SystemStatsResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub total_roles: i64,
    pub active_roles: i64,
    pub recent_audit_events: i64,
    pub high_risk_events: i64,
    pub pending_reviews: i64,
}

impl From<SystemAccessStats> for SystemStatsResponse {
    fn from(stats: SystemAccessStats) -> Self {
        Self {
            total_users: stats.total_users,
            active_users: stats.active_users,
            total_roles: stats.total_roles,
            active_roles: stats.active_roles,
            recent_audit_events: stats.recent_audit_events,
            high_risk_events: stats.high_risk_events,
            pending_reviews: stats.pending_reviews,
        }
    }
}
