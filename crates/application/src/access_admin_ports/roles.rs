use uuid::Uuid;

use curanet_core::NonEmptyString;
use curanet_domain::{Permission, RoleSlug};

/// Role definition returned to callers, with its resolved permission set and
/// a point-in-time holder count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Stable role identifier.
    pub role_id: Uuid,
    /// Human-readable role name.
    pub name: String,
    /// Unique machine key.
    pub slug: RoleSlug,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Authority ordering; lower values carry more authority.
    pub hierarchy_level: i32,
    /// Soft gate: permissions of inactive roles are not effective.
    pub is_active: bool,
    /// Effective role grants.
    pub permissions: Vec<Permission>,
    /// Number of users holding the role when the record was read.
    pub user_count: i64,
}

/// Input payload for creating roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Human-readable role name.
    pub name: NonEmptyString,
    /// Unique machine key.
    pub slug: RoleSlug,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Authority ordering; lower values carry more authority.
    pub hierarchy_level: i32,
    /// Grants to attach to the role.
    pub permissions: Vec<Permission>,
}

/// Input payload for updating a role's definition and permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// Human-readable role name.
    pub name: NonEmptyString,
    /// Unique machine key.
    pub slug: RoleSlug,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Authority ordering; lower values carry more authority.
    pub hierarchy_level: i32,
    /// Replacement permission set.
    pub permissions: Vec<Permission>,
}

/// Result of a role update, with the permission diff recorded in the audit
/// trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleUpdateOutcome {
    /// The refreshed role.
    pub role: RoleRecord,
    /// Permissions granted by this update.
    pub permissions_added: Vec<Permission>,
    /// Permissions withdrawn by this update.
    pub permissions_removed: Vec<Permission>,
}

/// Usage of one catalog permission across roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionUsage {
    /// The catalog permission.
    pub permission: Permission,
    /// Number of roles granting it.
    pub role_count: i64,
    /// Names of the roles granting it.
    pub role_names: Vec<String>,
}
