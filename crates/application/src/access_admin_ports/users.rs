use chrono::{DateTime, Utc};
use uuid::Uuid;

use curanet_domain::RoleSlug;

/// Reference to a role held by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    /// Stable role identifier.
    pub role_id: Uuid,
    /// Human-readable role name.
    pub name: String,
    /// Unique machine key.
    pub slug: RoleSlug,
    /// Authority ordering; lower values carry more authority.
    pub hierarchy_level: i32,
}

/// One user's access record as shown in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccessRecord {
    /// Stable user identifier.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Whether the user may use the platform.
    pub is_active: bool,
    /// Roles currently assigned.
    pub roles: Vec<RoleRef>,
    /// Last successful login, if any.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl UserAccessRecord {
    /// Returns true when the user holds the super-admin role.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.roles.iter().any(|role| role.slug.is_super_admin())
    }

    /// Returns true when the user holds the given role.
    #[must_use]
    pub fn holds_role(&self, role_id: Uuid) -> bool {
        self.roles.iter().any(|role| role.role_id == role_id)
    }

    /// Returns the highest-authority assigned role.
    ///
    /// Used only for dashboard routing; authorization decisions always go
    /// through the effective permission set.
    #[must_use]
    pub fn primary_role(&self) -> Option<&RoleRef> {
        self.roles.iter().min_by_key(|role| role.hierarchy_level)
    }
}

/// Filterable, paginated user directory query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDirectoryQuery {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub per_page: u32,
    /// Substring filter over name and email.
    pub search: Option<String>,
    /// Restrict to holders of this role.
    pub role_slug: Option<RoleSlug>,
    /// Restrict by active flag.
    pub is_active: Option<bool>,
}

/// Point-in-time user and role counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryStats {
    /// All users.
    pub total_users: i64,
    /// Users with platform access.
    pub active_users: i64,
    /// All roles.
    pub total_roles: i64,
    /// Roles currently active.
    pub active_roles: i64,
}
