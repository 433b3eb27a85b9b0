use std::str::FromStr;

use curanet_core::AppError;
use serde::{Deserialize, Serialize};

/// Permissions enforced by application policy checks.
///
/// The catalog is closed: every checkable capability is a variant here, so a
/// misspelled permission is a compile error rather than a silently failing
/// string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// Allows viewing the user directory.
    ViewUsers,
    /// Allows changing user role assignments via the user screens.
    EditUsers,
    /// Allows revoking user access.
    DeleteUsers,
    /// Allows attaching and detaching roles.
    AssignRoles,
    /// Allows creating custom roles.
    CreateRoles,
    /// Allows full role, permission, and audit administration.
    ManageRbac,
    /// Allows access-control dashboard administration.
    ManageAccessControl,
    /// Allows viewing product orders.
    ViewOrders,
    /// Allows managing product orders.
    ManageOrders,
    /// Allows viewing the product catalog.
    ViewProducts,
    /// Allows managing the product catalog.
    ManageProducts,
    /// Allows viewing financial data.
    ViewFinancials,
    /// Allows managing financial data.
    ManageFinancials,
    /// Allows viewing operational reports.
    ViewReports,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewUsers => "view-users",
            Self::EditUsers => "edit-users",
            Self::DeleteUsers => "delete-users",
            Self::AssignRoles => "assign-roles",
            Self::CreateRoles => "create-roles",
            Self::ManageRbac => "manage-rbac",
            Self::ManageAccessControl => "manage-access-control",
            Self::ViewOrders => "view-orders",
            Self::ManageOrders => "manage-orders",
            Self::ViewProducts => "view-products",
            Self::ManageProducts => "manage-products",
            Self::ViewFinancials => "view-financials",
            Self::ManageFinancials => "manage-financials",
            Self::ViewReports => "view-reports",
        }
    }

    /// Returns a human-readable label for administrative views.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ViewUsers => "View Users",
            Self::EditUsers => "Edit Users",
            Self::DeleteUsers => "Delete Users",
            Self::AssignRoles => "Assign Roles",
            Self::CreateRoles => "Create Roles",
            Self::ManageRbac => "Manage RBAC",
            Self::ManageAccessControl => "Manage Access Control",
            Self::ViewOrders => "View Orders",
            Self::ManageOrders => "Manage Orders",
            Self::ViewProducts => "View Products",
            Self::ManageProducts => "Manage Products",
            Self::ViewFinancials => "View Financials",
            Self::ManageFinancials => "Manage Financials",
            Self::ViewReports => "View Reports",
        }
    }

    /// Returns a short description for the permission catalog endpoint.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::ViewUsers => "Browse the user directory and individual access records",
            Self::EditUsers => "Change a user's role from the user management screens",
            Self::DeleteUsers => "Revoke a user's platform access",
            Self::AssignRoles => "Attach roles to and detach roles from users",
            Self::CreateRoles => "Create new custom roles",
            Self::ManageRbac => "Administer roles, permissions, and the security audit log",
            Self::ManageAccessControl => "Administer the access-control dashboard",
            Self::ViewOrders => "View wound-care product orders",
            Self::ManageOrders => "Create and update wound-care product orders",
            Self::ViewProducts => "View the wound-care product catalog",
            Self::ManageProducts => "Maintain the wound-care product catalog",
            Self::ViewFinancials => "View pricing and financial data",
            Self::ManageFinancials => "Maintain pricing and financial data",
            Self::ViewReports => "View operational reports",
        }
    }

    /// Returns true for permissions whose grant raises audit risk.
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        matches!(
            self,
            Self::ManageRbac
                | Self::AssignRoles
                | Self::DeleteUsers
                | Self::ManageAccessControl
                | Self::ManageFinancials
        )
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ViewUsers,
            Permission::EditUsers,
            Permission::DeleteUsers,
            Permission::AssignRoles,
            Permission::CreateRoles,
            Permission::ManageRbac,
            Permission::ManageAccessControl,
            Permission::ViewOrders,
            Permission::ManageOrders,
            Permission::ViewProducts,
            Permission::ManageProducts,
            Permission::ViewFinancials,
            Permission::ManageFinancials,
            Permission::ViewReports,
        ];

        ALL
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view-users" => Ok(Self::ViewUsers),
            "edit-users" => Ok(Self::EditUsers),
            "delete-users" => Ok(Self::DeleteUsers),
            "assign-roles" => Ok(Self::AssignRoles),
            "create-roles" => Ok(Self::CreateRoles),
            "manage-rbac" => Ok(Self::ManageRbac),
            "manage-access-control" => Ok(Self::ManageAccessControl),
            "view-orders" => Ok(Self::ViewOrders),
            "manage-orders" => Ok(Self::ManageOrders),
            "view-products" => Ok(Self::ViewProducts),
            "manage-products" => Ok(Self::ManageProducts),
            "view-financials" => Ok(Self::ViewFinancials),
            "manage-financials" => Ok(Self::ManageFinancials),
            "view-reports" => Ok(Self::ViewReports),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Permission;

    #[test]
    fn every_permission_roundtrips_through_storage_value() {
        for permission in Permission::all() {
            let restored = Permission::from_str(permission.as_str());
            assert_eq!(restored.ok(), Some(*permission));
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        let parsed = Permission::from_str("manage-everything");
        assert!(parsed.is_err());
    }

    #[test]
    fn rbac_administration_is_sensitive() {
        assert!(Permission::ManageRbac.is_sensitive());
        assert!(!Permission::ViewReports.is_sensitive());
    }
}
