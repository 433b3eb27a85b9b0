use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use curanet_core::{AppError, NonEmptyString, UserIdentity};
use curanet_domain::{AuditReason, Permission, RoleSlug};

use crate::dto::{
    AssignRoleRequest, AuditLogParams, AuditLogResponse, AuditSummaryResponse, CreateRoleRequest,
    GenericMessageResponse, Paginated, PermissionCatalogEntryResponse, RemoveRoleRequest,
    ReviewAuditEntryRequest, RevokeAccessRequest, RoleResponse, RoleUpdateResponse,
    SyncRolesRequest, SystemStatsResponse, ToggleRoleStatusRequest, UpdateRoleRequest,
    UpdateUserRoleRequest, UserAccessResponse, UserDirectoryParams,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod assignments;
mod audit;
mod roles;
mod users;

pub use assignments::{
    assign_role_handler, remove_role_handler, sync_roles_handler, update_user_role_handler,
};
pub use audit::{list_audit_log_handler, review_audit_entry_handler, system_stats_handler};
pub use roles::{
    create_role_handler, delete_role_handler, get_role_handler, list_permissions_handler,
    list_roles_handler, toggle_role_status_handler, update_role_handler,
};
pub use users::{get_user_handler, list_users_handler, revoke_access_handler};

const DEFAULT_HIERARCHY_LEVEL: i32 = 100;

fn parse_permissions(values: &[String]) -> Result<Vec<Permission>, AppError> {
    values
        .iter()
        .map(|value| Permission::from_transport(value.as_str()))
        .collect()
}
