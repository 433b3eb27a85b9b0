mod access;
mod auth;
mod common;

pub use access::{
    AssignRoleRequest, AuditActorResponse, AuditLogEntryResponse, AuditLogParams,
    AuditLogResponse, AuditSummaryResponse, CreateRoleRequest, PermissionCatalogEntryResponse,
    RemoveRoleRequest, ReviewAuditEntryRequest, RevokeAccessRequest, RoleRefResponse,
    RoleResponse, RoleUpdateResponse, SyncRolesRequest, SystemStatsResponse,
    ToggleRoleStatusRequest, UpdateRoleRequest, UpdateUserRoleRequest, UserAccessResponse,
    UserDirectoryParams,
};
pub use auth::{BootstrapRequest, LoginRequest, UserIdentityResponse};
pub use common::{GenericMessageResponse, HealthResponse, PageMeta, Paginated};
