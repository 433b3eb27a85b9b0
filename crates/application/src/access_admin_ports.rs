mod audit;
mod repositories;
mod roles;
mod users;

pub use audit::{
    ActorRef, AuditContext, AuditEntryRecord, AuditLogQuery, AuditLogView, AuditSummary, Page,
    SystemAccessStats, TargetUserRef,
};
pub use repositories::{AccessAdminRepository, AuditLogRepository};
pub use roles::{CreateRoleInput, PermissionUsage, RoleRecord, RoleUpdateOutcome, UpdateRoleInput};
pub use users::{DirectoryStats, RoleRef, UserAccessRecord, UserDirectoryQuery};
