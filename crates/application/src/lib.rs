//! Application services and the ports they depend on.

#![forbid(unsafe_code)]

mod access_admin_ports;
mod access_admin_service;
mod auth_service;
mod authorization_service;

pub use access_admin_ports::{
    AccessAdminRepository, ActorRef, AuditContext, AuditEntryRecord, AuditLogQuery,
    AuditLogRepository, AuditLogView, AuditSummary, CreateRoleInput, DirectoryStats, Page,
    PermissionUsage, RoleRecord, RoleRef, RoleUpdateOutcome, SystemAccessStats, TargetUserRef,
    UpdateRoleInput, UserAccessRecord, UserDirectoryQuery,
};
pub use access_admin_service::AccessAdminService;
pub use auth_service::{
    AuthOutcome, AuthService, PasswordHasher, UserAuthRepository, UserCredentials,
};
pub use authorization_service::{AccessProfile, AuthorizationRepository, AuthorizationService};
