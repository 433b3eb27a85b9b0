//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod audit;
mod role;
mod user;

pub use access::Permission;
pub use audit::{
    AUDIT_REASON_MAX_LENGTH, AUDIT_REASON_MIN_LENGTH, AuditEventType, AuditReason, RiskAssessment,
    RiskLevel, RiskSignals, assess_risk,
};
pub use role::{ADMIN_ROLE_SLUG, RoleSlug, SUPER_ADMIN_ROLE_SLUG};
pub use user::{EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, validate_password};
