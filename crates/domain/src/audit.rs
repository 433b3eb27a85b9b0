use std::str::FromStr;

use curanet_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::access::Permission;

/// Stable audit event types emitted by access-control mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Emitted when a custom role is created.
    RoleCreated,
    /// Emitted when a role's definition or permission set changes.
    RolePermissionsUpdated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when a role is activated.
    RoleEnabled,
    /// Emitted when a role is deactivated.
    RoleDisabled,
    /// Emitted when a role is attached to a user.
    UserRoleAssigned,
    /// Emitted when a role is detached from a user.
    UserRoleRemoved,
    /// Emitted when a user is moved to a single replacement role.
    UserRoleChanged,
    /// Emitted when a user's full role set is replaced.
    UserRolesSynced,
    /// Emitted when a user's platform access is revoked.
    UserAccessRevoked,
}

impl AuditEventType {
    /// Returns a stable storage value for this event type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "role_created",
            Self::RolePermissionsUpdated => "role_permissions_updated",
            Self::RoleDeleted => "role_deleted",
            Self::RoleEnabled => "role_enabled",
            Self::RoleDisabled => "role_disabled",
            Self::UserRoleAssigned => "user_role_assigned",
            Self::UserRoleRemoved => "user_role_removed",
            Self::UserRoleChanged => "user_role_changed",
            Self::UserRolesSynced => "user_roles_synced",
            Self::UserAccessRevoked => "user_access_revoked",
        }
    }

    /// Returns true for event types that always demand a manual review.
    #[must_use]
    pub fn is_review_sensitive(&self) -> bool {
        matches!(self, Self::UserAccessRevoked | Self::RoleDeleted)
    }
}

impl FromStr for AuditEventType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "role_created" => Ok(Self::RoleCreated),
            "role_permissions_updated" => Ok(Self::RolePermissionsUpdated),
            "role_deleted" => Ok(Self::RoleDeleted),
            "role_enabled" => Ok(Self::RoleEnabled),
            "role_disabled" => Ok(Self::RoleDisabled),
            "user_role_assigned" => Ok(Self::UserRoleAssigned),
            "user_role_removed" => Ok(Self::UserRoleRemoved),
            "user_role_changed" => Ok(Self::UserRoleChanged),
            "user_roles_synced" => Ok(Self::UserRolesSynced),
            "user_access_revoked" => Ok(Self::UserAccessRevoked),
            _ => Err(AppError::Validation(format!(
                "unknown audit event type '{value}'"
            ))),
        }
    }
}

/// Coarse sensitivity classification of one audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Routine, informational event.
    Low,
    /// Standard role, permission, or status change.
    Medium,
    /// Escalation-adjacent event requiring attention.
    High,
}

impl RiskLevel {
    /// Returns a stable storage value for this risk level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(AppError::Validation(format!(
                "unknown risk level '{value}'"
            ))),
        }
    }
}

/// Facts about a mutation that raise its audit risk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskSignals {
    /// The mutation touches the super-admin or admin role.
    pub touches_elevated_role: bool,
    /// Sensitive permissions granted by the mutation.
    pub sensitive_permissions_granted: Vec<Permission>,
}

/// Risk classification computed when an audit entry is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    /// Computed risk level.
    pub level: RiskLevel,
    /// Facts that produced the level.
    pub factors: Vec<String>,
    /// Whether the entry must be manually reviewed.
    pub requires_review: bool,
}

/// Classifies one mutation for the audit trail.
///
/// Elevated-role involvement and sensitive permission grants force `high`;
/// other role and access changes are `medium`; plain role creation is `low`.
#[must_use]
pub fn assess_risk(event_type: AuditEventType, signals: &RiskSignals) -> RiskAssessment {
    let mut factors = Vec::new();

    if signals.touches_elevated_role {
        factors.push("elevated role involved".to_owned());
    }

    for permission in &signals.sensitive_permissions_granted {
        factors.push(format!(
            "sensitive permission granted: {}",
            permission.as_str()
        ));
    }

    let level = if !factors.is_empty() {
        RiskLevel::High
    } else if matches!(event_type, AuditEventType::RoleCreated) {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    };

    let requires_review = level == RiskLevel::High || event_type.is_review_sensitive();

    RiskAssessment {
        level,
        factors,
        requires_review,
    }
}

/// Minimum length of a human-entered audit reason.
pub const AUDIT_REASON_MIN_LENGTH: usize = 10;

/// Maximum length of a human-entered audit reason.
pub const AUDIT_REASON_MAX_LENGTH: usize = 500;

/// Validated free-text justification attached to sensitive mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReason(String);

impl AuditReason {
    /// Creates a validated audit reason.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.len() < AUDIT_REASON_MIN_LENGTH {
            return Err(AppError::Validation(format!(
                "reason must be at least {AUDIT_REASON_MIN_LENGTH} characters"
            )));
        }

        if trimmed.len() > AUDIT_REASON_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "reason must not exceed {AUDIT_REASON_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the validated reason text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<AuditReason> for String {
    fn from(value: AuditReason) -> Self {
        value.0
    }
}
