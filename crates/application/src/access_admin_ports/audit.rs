use chrono::{DateTime, Utc};
use uuid::Uuid;

use curanet_core::UserIdentity;
use curanet_domain::{AuditEventType, AuditReason, RiskLevel};

/// Denormalized reference to the acting user, stored with each audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRef {
    /// Stable user identifier.
    pub user_id: Uuid,
    /// Display name at the time of the action.
    pub name: String,
    /// Email at the time of the action.
    pub email: Option<String>,
}

impl From<&UserIdentity> for ActorRef {
    fn from(identity: &UserIdentity) -> Self {
        Self {
            user_id: identity.user_id(),
            name: identity.display_name().to_owned(),
            email: identity.email().map(str::to_owned),
        }
    }
}

/// Denormalized reference to the user a mutation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUserRef {
    /// Stable user identifier.
    pub user_id: Uuid,
    /// Email at the time of the action.
    pub email: String,
}

/// Actor and justification attached to one audited mutation.
///
/// The repository writes the mutation and its audit entry in a single
/// transaction; this context supplies the who and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    /// The acting user.
    pub actor: ActorRef,
    /// Free-text justification, required for sensitive mutations.
    pub reason: Option<AuditReason>,
}

impl AuditContext {
    /// Creates an audit context from the session identity.
    #[must_use]
    pub fn new(actor: &UserIdentity, reason: Option<AuditReason>) -> Self {
        Self {
            actor: ActorRef::from(actor),
            reason,
        }
    }
}

/// One persisted, immutable audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntryRecord {
    /// Monotonic entry identifier; stable tie-break for ordering.
    pub entry_id: i64,
    /// Stored event type value.
    pub event_type: String,
    /// Mutated entity kind (`role`, `user`, `user_role_assignment`).
    pub entity_type: String,
    /// Mutated entity identifier.
    pub entity_id: String,
    /// Mutated entity name at write time.
    pub entity_name: String,
    /// The acting user.
    pub performed_by: ActorRef,
    /// The targeted user, for user-directed events.
    pub target_user: Option<TargetUserRef>,
    /// Structured snapshot before the mutation.
    pub old_values: serde_json::Value,
    /// Structured snapshot after the mutation.
    pub new_values: serde_json::Value,
    /// Human-oriented diff summary.
    pub changes: serde_json::Value,
    /// Free-text justification.
    pub reason: Option<String>,
    /// Risk level computed at write time.
    pub risk_level: RiskLevel,
    /// Facts that produced the risk level.
    pub risk_factors: Vec<String>,
    /// Whether a manual review is demanded.
    pub requires_review: bool,
    /// Review timestamp, once marked.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reviewing user, once marked.
    pub reviewed_by: Option<Uuid>,
    /// Open metadata map.
    pub metadata: serde_json::Value,
    /// Entry creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Filterable, paginated audit log query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub per_page: u32,
    /// Restrict to one event type.
    pub event_type: Option<AuditEventType>,
    /// Restrict to one risk level.
    pub risk_level: Option<RiskLevel>,
    /// Restrict to entries performed by this user.
    pub performed_by: Option<Uuid>,
    /// Restrict to entries created at or after this instant.
    pub created_after: Option<DateTime<Utc>>,
    /// Restrict to entries created at or before this instant.
    pub created_before: Option<DateTime<Utc>>,
}

/// One page of results with collection metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Rows on this page.
    pub data: Vec<T>,
    /// 1-based page number.
    pub current_page: u32,
    /// Last available page (at least 1).
    pub last_page: u32,
    /// Rows per page.
    pub per_page: u32,
    /// Total matching rows.
    pub total: i64,
}

impl<T> Page<T> {
    /// Maps page rows while keeping the collection metadata.
    #[must_use]
    pub fn map<U>(self, transform: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(transform).collect(),
            current_page: self.current_page,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// Aggregate counts over the audit trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    /// All recorded entries.
    pub total_events: i64,
    /// Entries within the recency window.
    pub recent_events: i64,
    /// High-risk entries.
    pub high_risk_events: i64,
    /// Entries requiring review that have not been reviewed.
    pub pending_reviews: i64,
}

/// Audit listing plus its summary block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogView {
    /// The filtered page of entries.
    pub entries: Page<AuditEntryRecord>,
    /// Counts over the whole trail.
    pub summary: AuditSummary,
}

/// Security posture counts for the administrative dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAccessStats {
    /// All users.
    pub total_users: i64,
    /// Users with platform access.
    pub active_users: i64,
    /// All roles.
    pub total_roles: i64,
    /// Roles currently active.
    pub active_roles: i64,
    /// Audit entries within the last seven days.
    pub recent_audit_events: i64,
    /// High-risk audit entries.
    pub high_risk_events: i64,
    /// Unreviewed entries requiring review.
    pub pending_reviews: i64,
}
