use super::*;

use crate::access_admin_ports::{
    ActorRef, AuditLogQuery, AuditLogView, SystemAccessStats,
};

/// Recency window for "recent events" counts.
const RECENT_EVENT_WINDOW_DAYS: i64 = 7;

const REVIEW_NOTES_MAX_LENGTH: usize = 1_000;

impl AccessAdminService {
    /// Returns the filtered audit trail with its summary block.
    pub async fn list_audit_log(
        &self,
        actor: &UserIdentity,
        query: AuditLogQuery,
    ) -> AppResult<AuditLogView> {
        self.require_rbac_manage(actor).await?;

        let entries = self.audit_log_repository.list_entries(query).await?;
        let summary = self
            .audit_log_repository
            .summary(RECENT_EVENT_WINDOW_DAYS)
            .await?;

        Ok(AuditLogView { entries, summary })
    }

    /// Stamps one audit entry as reviewed; re-marking overwrites the stamp.
    pub async fn mark_reviewed(
        &self,
        actor: &UserIdentity,
        entry_id: i64,
        notes: Option<String>,
    ) -> AppResult<()> {
        self.require_rbac_manage(actor).await?;

        if let Some(ref notes) = notes
            && notes.len() > REVIEW_NOTES_MAX_LENGTH
        {
            return Err(AppError::Validation(format!(
                "review notes must not exceed {REVIEW_NOTES_MAX_LENGTH} characters"
            )));
        }

        self.audit_log_repository
            .mark_reviewed(entry_id, ActorRef::from(actor), notes)
            .await
    }

    /// Returns security posture counts for the administrative dashboard.
    pub async fn system_stats(&self, actor: &UserIdentity) -> AppResult<SystemAccessStats> {
        self.require_rbac_manage(actor).await?;

        let directory = self.repository.directory_stats().await?;
        let audit = self
            .audit_log_repository
            .summary(RECENT_EVENT_WINDOW_DAYS)
            .await?;

        Ok(SystemAccessStats {
            total_users: directory.total_users,
            active_users: directory.active_users,
            total_roles: directory.total_roles,
            active_roles: directory.active_roles,
            recent_audit_events: audit.recent_events,
            high_risk_events: audit.high_risk_events,
            pending_reviews: audit.pending_reviews,
        })
    }
}
