use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use curanet_application::{
    ActorRef, AuditEntryRecord, AuditLogQuery, AuditLogRepository, AuditSummary, Page,
    TargetUserRef,
};
use curanet_core::{AppError, AppResult};
use curanet_domain::RiskLevel;

/// PostgreSQL-backed repository for the append-only audit trail.
///
/// Reads and the review stamp only; entries are written by the admin
/// repository inside mutation transactions.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditEntryRow {
    entry_id: i64,
    event_type: String,
    entity_type: String,
    entity_id: String,
    entity_name: String,
    performed_by: Uuid,
    performed_by_name: String,
    performed_by_email: Option<String>,
    target_user_id: Option<Uuid>,
    target_user_email: Option<String>,
    old_values: serde_json::Value,
    new_values: serde_json::Value,
    changes: serde_json::Value,
    reason: Option<String>,
    risk_level: String,
    risk_factors: serde_json::Value,
    requires_review: bool,
    reviewed_at: Option<DateTime<Utc>>,
    reviewed_by: Option<Uuid>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl AuditEntryRow {
    fn into_record(self) -> AppResult<AuditEntryRecord> {
        let risk_level = RiskLevel::from_str(self.risk_level.as_str()).map_err(|_| {
            AppError::Internal(format!("stored risk level '{}' is invalid", self.risk_level))
        })?;

        let risk_factors = match self.risk_factors {
            serde_json::Value::Array(values) => values
                .into_iter()
                .filter_map(|value| value.as_str().map(str::to_owned))
                .collect(),
            _ => Vec::new(),
        };

        let target_user = match (self.target_user_id, self.target_user_email) {
            (Some(user_id), Some(email)) => Some(TargetUserRef { user_id, email }),
            _ => None,
        };

        Ok(AuditEntryRecord {
            entry_id: self.entry_id,
            event_type: self.event_type,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            entity_name: self.entity_name,
            performed_by: ActorRef {
                user_id: self.performed_by,
                name: self.performed_by_name,
                email: self.performed_by_email,
            },
            target_user,
            old_values: self.old_values,
            new_values: self.new_values,
            changes: self.changes,
            reason: self.reason,
            risk_level,
            risk_factors,
            requires_review: self.requires_review,
            reviewed_at: self.reviewed_at,
            reviewed_by: self.reviewed_by,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Page<AuditEntryRecord>> {
        let per_page = if query.per_page == 0 {
            20
        } else {
            query.per_page.min(200)
        };
        let current_page = query.page.max(1);
        let offset = i64::from(current_page - 1) * i64::from(per_page);
        let event_type = query.event_type.map(|event_type| event_type.as_str());
        let risk_level = query.risk_level.map(|risk_level| risk_level.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM rbac_audit_log
            WHERE ($1::TEXT IS NULL OR event_type = $1)
                AND ($2::TEXT IS NULL OR risk_level = $2)
                AND ($3::UUID IS NULL OR performed_by = $3)
                AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
                AND ($5::TIMESTAMPTZ IS NULL OR created_at <= $5)
            "#,
        )
        .bind(event_type)
        .bind(risk_level)
        .bind(query.performed_by)
        .bind(query.created_after)
        .bind(query.created_before)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count audit entries: {error}")))?;

        let rows = sqlx::query_as::<_, AuditEntryRow>(
            r#"
            SELECT
                id AS entry_id, event_type, entity_type, entity_id, entity_name,
                performed_by, performed_by_name, performed_by_email,
                target_user_id, target_user_email,
                old_values, new_values, changes, reason,
                risk_level, risk_factors, requires_review,
                reviewed_at, reviewed_by, metadata, created_at
            FROM rbac_audit_log
            WHERE ($1::TEXT IS NULL OR event_type = $1)
                AND ($2::TEXT IS NULL OR risk_level = $2)
                AND ($3::UUID IS NULL OR performed_by = $3)
                AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
                AND ($5::TIMESTAMPTZ IS NULL OR created_at <= $5)
            ORDER BY created_at DESC, id DESC
            LIMIT $6
            OFFSET $7
            "#,
        )
        .bind(event_type)
        .bind(risk_level)
        .bind(query.performed_by)
        .bind(query.created_after)
        .bind(query.created_before)
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit entries: {error}")))?;

        let data = rows
            .into_iter()
            .map(AuditEntryRow::into_record)
            .collect::<AppResult<Vec<_>>>()?;

        let last_page = (total as u64).div_ceil(u64::from(per_page)).max(1) as u32;

        Ok(Page {
            data,
            current_page,
            last_page,
            per_page,
            total,
        })
    }

    async fn summary(&self, recent_days: i64) -> AppResult<AuditSummary> {
        let row = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM rbac_audit_log),
                (SELECT COUNT(*) FROM rbac_audit_log
                    WHERE created_at >= now() - make_interval(days => $1::INT)),
                (SELECT COUNT(*) FROM rbac_audit_log WHERE risk_level = 'high'),
                (SELECT COUNT(*) FROM rbac_audit_log
                    WHERE requires_review AND reviewed_at IS NULL)
            "#,
        )
        .bind(recent_days as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load audit summary: {error}")))?;

        Ok(AuditSummary {
            total_events: row.0,
            recent_events: row.1,
            high_risk_events: row.2,
            pending_reviews: row.3,
        })
    }

    async fn mark_reviewed(
        &self,
        entry_id: i64,
        reviewer: ActorRef,
        notes: Option<String>,
    ) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE rbac_audit_log
            SET reviewed_at = now(),
                reviewed_by = $2,
                metadata = metadata || CASE
                    WHEN $3::TEXT IS NULL THEN '{}'::jsonb
                    ELSE jsonb_build_object('review_notes', $3::TEXT)
                END
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .bind(reviewer.user_id)
        .bind(notes)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to mark entry reviewed: {error}")))?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "audit entry '{entry_id}' was not found"
            )));
        }

        Ok(())
    }
}
