use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use curanet_application::{
    AccessAdminRepository, ActorRef, AuditContext, CreateRoleInput, DirectoryStats, Page,
    PermissionUsage, RoleRecord, RoleUpdateOutcome, TargetUserRef, UpdateRoleInput,
    UserAccessRecord, UserDirectoryQuery,
};
use curanet_core::{AppError, AppResult};
use curanet_domain::{AuditEventType, Permission, RiskAssessment, RoleSlug};

mod roles;
mod users;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for access-control administration.
///
/// Every mutation and its audit entry share one transaction; the mutated
/// role or user row is locked `FOR UPDATE` so concurrent edits serialize.
#[derive(Clone)]
pub struct PostgresAccessAdminRepository {
    pool: PgPool,
}

impl PostgresAccessAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    hierarchy_level: i32,
    is_active: bool,
    permissions: Vec<String>,
    user_count: i64,
}

impl RoleRow {
    fn into_record(self) -> AppResult<RoleRecord> {
        Ok(RoleRecord {
            role_id: self.role_id,
            name: self.name,
            slug: parse_stored_slug(self.slug.as_str())?,
            description: self.description,
            hierarchy_level: self.hierarchy_level,
            is_active: self.is_active,
            permissions: parse_stored_permissions(&self.permissions),
            user_count: self.user_count,
        })
    }
}

#[derive(Debug, FromRow)]
struct LockedRoleRow {
    name: String,
    slug: String,
    description: Option<String>,
    hierarchy_level: i32,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct LockedUserRow {
    name: String,
    email: String,
    is_active: bool,
}

fn internal(context: &str, error: sqlx::Error) -> AppError {
    AppError::Internal(format!("{context}: {error}"))
}

fn parse_stored_slug(value: &str) -> AppResult<RoleSlug> {
    RoleSlug::new(value)
        .map_err(|_| AppError::Internal(format!("stored role slug '{value}' is invalid")))
}

fn parse_stored_permissions(values: &[String]) -> Vec<Permission> {
    let mut permissions: Vec<Permission> = values
        .iter()
        .filter_map(|value| match Permission::from_str(value.as_str()) {
            Ok(permission) => Some(permission),
            Err(_) => {
                tracing::warn!(permission = %value, "skipping unknown stored permission");
                None
            }
        })
        .collect();
    permissions.sort();
    permissions.dedup();
    permissions
}

fn permission_slugs(permissions: &[Permission]) -> Vec<&'static str> {
    permissions.iter().map(Permission::as_str).collect()
}

fn deduped(permissions: Vec<Permission>) -> Vec<Permission> {
    let mut permissions = permissions;
    permissions.sort();
    permissions.dedup();
    permissions
}

fn permission_diff(
    old: &[Permission],
    new: &[Permission],
) -> (Vec<Permission>, Vec<Permission>) {
    let old_set: BTreeSet<Permission> = old.iter().copied().collect();
    let new_set: BTreeSet<Permission> = new.iter().copied().collect();
    let added = new_set.difference(&old_set).copied().collect();
    let removed = old_set.difference(&new_set).copied().collect();
    (added, removed)
}

fn map_slug_conflict(error: sqlx::Error, slug: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.is_unique_violation()
    {
        return AppError::Conflict(format!("role slug '{slug}' already exists"));
    }

    internal("failed to persist role", error)
}

/// One audit entry ready to be written alongside its mutation.
struct PendingAuditEntry {
    event_type: AuditEventType,
    entity_type: &'static str,
    entity_id: String,
    entity_name: String,
    actor: ActorRef,
    target_user: Option<TargetUserRef>,
    old_values: serde_json::Value,
    new_values: serde_json::Value,
    changes: serde_json::Value,
    reason: Option<String>,
    risk: RiskAssessment,
    metadata: serde_json::Value,
}

async fn insert_audit_entry(
    transaction: &mut Transaction<'_, Postgres>,
    entry: PendingAuditEntry,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO rbac_audit_log (
            event_type, entity_type, entity_id, entity_name,
            performed_by, performed_by_name, performed_by_email,
            target_user_id, target_user_email,
            old_values, new_values, changes, reason,
            risk_level, risk_factors, requires_review, metadata
        )
        VALUES (
            $1, $2, $3, $4,
            $5, $6, $7,
            $8, $9,
            $10, $11, $12, $13,
            $14, $15, $16, $17
        )
        "#,
    )
    .bind(entry.event_type.as_str())
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.entity_name)
    .bind(entry.actor.user_id)
    .bind(entry.actor.name)
    .bind(entry.actor.email)
    .bind(entry.target_user.as_ref().map(|target| target.user_id))
    .bind(entry.target_user.map(|target| target.email))
    .bind(entry.old_values)
    .bind(entry.new_values)
    .bind(entry.changes)
    .bind(entry.reason)
    .bind(entry.risk.level.as_str())
    .bind(serde_json::Value::from(entry.risk.factors))
    .bind(entry.risk.requires_review)
    .bind(entry.metadata)
    .execute(&mut **transaction)
    .await
    .map_err(|error| internal("failed to append audit entry", error))?;

    Ok(())
}

async fn lock_role(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: Uuid,
) -> AppResult<LockedRoleRow> {
    sqlx::query_as::<_, LockedRoleRow>(
        r#"
        SELECT name, slug, description, hierarchy_level, is_active
        FROM roles
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(role_id)
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| internal("failed to lock role", error))?
    .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
}

async fn lock_user(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> AppResult<LockedUserRow> {
    sqlx::query_as::<_, LockedUserRow>(
        r#"
        SELECT name, email, is_active
        FROM users
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| internal("failed to lock user", error))?
    .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
}

async fn role_permissions_in_tx(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: Uuid,
) -> AppResult<Vec<Permission>> {
    let stored = sqlx::query_scalar::<_, String>(
        r#"
        SELECT permission
        FROM role_permissions
        WHERE role_id = $1
        ORDER BY permission
        "#,
    )
    .bind(role_id)
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| internal("failed to load role permissions", error))?;

    Ok(parse_stored_permissions(&stored))
}

async fn role_user_count_in_tx(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: Uuid,
) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM user_roles
        WHERE role_id = $1
        "#,
    )
    .bind(role_id)
    .fetch_one(&mut **transaction)
    .await
    .map_err(|error| internal("failed to count role holders", error))
}

async fn user_role_names_in_tx(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> AppResult<Vec<(String, String)>> {
    let rows = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT roles.name, roles.slug
        FROM user_roles
        INNER JOIN roles ON roles.id = user_roles.role_id
        WHERE user_roles.user_id = $1
        ORDER BY roles.hierarchy_level, roles.name
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| internal("failed to load user roles", error))?;

    Ok(rows)
}

#[async_trait]
impl AccessAdminRepository for PostgresAccessAdminRepository {
    async fn list_roles(&self) -> AppResult<Vec<RoleRecord>> {
        self.list_roles_impl().await
    }

    async fn get_role(&self, role_id: Uuid) -> AppResult<Option<RoleRecord>> {
        self.get_role_impl(role_id).await
    }

    async fn permission_usage(&self) -> AppResult<Vec<PermissionUsage>> {
        self.permission_usage_impl().await
    }

    async fn create_role(
        &self,
        input: CreateRoleInput,
        audit: AuditContext,
    ) -> AppResult<RoleRecord> {
        self.create_role_impl(input, audit).await
    }

    async fn update_role(
        &self,
        role_id: Uuid,
        input: UpdateRoleInput,
        audit: AuditContext,
    ) -> AppResult<RoleUpdateOutcome> {
        self.update_role_impl(role_id, input, audit).await
    }

    async fn delete_role(&self, role_id: Uuid, audit: AuditContext) -> AppResult<()> {
        self.delete_role_impl(role_id, audit).await
    }

    async fn set_role_status(
        &self,
        role_id: Uuid,
        is_active: bool,
        audit: AuditContext,
    ) -> AppResult<RoleRecord> {
        self.set_role_status_impl(role_id, is_active, audit).await
    }

    async fn find_user_access(&self, user_id: Uuid) -> AppResult<Option<UserAccessRecord>> {
        self.find_user_access_impl(user_id).await
    }

    async fn list_users(&self, query: UserDirectoryQuery) -> AppResult<Page<UserAccessRecord>> {
        self.list_users_impl(query).await
    }

    async fn assign_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord> {
        self.assign_role_impl(user_id, role_id, audit).await
    }

    async fn remove_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord> {
        self.remove_role_impl(user_id, role_id, audit).await
    }

    async fn replace_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
        event_type: AuditEventType,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord> {
        self.replace_roles_impl(user_id, role_ids, event_type, audit)
            .await
    }

    async fn revoke_access(&self, user_id: Uuid, audit: AuditContext) -> AppResult<()> {
        self.revoke_access_impl(user_id, audit).await
    }

    async fn directory_stats(&self) -> AppResult<DirectoryStats> {
        self.directory_stats_impl().await
    }
}
