use super::*;

use chrono::{DateTime, Utc};
use curanet_application::RoleRef;
use curanet_domain::{RiskSignals, assess_risk};

#[derive(Debug, FromRow)]
struct UserRow {
    user_id: Uuid,
    name: String,
    email: String,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct UserRoleRow {
    user_id: Uuid,
    role_id: Uuid,
    name: String,
    slug: String,
    hierarchy_level: i32,
}

impl UserRoleRow {
    fn into_role_ref(self) -> AppResult<RoleRef> {
        Ok(RoleRef {
            role_id: self.role_id,
            name: self.name,
            slug: parse_stored_slug(self.slug.as_str())?,
            hierarchy_level: self.hierarchy_level,
        })
    }
}

fn into_access_record(user: UserRow, roles: Vec<RoleRef>) -> UserAccessRecord {
    UserAccessRecord {
        user_id: user.user_id,
        name: user.name,
        email: user.email,
        is_active: user.is_active,
        roles,
        last_login_at: user.last_login_at,
        created_at: user.created_at,
    }
}

impl PostgresAccessAdminRepository {
    pub(super) async fn find_user_access_impl(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<UserAccessRecord>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id AS user_id, name, email, is_active, last_login_at, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("failed to load user", error))?;

        let Some(user) = user else {
            return Ok(None);
        };

        let role_rows = sqlx::query_as::<_, UserRoleRow>(
            r#"
            SELECT user_roles.user_id, roles.id AS role_id, roles.name, roles.slug,
                   roles.hierarchy_level
            FROM user_roles
            INNER JOIN roles ON roles.id = user_roles.role_id
            WHERE user_roles.user_id = $1
            ORDER BY roles.hierarchy_level, roles.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("failed to load user roles", error))?;

        let roles = role_rows
            .into_iter()
            .map(UserRoleRow::into_role_ref)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Some(into_access_record(user, roles)))
    }

    pub(super) async fn list_users_impl(
        &self,
        query: UserDirectoryQuery,
    ) -> AppResult<Page<UserAccessRecord>> {
        let per_page = if query.per_page == 0 {
            50
        } else {
            query.per_page.min(100)
        };
        let current_page = query.page.max(1);
        let offset = i64::from(current_page - 1) * i64::from(per_page);
        let role_slug = query.role_slug.as_ref().map(RoleSlug::as_str);

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::TEXT IS NULL
                    OR users.name ILIKE '%' || $1 || '%'
                    OR users.email ILIKE '%' || $1 || '%')
                AND ($2::TEXT IS NULL OR EXISTS (
                    SELECT 1
                    FROM user_roles
                    INNER JOIN roles ON roles.id = user_roles.role_id
                    WHERE user_roles.user_id = users.id AND roles.slug = $2
                ))
                AND ($3::BOOLEAN IS NULL OR users.is_active = $3)
            "#,
        )
        .bind(query.search.as_deref())
        .bind(role_slug)
        .bind(query.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| internal("failed to count users", error))?;

        let user_rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id AS user_id, name, email, is_active, last_login_at, created_at
            FROM users
            WHERE ($1::TEXT IS NULL
                    OR users.name ILIKE '%' || $1 || '%'
                    OR users.email ILIKE '%' || $1 || '%')
                AND ($2::TEXT IS NULL OR EXISTS (
                    SELECT 1
                    FROM user_roles
                    INNER JOIN roles ON roles.id = user_roles.role_id
                    WHERE user_roles.user_id = users.id AND roles.slug = $2
                ))
                AND ($3::BOOLEAN IS NULL OR users.is_active = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            OFFSET $5
            "#,
        )
        .bind(query.search.as_deref())
        .bind(role_slug)
        .bind(query.is_active)
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("failed to list users", error))?;

        let user_ids: Vec<Uuid> = user_rows.iter().map(|user| user.user_id).collect();
        let role_rows = sqlx::query_as::<_, UserRoleRow>(
            r#"
            SELECT user_roles.user_id, roles.id AS role_id, roles.name, roles.slug,
                   roles.hierarchy_level
            FROM user_roles
            INNER JOIN roles ON roles.id = user_roles.role_id
            WHERE user_roles.user_id = ANY($1)
            ORDER BY roles.hierarchy_level, roles.name
            "#,
        )
        .bind(&user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("failed to load user roles", error))?;

        let mut roles_by_user: std::collections::HashMap<Uuid, Vec<RoleRef>> =
            std::collections::HashMap::new();
        for row in role_rows {
            let user_id = row.user_id;
            roles_by_user
                .entry(user_id)
                .or_default()
                .push(row.into_role_ref()?);
        }

        let data = user_rows
            .into_iter()
            .map(|user| {
                let roles = roles_by_user.remove(&user.user_id).unwrap_or_default();
                into_access_record(user, roles)
            })
            .collect();

        let last_page = (total as u64).div_ceil(u64::from(per_page)).max(1) as u32;

        Ok(Page {
            data,
            current_page,
            last_page,
            per_page,
            total,
        })
    }

    pub(super) async fn assign_role_impl(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("failed to begin transaction", error))?;

        let user = lock_user(&mut transaction, user_id).await?;
        let role = lock_role(&mut transaction, role_id).await?;
        let role_slug = parse_stored_slug(role.slug.as_str())?;

        let already_held = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role_id = $2)",
        )
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| internal("failed to check assignment", error))?;

        if already_held {
            return Err(AppError::Validation(format!(
                "user '{}' already holds role '{}'",
                user.email, role.name
            )));
        }

        let old_roles = user_role_names_in_tx(&mut transaction, user_id).await?;
        let old_role_names: Vec<String> = old_roles.iter().map(|(name, _)| name.clone()).collect();

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("failed to persist assignment", error))?;

        let mut new_role_names = old_role_names.clone();
        new_role_names.push(role.name.clone());
        let total_roles_after = new_role_names.len();

        let risk = assess_risk(
            AuditEventType::UserRoleAssigned,
            &RiskSignals {
                touches_elevated_role: role_slug.is_system(),
                sensitive_permissions_granted: Vec::new(),
            },
        );

        insert_audit_entry(
            &mut transaction,
            PendingAuditEntry {
                event_type: AuditEventType::UserRoleAssigned,
                entity_type: "user_role_assignment",
                entity_id: user_id.to_string(),
                entity_name: user.name.clone(),
                actor: audit.actor,
                target_user: Some(TargetUserRef {
                    user_id,
                    email: user.email.clone(),
                }),
                old_values: serde_json::json!({ "roles": old_role_names }),
                new_values: serde_json::json!({ "roles": new_role_names }),
                changes: serde_json::json!({ "new_role": role.name.clone() }),
                reason: audit.reason.map(String::from),
                risk,
                metadata: serde_json::json!({
                    "role_assigned": role.name,
                    "total_roles_after": total_roles_after,
                }),
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("failed to commit transaction", error))?;

        self.find_user_access_impl(user_id)
            .await?
            .ok_or_else(|| AppError::Internal("assigned user disappeared".to_owned()))
    }

    pub(super) async fn remove_role_impl(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("failed to begin transaction", error))?;

        let user = lock_user(&mut transaction, user_id).await?;
        let role = lock_role(&mut transaction, role_id).await?;
        let role_slug = parse_stored_slug(role.slug.as_str())?;

        let old_roles = user_role_names_in_tx(&mut transaction, user_id).await?;
        let old_role_names: Vec<String> = old_roles.iter().map(|(name, _)| name.clone()).collect();

        let deleted = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("failed to delete assignment", error))?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::Validation(format!(
                "user '{}' does not hold role '{}'",
                user.email, role.name
            )));
        }

        let new_role_names: Vec<String> = old_role_names
            .iter()
            .filter(|name| *name != &role.name)
            .cloned()
            .collect();
        let total_roles_after = new_role_names.len();

        let risk = assess_risk(
            AuditEventType::UserRoleRemoved,
            &RiskSignals {
                touches_elevated_role: role_slug.is_system(),
                sensitive_permissions_granted: Vec::new(),
            },
        );

        insert_audit_entry(
            &mut transaction,
            PendingAuditEntry {
                event_type: AuditEventType::UserRoleRemoved,
                entity_type: "user_role_assignment",
                entity_id: user_id.to_string(),
                entity_name: user.name.clone(),
                actor: audit.actor,
                target_user: Some(TargetUserRef {
                    user_id,
                    email: user.email.clone(),
                }),
                old_values: serde_json::json!({ "roles": old_role_names }),
                new_values: serde_json::json!({ "roles": new_role_names }),
                changes: serde_json::json!({ "removed_role": role.name.clone() }),
                reason: audit.reason.map(String::from),
                risk,
                metadata: serde_json::json!({
                    "role_removed": role.name,
                    "total_roles_after": total_roles_after,
                }),
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("failed to commit transaction", error))?;

        self.find_user_access_impl(user_id)
            .await?
            .ok_or_else(|| AppError::Internal("updated user disappeared".to_owned()))
    }

    pub(super) async fn replace_roles_impl(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
        event_type: AuditEventType,
        audit: AuditContext,
    ) -> AppResult<UserAccessRecord> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("failed to begin transaction", error))?;

        let user = lock_user(&mut transaction, user_id).await?;

        let replacement_roles = sqlx::query_as::<_, (Uuid, String, String)>(
            r#"
            SELECT id, name, slug
            FROM roles
            WHERE id = ANY($1)
            ORDER BY hierarchy_level, name
            "#,
        )
        .bind(role_ids)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| internal("failed to resolve roles", error))?;

        if replacement_roles.len() != role_ids.len() {
            return Err(AppError::NotFound(
                "one or more roles were not found".to_owned(),
            ));
        }

        let old_roles = user_role_names_in_tx(&mut transaction, user_id).await?;
        let old_role_names: Vec<String> = old_roles.iter().map(|(name, _)| name.clone()).collect();
        let old_role_slugs: Vec<String> = old_roles.into_iter().map(|(_, slug)| slug).collect();

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("failed to clear assignments", error))?;

        for role_id in role_ids {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut *transaction)
                .await
                .map_err(|error| internal("failed to persist assignment", error))?;
        }

        let new_role_names: Vec<String> = replacement_roles
            .iter()
            .map(|(_, name, _)| name.clone())
            .collect();
        let new_role_slugs: Vec<String> = replacement_roles
            .iter()
            .map(|(_, _, slug)| slug.clone())
            .collect();

        let touches_elevated_role = elevated_membership_changed(&old_role_slugs, &new_role_slugs)?;
        let risk = assess_risk(
            event_type,
            &RiskSignals {
                touches_elevated_role,
                sensitive_permissions_granted: Vec::new(),
            },
        );

        let mut changes = serde_json::json!({
            "old_roles": old_role_names.clone(),
            "new_roles": new_role_names.clone(),
        });
        if event_type == AuditEventType::UserRoleChanged
            && let Some(changes_map) = changes.as_object_mut()
        {
            changes_map.insert(
                "new_role".to_owned(),
                serde_json::Value::from(new_role_names.first().cloned()),
            );
        }

        insert_audit_entry(
            &mut transaction,
            PendingAuditEntry {
                event_type,
                entity_type: "user_role_assignment",
                entity_id: user_id.to_string(),
                entity_name: user.name.clone(),
                actor: audit.actor,
                target_user: Some(TargetUserRef {
                    user_id,
                    email: user.email.clone(),
                }),
                old_values: serde_json::json!({ "roles": old_role_names }),
                new_values: serde_json::json!({ "roles": new_role_names }),
                changes,
                reason: audit.reason.map(String::from),
                risk,
                metadata: serde_json::json!({
                    "total_roles_after": role_ids.len(),
                }),
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("failed to commit transaction", error))?;

        self.find_user_access_impl(user_id)
            .await?
            .ok_or_else(|| AppError::Internal("updated user disappeared".to_owned()))
    }

    pub(super) async fn revoke_access_impl(
        &self,
        user_id: Uuid,
        audit: AuditContext,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("failed to begin transaction", error))?;

        let user = lock_user(&mut transaction, user_id).await?;

        let was_super_admin = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_roles
                INNER JOIN roles ON roles.id = user_roles.role_id
                WHERE user_roles.user_id = $1 AND roles.slug = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(curanet_domain::SUPER_ADMIN_ROLE_SLUG)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| internal("failed to check target roles", error))?;

        let reason_text = audit.reason.as_ref().map(|reason| reason.as_str().to_owned());
        let actor_id = audit.actor.user_id;

        sqlx::query(
            r#"
            UPDATE users
            SET is_active = FALSE,
                access_revoked_at = now(),
                access_revoked_reason = $2,
                access_revoked_by = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(reason_text.as_deref())
        .bind(actor_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| internal("failed to revoke access", error))?;

        let risk = assess_risk(
            AuditEventType::UserAccessRevoked,
            &RiskSignals {
                touches_elevated_role: was_super_admin,
                sensitive_permissions_granted: Vec::new(),
            },
        );

        insert_audit_entry(
            &mut transaction,
            PendingAuditEntry {
                event_type: AuditEventType::UserAccessRevoked,
                entity_type: "user",
                entity_id: user_id.to_string(),
                entity_name: user.name.clone(),
                actor: audit.actor,
                target_user: Some(TargetUserRef {
                    user_id,
                    email: user.email.clone(),
                }),
                old_values: serde_json::json!({ "is_active": user.is_active }),
                new_values: serde_json::json!({ "is_active": false }),
                changes: serde_json::json!({ "access": "revoked" }),
                reason: reason_text,
                risk,
                metadata: serde_json::json!({ "revoked_by": actor_id }),
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("failed to commit transaction", error))
    }
}

fn elevated_membership_changed(old_slugs: &[String], new_slugs: &[String]) -> AppResult<bool> {
    let changed = old_slugs
        .iter()
        .filter(|slug| !new_slugs.contains(slug))
        .chain(new_slugs.iter().filter(|slug| !old_slugs.contains(slug)));

    for slug in changed {
        if parse_stored_slug(slug.as_str())?.is_system() {
            return Ok(true);
        }
    }

    Ok(false)
}
