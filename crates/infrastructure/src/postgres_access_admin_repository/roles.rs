use super::*;

use std::collections::HashMap;

use curanet_domain::{RiskSignals, assess_risk};

impl PostgresAccessAdminRepository {
    pub(super) async fn list_roles_impl(&self) -> AppResult<Vec<RoleRecord>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name,
                roles.slug,
                roles.description,
                roles.hierarchy_level,
                roles.is_active,
                COALESCE(
                    ARRAY_AGG(role_permissions.permission ORDER BY role_permissions.permission)
                        FILTER (WHERE role_permissions.permission IS NOT NULL),
                    '{}'
                ) AS permissions,
                (
                    SELECT COUNT(*)
                    FROM user_roles
                    WHERE user_roles.role_id = roles.id
                ) AS user_count
            FROM roles
            LEFT JOIN role_permissions ON role_permissions.role_id = roles.id
            GROUP BY roles.id
            ORDER BY roles.hierarchy_level, roles.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("failed to list roles", error))?;

        rows.into_iter().map(RoleRow::into_record).collect()
    }

    pub(super) async fn get_role_impl(&self, role_id: Uuid) -> AppResult<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name,
                roles.slug,
                roles.description,
                roles.hierarchy_level,
                roles.is_active,
                COALESCE(
                    ARRAY_AGG(role_permissions.permission ORDER BY role_permissions.permission)
                        FILTER (WHERE role_permissions.permission IS NOT NULL),
                    '{}'
                ) AS permissions,
                (
                    SELECT COUNT(*)
                    FROM user_roles
                    WHERE user_roles.role_id = roles.id
                ) AS user_count
            FROM roles
            LEFT JOIN role_permissions ON role_permissions.role_id = roles.id
            WHERE roles.id = $1
            GROUP BY roles.id
            "#,
        )
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| internal("failed to load role", error))?;

        row.map(RoleRow::into_record).transpose()
    }

    pub(super) async fn permission_usage_impl(&self) -> AppResult<Vec<PermissionUsage>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT role_permissions.permission, roles.name
            FROM role_permissions
            INNER JOIN roles ON roles.id = role_permissions.role_id
            ORDER BY role_permissions.permission, roles.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| internal("failed to load permission usage", error))?;

        let mut usage_by_permission: HashMap<String, Vec<String>> = HashMap::new();
        for (permission, role_name) in rows {
            usage_by_permission.entry(permission).or_default().push(role_name);
        }

        Ok(Permission::all()
            .iter()
            .map(|permission| {
                let role_names = usage_by_permission
                    .remove(permission.as_str())
                    .unwrap_or_default();
                PermissionUsage {
                    permission: *permission,
                    role_count: role_names.len() as i64,
                    role_names,
                }
            })
            .collect())
    }

    pub(super) async fn create_role_impl(
        &self,
        input: CreateRoleInput,
        audit: AuditContext,
    ) -> AppResult<RoleRecord> {
        let permissions = deduped(input.permissions);

        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("failed to begin transaction", error))?;

        let role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO roles (name, slug, description, hierarchy_level)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.slug.as_str())
        .bind(input.description.as_deref())
        .bind(input.hierarchy_level)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_slug_conflict(error, input.slug.as_str()))?;

        for permission in &permissions {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission)
                VALUES ($1, $2)
                ON CONFLICT (role_id, permission) DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("failed to persist role grants", error))?;
        }

        let sensitive_granted: Vec<Permission> = permissions
            .iter()
            .copied()
            .filter(Permission::is_sensitive)
            .collect();
        let risk = assess_risk(
            AuditEventType::RoleCreated,
            &RiskSignals {
                touches_elevated_role: false,
                sensitive_permissions_granted: sensitive_granted,
            },
        );

        insert_audit_entry(
            &mut transaction,
            PendingAuditEntry {
                event_type: AuditEventType::RoleCreated,
                entity_type: "role",
                entity_id: role_id.to_string(),
                entity_name: input.name.as_str().to_owned(),
                actor: audit.actor,
                target_user: None,
                old_values: serde_json::json!({}),
                new_values: serde_json::json!({
                    "name": input.name.as_str(),
                    "slug": input.slug.as_str(),
                    "description": input.description.clone(),
                    "hierarchy_level": input.hierarchy_level,
                    "permissions": permission_slugs(&permissions),
                }),
                changes: serde_json::json!({
                    "permissions_granted": permission_slugs(&permissions),
                }),
                reason: audit.reason.map(String::from),
                risk,
                metadata: serde_json::json!({
                    "role_id": role_id,
                    "role_name": input.name.as_str(),
                    "total_permissions": permissions.len(),
                }),
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("failed to commit transaction", error))?;

        Ok(RoleRecord {
            role_id,
            name: input.name.as_str().to_owned(),
            slug: input.slug,
            description: input.description,
            hierarchy_level: input.hierarchy_level,
            is_active: true,
            permissions,
            user_count: 0,
        })
    }

    pub(super) async fn update_role_impl(
        &self,
        role_id: Uuid,
        input: UpdateRoleInput,
        audit: AuditContext,
    ) -> AppResult<RoleUpdateOutcome> {
        let new_permissions = deduped(input.permissions);

        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("failed to begin transaction", error))?;

        let locked = lock_role(&mut transaction, role_id).await?;
        if locked.slug == curanet_domain::SUPER_ADMIN_ROLE_SLUG {
            return Err(AppError::Forbidden(
                "the super-admin role cannot be modified".to_owned(),
            ));
        }

        let old_permissions = role_permissions_in_tx(&mut transaction, role_id).await?;

        sqlx::query(
            r#"
            UPDATE roles
            SET name = $2, slug = $3, description = $4, hierarchy_level = $5, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(role_id)
        .bind(input.name.as_str())
        .bind(input.slug.as_str())
        .bind(input.description.as_deref())
        .bind(input.hierarchy_level)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_slug_conflict(error, input.slug.as_str()))?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("failed to clear role grants", error))?;

        for permission in &new_permissions {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission)
                VALUES ($1, $2)
                ON CONFLICT (role_id, permission) DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("failed to persist role grants", error))?;
        }

        let (permissions_added, permissions_removed) =
            permission_diff(&old_permissions, &new_permissions);
        let user_count = role_user_count_in_tx(&mut transaction, role_id).await?;

        let sensitive_granted: Vec<Permission> = permissions_added
            .iter()
            .copied()
            .filter(Permission::is_sensitive)
            .collect();
        let risk = assess_risk(
            AuditEventType::RolePermissionsUpdated,
            &RiskSignals {
                touches_elevated_role: parse_stored_slug(locked.slug.as_str())?.is_system(),
                sensitive_permissions_granted: sensitive_granted,
            },
        );

        insert_audit_entry(
            &mut transaction,
            PendingAuditEntry {
                event_type: AuditEventType::RolePermissionsUpdated,
                entity_type: "role",
                entity_id: role_id.to_string(),
                entity_name: locked.name.clone(),
                actor: audit.actor,
                target_user: None,
                old_values: serde_json::json!({
                    "name": locked.name,
                    "slug": locked.slug,
                    "description": locked.description,
                    "hierarchy_level": locked.hierarchy_level,
                    "permissions": permission_slugs(&old_permissions),
                }),
                new_values: serde_json::json!({
                    "name": input.name.as_str(),
                    "slug": input.slug.as_str(),
                    "description": input.description.clone(),
                    "hierarchy_level": input.hierarchy_level,
                    "permissions": permission_slugs(&new_permissions),
                }),
                changes: serde_json::json!({
                    "permissions_added": permission_slugs(&permissions_added),
                    "permissions_removed": permission_slugs(&permissions_removed),
                }),
                reason: audit.reason.map(String::from),
                risk,
                metadata: serde_json::json!({
                    "role_id": role_id,
                    "role_name": input.name.as_str(),
                    "affected_users_count": user_count,
                    "total_permissions": new_permissions.len(),
                }),
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("failed to commit transaction", error))?;

        Ok(RoleUpdateOutcome {
            role: RoleRecord {
                role_id,
                name: input.name.as_str().to_owned(),
                slug: input.slug,
                description: input.description,
                hierarchy_level: input.hierarchy_level,
                is_active: locked.is_active,
                permissions: new_permissions,
                user_count,
            },
            permissions_added,
            permissions_removed,
        })
    }

    pub(super) async fn delete_role_impl(
        &self,
        role_id: Uuid,
        audit: AuditContext,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("failed to begin transaction", error))?;

        let locked = lock_role(&mut transaction, role_id).await?;
        let slug = parse_stored_slug(locked.slug.as_str())?;
        if slug.is_super_admin() {
            return Err(AppError::Forbidden(
                "the super-admin role cannot be deleted".to_owned(),
            ));
        }

        let user_count = role_user_count_in_tx(&mut transaction, role_id).await?;
        if user_count > 0 {
            return Err(AppError::Conflict(format!(
                "cannot delete role '{}' while {user_count} user(s) hold it",
                locked.name
            )));
        }

        let old_permissions = role_permissions_in_tx(&mut transaction, role_id).await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("failed to delete role grants", error))?;

        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("failed to delete role", error))?;

        let risk = assess_risk(
            AuditEventType::RoleDeleted,
            &RiskSignals {
                touches_elevated_role: slug.is_system(),
                sensitive_permissions_granted: Vec::new(),
            },
        );

        // The audit snapshot is the only surviving record of the deleted role.
        insert_audit_entry(
            &mut transaction,
            PendingAuditEntry {
                event_type: AuditEventType::RoleDeleted,
                entity_type: "role",
                entity_id: role_id.to_string(),
                entity_name: locked.name.clone(),
                actor: audit.actor,
                target_user: None,
                old_values: serde_json::json!({
                    "name": locked.name.clone(),
                    "slug": locked.slug,
                    "description": locked.description,
                    "hierarchy_level": locked.hierarchy_level,
                    "is_active": locked.is_active,
                    "permissions": permission_slugs(&old_permissions),
                }),
                new_values: serde_json::json!({}),
                changes: serde_json::json!({ "deleted": true }),
                reason: audit.reason.map(String::from),
                risk,
                metadata: serde_json::json!({
                    "role_id": role_id,
                    "role_name": locked.name,
                }),
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("failed to commit transaction", error))
    }

    pub(super) async fn set_role_status_impl(
        &self,
        role_id: Uuid,
        is_active: bool,
        audit: AuditContext,
    ) -> AppResult<RoleRecord> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| internal("failed to begin transaction", error))?;

        let locked = lock_role(&mut transaction, role_id).await?;
        let slug = parse_stored_slug(locked.slug.as_str())?;
        if slug.is_system() {
            return Err(AppError::Forbidden(
                "system roles cannot be disabled".to_owned(),
            ));
        }

        sqlx::query("UPDATE roles SET is_active = $2, updated_at = now() WHERE id = $1")
            .bind(role_id)
            .bind(is_active)
            .execute(&mut *transaction)
            .await
            .map_err(|error| internal("failed to update role status", error))?;

        let permissions = role_permissions_in_tx(&mut transaction, role_id).await?;
        let user_count = role_user_count_in_tx(&mut transaction, role_id).await?;

        let event_type = if is_active {
            AuditEventType::RoleEnabled
        } else {
            AuditEventType::RoleDisabled
        };
        let risk = assess_risk(event_type, &RiskSignals::default());

        insert_audit_entry(
            &mut transaction,
            PendingAuditEntry {
                event_type,
                entity_type: "role",
                entity_id: role_id.to_string(),
                entity_name: locked.name.clone(),
                actor: audit.actor,
                target_user: None,
                old_values: serde_json::json!({ "is_active": locked.is_active }),
                new_values: serde_json::json!({ "is_active": is_active }),
                changes: serde_json::json!({
                    "status_change": if is_active { "enabled" } else { "disabled" },
                }),
                reason: audit.reason.map(String::from),
                risk,
                metadata: serde_json::json!({
                    "role_id": role_id,
                    "role_name": locked.name.clone(),
                    "affected_users_count": user_count,
                }),
            },
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(|error| internal("failed to commit transaction", error))?;

        Ok(RoleRecord {
            role_id,
            name: locked.name,
            slug,
            description: locked.description,
            hierarchy_level: locked.hierarchy_level,
            is_active,
            permissions,
            user_count,
        })
    }

    pub(super) async fn directory_stats_impl(&self) -> AppResult<DirectoryStats> {
        let row = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM users WHERE is_active),
                (SELECT COUNT(*) FROM roles),
                (SELECT COUNT(*) FROM roles WHERE is_active)
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|error| internal("failed to load directory stats", error))?;

        Ok(DirectoryStats {
            total_users: row.0,
            active_users: row.1,
            total_roles: row.2,
            active_roles: row.3,
        })
    }
}
