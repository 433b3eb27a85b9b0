use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use curanet_application::{AccessProfile, AuthorizationRepository};
use curanet_core::{AppError, AppResult};
use curanet_domain::{Permission, SUPER_ADMIN_ROLE_SLUG};

/// PostgreSQL-backed repository for effective-permission lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserFlagsRow {
    is_active: bool,
    is_super_admin: bool,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn load_access_profile(&self, user_id: Uuid) -> AppResult<Option<AccessProfile>> {
        let flags = sqlx::query_as::<_, UserFlagsRow>(
            r#"
            SELECT
                users.is_active,
                EXISTS (
                    SELECT 1
                    FROM user_roles
                    INNER JOIN roles ON roles.id = user_roles.role_id
                    WHERE user_roles.user_id = users.id AND roles.slug = $2
                ) AS is_super_admin
            FROM users
            WHERE users.id = $1
            "#,
        )
        .bind(user_id)
        .bind(SUPER_ADMIN_ROLE_SLUG)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user flags: {error}")))?;

        let Some(flags) = flags else {
            return Ok(None);
        };

        // Direct grants apply regardless of role state; role grants only
        // through active roles.
        let stored_permissions = sqlx::query_scalar::<_, String>(
            r#"
            SELECT role_permissions.permission
            FROM user_roles
            INNER JOIN roles
                ON roles.id = user_roles.role_id AND roles.is_active
            INNER JOIN role_permissions
                ON role_permissions.role_id = roles.id
            WHERE user_roles.user_id = $1
            UNION
            SELECT user_permissions.permission
            FROM user_permissions
            WHERE user_permissions.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        let mut permissions = Vec::with_capacity(stored_permissions.len());
        for stored in stored_permissions {
            match Permission::from_str(stored.as_str()) {
                Ok(permission) => permissions.push(permission),
                Err(_) => {
                    tracing::warn!(permission = %stored, "skipping unknown stored permission");
                }
            }
        }
        permissions.sort();
        permissions.dedup();

        Ok(Some(AccessProfile {
            is_active: flags.is_active,
            is_super_admin: flags.is_super_admin,
            permissions,
        }))
    }
}
