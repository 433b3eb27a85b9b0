use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use curanet_application::{UserAuthRepository, UserCredentials};
use curanet_core::{AppError, AppResult};
use curanet_domain::{EmailAddress, SUPER_ADMIN_ROLE_SLUG};

/// PostgreSQL-backed repository for session authentication.
#[derive(Clone)]
pub struct PostgresUserAuthRepository {
    pool: PgPool,
}

impl PostgresUserAuthRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CredentialsRow {
    user_id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    is_active: bool,
}

#[async_trait]
impl UserAuthRepository for PostgresUserAuthRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id AS user_id, name, email, password_hash, is_active
            FROM users
            WHERE email = lower($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load credentials: {error}")))?;

        Ok(row.map(|row| UserCredentials {
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            is_active: row.is_active,
        }))
    }

    async fn record_login(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to record login: {error}")))?;

        Ok(())
    }

    async fn count_users(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count users: {error}")))
    }

    async fn create_bootstrap_super_admin(
        &self,
        name: &str,
        email: &EmailAddress,
        password_hash: &str,
    ) -> AppResult<Uuid> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create user: {error}")))?;

        let super_admin_role_id =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM roles WHERE slug = $1")
                .bind(SUPER_ADMIN_ROLE_SLUG)
                .fetch_optional(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to resolve super-admin role: {error}"))
                })?
                .ok_or_else(|| {
                    AppError::Internal("super-admin role is missing from the seed".to_owned())
                })?;

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(super_admin_role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to assign super-admin role: {error}"))
            })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(user_id)
    }
}
