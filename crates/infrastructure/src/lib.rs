//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod postgres_access_admin_repository;
mod postgres_audit_log_repository;
mod postgres_authorization_repository;
mod postgres_user_auth_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use postgres_access_admin_repository::PostgresAccessAdminRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_user_auth_repository::PostgresUserAuthRepository;
