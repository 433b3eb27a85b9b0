use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use curanet_core::{AppError, AppResult};
use curanet_domain::{EmailAddress, validate_password};

/// Credential row loaded for password authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    /// Stable user identifier.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Stored password hash.
    pub password_hash: String,
    /// Whether the user may use the platform.
    pub is_active: bool,
}

/// Repository port for session authentication.
#[async_trait]
pub trait UserAuthRepository: Send + Sync {
    /// Finds credentials by login email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserCredentials>>;

    /// Stamps a successful login.
    async fn record_login(&self, user_id: Uuid) -> AppResult<()>;

    /// Counts all user accounts.
    async fn count_users(&self) -> AppResult<i64>;

    /// Creates the first account and attaches the super-admin role.
    async fn create_bootstrap_super_admin(
        &self,
        name: &str,
        email: &EmailAddress,
        password_hash: &str,
    ) -> AppResult<Uuid>;
}

/// Port for password hashing and verification.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password for storage.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Result of a password login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials accepted.
    Authenticated(UserCredentials),
    /// Credentials rejected; no detail is disclosed.
    Failed,
}

/// Application service for session establishment.
#[derive(Clone)]
pub struct AuthService {
    user_repository: Arc<dyn UserAuthRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl AuthService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserAuthRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
        }
    }

    /// Authenticates a user with email and password.
    ///
    /// Returns `AuthOutcome::Failed` for any failure (unknown email, wrong
    /// password, revoked account) to prevent enumeration.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthOutcome> {
        let user = self.user_repository.find_by_email(email).await?;

        let Some(user) = user else {
            // OWASP: always hash to prevent timing attacks even when user not found.
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        let password_valid = self
            .password_hasher
            .verify_password(password, &user.password_hash)?;

        if !password_valid || !user.is_active {
            return Ok(AuthOutcome::Failed);
        }

        self.user_repository.record_login(user.user_id).await?;

        Ok(AuthOutcome::Authenticated(user))
    }

    /// Creates the first super-admin account on an empty installation.
    pub async fn bootstrap_super_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> AppResult<Uuid> {
        if self.user_repository.count_users().await? > 0 {
            return Err(AppError::Conflict(
                "bootstrap is only available on an empty installation".to_owned(),
            ));
        }

        if name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_owned()));
        }

        let email = EmailAddress::new(email)?;
        validate_password(password)?;

        let password_hash = self.password_hasher.hash_password(password)?;
        self.user_repository
            .create_bootstrap_super_admin(name.trim(), &email, &password_hash)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use curanet_core::{AppError, AppResult};
    use curanet_domain::EmailAddress;

    use super::{AuthOutcome, AuthService, PasswordHasher, UserAuthRepository, UserCredentials};

    struct PlainTextHasher;

    impl PasswordHasher for PlainTextHasher {
        fn hash_password(&self, password: &str) -> AppResult<String> {
            Ok(format!("hashed:{password}"))
        }

        fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
            Ok(hash == format!("hashed:{password}"))
        }
    }

    #[derive(Default)]
    struct FakeUserAuthRepository {
        users: Mutex<Vec<UserCredentials>>,
    }

    #[async_trait]
    impl UserAuthRepository for FakeUserAuthRepository {
        async fn find_by_email(&self, email: &str) -> AppResult<Option<UserCredentials>> {
            Ok(self
                .users
                .lock()
                .await
                .iter()
                .find(|user| user.email == email)
                .cloned())
        }

        async fn record_login(&self, _user_id: Uuid) -> AppResult<()> {
            Ok(())
        }

        async fn count_users(&self) -> AppResult<i64> {
            Ok(self.users.lock().await.len() as i64)
        }

        async fn create_bootstrap_super_admin(
            &self,
            name: &str,
            email: &EmailAddress,
            password_hash: &str,
        ) -> AppResult<Uuid> {
            let user = UserCredentials {
                user_id: Uuid::new_v4(),
                name: name.to_owned(),
                email: email.as_str().to_owned(),
                password_hash: password_hash.to_owned(),
                is_active: true,
            };
            let user_id = user.user_id;
            self.users.lock().await.push(user);
            Ok(user_id)
        }
    }

    fn service_with(users: Vec<UserCredentials>) -> AuthService {
        AuthService::new(
            Arc::new(FakeUserAuthRepository {
                users: Mutex::new(users),
            }),
            Arc::new(PlainTextHasher),
        )
    }

    fn credentials(email: &str, password: &str, is_active: bool) -> UserCredentials {
        UserCredentials {
            user_id: Uuid::new_v4(),
            name: "Jordan Provider".to_owned(),
            email: email.to_owned(),
            password_hash: format!("hashed:{password}"),
            is_active,
        }
    }

    #[tokio::test]
    async fn unknown_email_fails_generically() {
        let service = service_with(Vec::new());

        let outcome = service.login("nobody@clinic.example", "irrelevant-pass").await;
        assert_eq!(outcome.ok(), Some(AuthOutcome::Failed));
    }

    #[tokio::test]
    async fn wrong_password_fails_generically() {
        let service = service_with(vec![credentials(
            "jordan@clinic.example",
            "correct-horse-battery",
            true,
        )]);

        let outcome = service.login("jordan@clinic.example", "wrong-password").await;
        assert_eq!(outcome.ok(), Some(AuthOutcome::Failed));
    }

    #[tokio::test]
    async fn revoked_user_fails_generically() {
        let service = service_with(vec![credentials(
            "jordan@clinic.example",
            "correct-horse-battery",
            false,
        )]);

        let outcome = service
            .login("jordan@clinic.example", "correct-horse-battery")
            .await;
        assert_eq!(outcome.ok(), Some(AuthOutcome::Failed));
    }

    #[tokio::test]
    async fn valid_credentials_authenticate() {
        let service = service_with(vec![credentials(
            "jordan@clinic.example",
            "correct-horse-battery",
            true,
        )]);

        let outcome = service
            .login("jordan@clinic.example", "correct-horse-battery")
            .await;
        assert!(matches!(outcome, Ok(AuthOutcome::Authenticated(_))));
    }

    #[tokio::test]
    async fn bootstrap_is_refused_once_users_exist() {
        let service = service_with(vec![credentials(
            "jordan@clinic.example",
            "correct-horse-battery",
            true,
        )]);

        let result = service
            .bootstrap_super_admin("Casey Admin", "casey@curanet.example", "a-long-passphrase")
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn bootstrap_creates_the_first_account() {
        let service = service_with(Vec::new());

        let result = service
            .bootstrap_super_admin("Casey Admin", "casey@curanet.example", "a-long-passphrase")
            .await;
        assert!(result.is_ok());
    }
}
