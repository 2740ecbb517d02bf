use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::SessionClaims;
use chrono::Utc;

use crate::domain::user::models::Credentials;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserSession;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
/// Key derivation is CPU-bound, so hashing and verification run on the
/// blocking thread pool.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Password and session token coordinator
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }

    async fn run_blocking<T, F>(&self, task: F) -> Result<T, UserError>
    where
        T: Send + 'static,
        F: FnOnce(&Authenticator) -> T + Send + 'static,
    {
        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || task(&authenticator))
            .await
            .map_err(|e| UserError::Unknown(format!("Password task failed: {}", e)))
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError> {
        self.authenticator.check_password(&command.password)?;

        if self.repository.exists_by_username(&command.username).await? {
            return Err(UserError::UsernameAlreadyExists(
                command.username.as_str().to_string(),
            ));
        }

        if self.repository.exists_by_email(&command.email).await? {
            return Err(UserError::EmailAlreadyExists(
                command.email.as_str().to_string(),
            ));
        }

        let password = command.password;
        let password_hash = self
            .run_blocking(move |authenticator| authenticator.hash_password(&password))
            .await??;

        let user = User {
            id: UserId::new(),
            first_name: command.first_name,
            last_name: command.last_name,
            username: command.username,
            email: command.email,
            password_hash,
            role: Role::default(),
            created_at: Utc::now(),
        };

        let created_user = self.repository.create(user).await?;

        tracing::info!(
            user_id = %created_user.id,
            username = %created_user.username,
            "User registered"
        );

        Ok(created_user)
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<UserSession, UserError> {
        let Credentials { username, password } = credentials;

        // A name that fails validation cannot exist, treat it as unknown.
        let user = match Username::new(username) {
            Ok(username) => self.repository.find_by_username(&username).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            self.run_blocking(move |authenticator| authenticator.verify_dummy(&password))
                .await?;
            tracing::info!("Authentication failed: unknown username");
            return Err(UserError::InvalidCredentials);
        };

        let password_hash = user.password_hash.clone();
        let role = user.role.as_str().to_string();
        let display_name = user.display_name();
        let result = self
            .run_blocking(move |authenticator| {
                authenticator.authenticate(&password, &password_hash, &role, &display_name)
            })
            .await?;

        match result {
            Ok(result) => {
                tracing::info!(user_id = %user.id, "User authenticated");
                Ok(UserSession {
                    user,
                    access_token: result.access_token,
                    expires_at: result.expires_at,
                })
            }
            Err(e) => {
                tracing::info!(user_id = %user.id, "Authentication failed: {}", e);
                Err(e.into())
            }
        }
    }

    async fn validate_session(&self, token: &str) -> Result<SessionClaims, UserError> {
        self.authenticator.validate_token(token).map_err(|e| {
            tracing::warn!(error = %e, "Session token rejected");
            UserError::InvalidSession
        })
    }
}

#[cfg(test)]
mod tests {
    use auth::JwtHandler;
    use auth::PasswordHasher;
    use auth::PolicyViolation;
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::PersonName;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    // Define mocks in the test module using mockall
    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, UserError>;
            async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;
            async fn exists_by_username(&self, username: &Username) -> Result<bool, UserError>;
            async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool, UserError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(Authenticator::new(
            PasswordHasher::with_iterations(1_000),
            JwtHandler::new(SECRET),
        ))
    }

    fn register_command(password: &str) -> RegisterUserCommand {
        RegisterUserCommand::new(
            Some(PersonName::new("Alice".to_string()).unwrap()),
            Some(PersonName::new("Liddell".to_string()).unwrap()),
            Username::new("alice".to_string()).unwrap(),
            EmailAddress::new("a@x.com".to_string()).unwrap(),
            password.to_string(),
        )
    }

    fn stored_user(authenticator: &Authenticator, password: &str) -> User {
        User {
            id: UserId::new(),
            first_name: Some(PersonName::new("Alice".to_string()).unwrap()),
            last_name: Some(PersonName::new("Liddell".to_string()).unwrap()),
            username: Username::new("alice".to_string()).unwrap(),
            email: EmailAddress::new("a@x.com".to_string()).unwrap(),
            password_hash: authenticator.hash_password(password).unwrap(),
            role: Role::default(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();

        repository
            .expect_exists_by_username()
            .times(1)
            .returning(|_| Ok(false));
        repository
            .expect_exists_by_email()
            .times(1)
            .returning(|_| Ok(false));

        let verifier = Arc::clone(&authenticator);
        repository
            .expect_create()
            .withf(move |user| {
                user.username.as_str() == "alice"
                    && user.role.as_str() == "User"
                    && user.password_hash != "Str0ng!Pass"
                    && verifier
                        .authenticate("Str0ng!Pass", &user.password_hash, "User", "x")
                        .is_ok()
            })
            .times(1)
            .returning(|user| Ok(user));

        let service = UserService::new(Arc::new(repository), authenticator);

        let user = service
            .register(register_command("Str0ng!Pass"))
            .await
            .expect("Registration failed");
        assert_eq!(user.username.as_str(), "alice");
        assert_eq!(user.display_name(), "Alice Liddell");
    }

    #[tokio::test]
    async fn test_register_without_names_uses_username_as_display_name() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_exists_by_username()
            .returning(|_| Ok(false));
        repository.expect_exists_by_email().returning(|_| Ok(false));
        repository
            .expect_create()
            .withf(|user| user.first_name.is_none() && user.last_name.is_none())
            .times(1)
            .returning(|user| Ok(user));

        let service = UserService::new(Arc::new(repository), authenticator());

        let command = RegisterUserCommand::new(
            None,
            None,
            Username::new("alice".to_string()).unwrap(),
            EmailAddress::new("a@x.com".to_string()).unwrap(),
            "Str0ng!Pass".to_string(),
        );
        let user = service.register(command).await.expect("Registration failed");
        assert_eq!(user.display_name(), "alice");
    }

    #[tokio::test]
    async fn test_register_weak_password_lists_every_violation() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_exists_by_username().times(0);
        repository.expect_exists_by_email().times(0);
        repository.expect_create().times(0);

        let service = UserService::new(Arc::new(repository), authenticator());

        let result = service.register(register_command("nospecial")).await;
        match result {
            Err(UserError::WeakPassword(weak)) => assert_eq!(
                weak.violations,
                vec![
                    PolicyViolation::MissingCharacterClasses,
                    PolicyViolation::MissingSpecialCharacter,
                ]
            ),
            other => panic!("expected weak password, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_exists_by_username()
            .times(1)
            .returning(|_| Ok(true));
        repository.expect_exists_by_email().times(0);
        repository.expect_create().times(0);

        let service = UserService::new(Arc::new(repository), authenticator());

        let result = service.register(register_command("Str0ng!Pass")).await;
        assert!(matches!(result, Err(UserError::UsernameAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_exists_by_username()
            .times(1)
            .returning(|_| Ok(false));
        repository
            .expect_exists_by_email()
            .times(1)
            .returning(|_| Ok(true));
        repository.expect_create().times(0);

        let service = UserService::new(Arc::new(repository), authenticator());

        let result = service.register(register_command("Str0ng!Pass")).await;
        assert!(matches!(result, Err(UserError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_register_database_error() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_exists_by_username()
            .returning(|_| Err(UserError::DatabaseError("connection reset".to_string())));

        let service = UserService::new(Arc::new(repository), authenticator());

        let result = service.register(register_command("Str0ng!Pass")).await;
        assert!(matches!(result, Err(UserError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "Str0ng!Pass");

        repository
            .expect_find_by_username()
            .withf(|username| username.as_str() == "alice")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(Arc::new(repository), Arc::clone(&authenticator));

        let session = service
            .authenticate(Credentials {
                username: "alice".to_string(),
                password: "Str0ng!Pass".to_string(),
            })
            .await
            .expect("Authentication failed");

        let claims = service
            .validate_session(&session.access_token)
            .await
            .expect("Token should validate");
        assert_eq!(claims.role, "User");
        assert_eq!(claims.display_name, "Alice Liddell");
        assert_eq!(claims.exp, session.expires_at.timestamp());
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "Str0ng!Pass");

        repository
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(Arc::new(repository), authenticator);

        let result = service
            .authenticate(Credentials {
                username: "alice".to_string(),
                password: "wrong".to_string(),
            })
            .await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository), authenticator());

        let result = service
            .authenticate(Credentials {
                username: "nobody".to_string(),
                password: "Str0ng!Pass".to_string(),
            })
            .await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_invalid_username_skips_lookup() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_username().times(0);

        let service = UserService::new(Arc::new(repository), authenticator());

        let result = service
            .authenticate(Credentials {
                username: "x".to_string(),
                password: "Str0ng!Pass".to_string(),
            })
            .await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_corrupt_stored_hash() {
        let mut repository = MockTestUserRepository::new();
        let authenticator = authenticator();
        let mut user = stored_user(&authenticator, "Str0ng!Pass");
        user.password_hash = "AAAA".to_string();

        repository
            .expect_find_by_username()
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(Arc::new(repository), authenticator);

        let result = service
            .authenticate(Credentials {
                username: "alice".to_string(),
                password: "Str0ng!Pass".to_string(),
            })
            .await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_validate_session_rejects_foreign_token() {
        let repository = MockTestUserRepository::new();
        let service = UserService::new(Arc::new(repository), authenticator());

        let foreign = JwtHandler::new(b"some_other_secret_at_least_32_bytes")
            .issue("Admin", "Mallory")
            .unwrap();

        let result = service.validate_session(&foreign).await;
        assert!(matches!(result, Err(UserError::InvalidSession)));
    }
}
