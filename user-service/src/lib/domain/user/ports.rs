use async_trait::async_trait;
use auth::SessionClaims;

use crate::domain::user::models::Credentials;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserSession;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `command` - Validated command containing names, username, email, and password
    ///
    /// # Returns
    /// Registered user entity
    ///
    /// # Errors
    /// * `WeakPassword` - Password fails the strength policy (all violations listed)
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError>;

    /// Verify credentials and issue a session token.
    ///
    /// # Arguments
    /// * `credentials` - Username and plaintext password
    ///
    /// # Returns
    /// The user with a signed session token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown user, wrong password, or corrupt stored hash
    /// * `DatabaseError` - Database operation failed
    async fn authenticate(&self, credentials: Credentials) -> Result<UserSession, UserError>;

    /// Validate a session token presented by a client.
    ///
    /// # Errors
    /// * `InvalidSession` - Token is malformed, forged or expired
    async fn validate_session(&self, token: &str) -> Result<SessionClaims, UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Arguments
    /// * `user` - User entity to create
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by username.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;

    /// Check whether a username is taken.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn exists_by_username(&self, username: &Username) -> Result<bool, UserError>;

    /// Check whether an email address is registered.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool, UserError>;
}
