//! Authentication primitives library
//!
//! Provides the credential and session building blocks used by the account service:
//! - Password hashing (PBKDF2-HMAC-SHA512, salt embedded in the stored hash)
//! - Password strength policy
//! - Session token issuance and validation (HS256 JWT with key rotation)
//! - Authentication coordination
//!
//! Nothing here touches storage or the network; the signing secret is always
//! supplied by the caller.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::with_iterations(1_000);
//! let hash = hasher.hash("Str0ng!Pass");
//! assert!(hasher.verify("Str0ng!Pass", &hash).unwrap());
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::JwtHandler;
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!");
//! let token = handler.issue("User", "Alice Liddell").unwrap();
//! let claims = handler.validate(&token).unwrap();
//! assert_eq!(claims.display_name, "Alice Liddell");
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, JwtHandler, PasswordHasher};
//!
//! let auth = Authenticator::new(
//!     PasswordHasher::with_iterations(1_000),
//!     JwtHandler::new(b"secret_key_at_least_32_bytes_long!"),
//! );
//!
//! // Register: check strength and hash
//! let hash = auth.hash_password("Str0ng!Pass").unwrap();
//!
//! // Login: verify and issue token
//! let result = auth.authenticate("Str0ng!Pass", &hash, "User", "Alice Liddell").unwrap();
//!
//! // Validate token
//! let claims = auth.validate_token(&result.access_token).unwrap();
//! assert_eq!(claims.role, "User");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::SessionClaims;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordPolicy;
pub use password::PolicyViolation;
pub use password::WeakPassword;

/// Hash a password with the default parameters.
pub fn hash_password(plaintext: &str) -> String {
    PasswordHasher::new().hash(plaintext)
}

/// Verify a password against a hash produced by [`hash_password`].
pub fn verify_password(plaintext: &str, encoded_hash: &str) -> Result<bool, PasswordError> {
    PasswordHasher::new().verify(plaintext, encoded_hash)
}

/// Issue a 7 day session token signed with `secret`.
pub fn issue_token(role: &str, display_name: &str, secret: &[u8]) -> Result<String, JwtError> {
    JwtHandler::new(secret).issue(role, display_name)
}

/// Validate a session token signed with `secret`.
pub fn validate_token(token: &str, secret: &[u8]) -> Result<SessionClaims, JwtError> {
    JwtHandler::new(secret).validate(token)
}
