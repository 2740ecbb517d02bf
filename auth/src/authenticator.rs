use chrono::DateTime;
use chrono::Utc;

use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::SessionClaims;
use crate::password::PasswordHasher;
use crate::password::PasswordPolicy;
use crate::password::WeakPassword;

/// Authentication coordinator combining password handling and session tokens.
///
/// Runs the strength policy before hashing and password verification
/// before token issuance. Hasher and token handler stay independent of
/// each other.
pub struct Authenticator {
    password_policy: PasswordPolicy,
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    dummy_hash: String,
}

/// Result of successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResult {
    /// Signed session token
    pub access_token: String,

    /// Instant the token stops being valid
    pub expires_at: DateTime<Utc>,
}

/// Authentication operation errors.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Weak password: {0}")]
    WeakPassword(#[from] WeakPassword),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator with the default strength policy.
    ///
    /// # Arguments
    /// * `password_hasher` - Configured credential hasher
    /// * `jwt_handler` - Configured token handler holding the signing secret
    pub fn new(password_hasher: PasswordHasher, jwt_handler: JwtHandler) -> Self {
        Self {
            password_policy: PasswordPolicy::default(),
            dummy_hash: password_hasher.hash(""),
            password_hasher,
            jwt_handler,
        }
    }

    pub fn with_password_policy(mut self, password_policy: PasswordPolicy) -> Self {
        self.password_policy = password_policy;
        self
    }

    /// Run the strength policy without hashing.
    ///
    /// # Errors
    /// * `WeakPassword` - Every rule the password violates
    pub fn check_password(&self, password: &str) -> Result<(), WeakPassword> {
        self.password_policy.check(password)
    }

    /// Check password strength and hash it for storage.
    ///
    /// # Arguments
    /// * `password` - Plaintext password
    ///
    /// # Returns
    /// Encoded salted hash
    ///
    /// # Errors
    /// * `WeakPassword` - Password violates one or more strength rules
    pub fn hash_password(&self, password: &str) -> Result<String, AuthenticationError> {
        self.password_policy.check(password)?;
        Ok(self.password_hasher.hash(password))
    }

    /// Verify credentials and issue a session token.
    ///
    /// A corrupt stored hash counts as a failed verification.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `role` - Role claim for the token
    /// * `display_name` - Display name claim for the token
    ///
    /// # Returns
    /// AuthenticationResult with access token and its expiry
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match or stored hash is corrupt
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        role: &str,
        display_name: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        let is_valid = self
            .password_hasher
            .verify(password, stored_hash)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored password hash is corrupt");
                false
            });

        if !is_valid {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let claims = SessionClaims::new(
            role,
            display_name,
            Utc::now(),
            self.jwt_handler.token_lifetime(),
        )?;
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| JwtError::EncodingFailed("token expiry is out of range".to_string()))?;
        let access_token = self.jwt_handler.encode(&claims)?;

        Ok(AuthenticationResult {
            access_token,
            expires_at,
        })
    }

    /// Spend one verification on a throwaway hash.
    ///
    /// Used when no stored hash exists, so an unknown username takes as long
    /// to reject as a wrong password.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.password_hasher.verify(password, &self.dummy_hash);
    }

    /// Validate and decode a session token.
    ///
    /// # Errors
    /// * `JwtError` - Token is malformed, forged or expired
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        self.jwt_handler.validate(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::PolicyViolation;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn authenticator() -> Authenticator {
        Authenticator::new(PasswordHasher::with_iterations(1_000), JwtHandler::new(SECRET))
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = authenticator();

        let password = "Str0ng!Pass";
        let hash = authenticator
            .hash_password(password)
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate(password, &hash, "User", "Alice Liddell")
            .expect("Authentication failed");

        assert!(!result.access_token.is_empty());
        assert!(result.expires_at > Utc::now() + chrono::Duration::days(6));

        let decoded = authenticator
            .validate_token(&result.access_token)
            .expect("Token validation failed");
        assert_eq!(decoded.role, "User");
        assert_eq!(decoded.display_name, "Alice Liddell");
        assert_eq!(decoded.exp, result.expires_at.timestamp());
    }

    #[test]
    fn test_authenticate_with_out_of_range_lifetime() {
        let auth = Authenticator::new(
            PasswordHasher::with_iterations(1_000),
            JwtHandler::new(SECRET).with_token_lifetime(chrono::Duration::days(100_000_000)),
        );
        let hash = auth.hash_password("Str0ng!Pass").unwrap();

        let result = auth.authenticate("Str0ng!Pass", &hash, "User", "Alice");
        assert!(matches!(
            result,
            Err(AuthenticationError::JwtError(JwtError::EncodingFailed(_)))
        ));
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = authenticator();

        let hash = authenticator
            .hash_password("Str0ng!Pass")
            .expect("Failed to hash password");

        let result = authenticator.authenticate("wrong_password", &hash, "User", "Alice");
        assert_eq!(result, Err(AuthenticationError::InvalidCredentials));
    }

    #[test]
    fn test_authenticate_corrupt_hash() {
        let authenticator = authenticator();

        let result = authenticator.authenticate("Str0ng!Pass", "corrupt==", "User", "Alice");
        assert_eq!(result, Err(AuthenticationError::InvalidCredentials));
    }

    #[test]
    fn test_hash_password_rejects_weak_password() {
        let authenticator = authenticator();

        let result = authenticator.hash_password("weak");
        match result {
            Err(AuthenticationError::WeakPassword(err)) => {
                assert_eq!(
                    err.violations,
                    vec![
                        PolicyViolation::TooShort { min: 8 },
                        PolicyViolation::MissingCharacterClasses,
                        PolicyViolation::MissingSpecialCharacter,
                    ]
                );
            }
            other => panic!("expected weak password, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_policy() {
        let authenticator = authenticator().with_password_policy(PasswordPolicy::with_min_length(16));

        assert!(authenticator.hash_password("Str0ng!Pass").is_err());
        assert!(authenticator.hash_password("Much!L0ngerPassword").is_ok());
    }

    #[test]
    fn test_verify_dummy_does_not_panic() {
        authenticator().verify_dummy("anything");
    }

    #[test]
    fn test_validate_invalid_token() {
        let result = authenticator().validate_token("invalid.token.here");
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }
}
