use std::collections::HashSet;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::SessionClaims;
use super::errors::JwtError;

/// Default session lifetime in days.
pub const DEFAULT_TOKEN_LIFETIME_DAYS: i64 = 7;

struct SigningKey {
    id: Option<String>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

struct RetiredKey {
    id: String,
    decoding_key: DecodingKey,
}

/// Session token issuer and validator.
///
/// Signs [`SessionClaims`] with HS256 (HMAC with SHA-256). The current key
/// signs every new token; retired keys only verify tokens that name them in
/// their `kid` header, so a secret can be rotated without logging everyone
/// out.
pub struct JwtHandler {
    signing_key: SigningKey,
    retired_keys: Vec<RetiredKey>,
    algorithm: Algorithm,
    token_lifetime: Duration,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Returns
    /// JwtHandler configured with HS256 and a 7 day token lifetime
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Load secrets from configuration or a secret store, never from code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            signing_key: SigningKey {
                id: None,
                encoding_key: EncodingKey::from_secret(secret),
                decoding_key: DecodingKey::from_secret(secret),
            },
            retired_keys: Vec::new(),
            algorithm: Algorithm::HS256,
            token_lifetime: Duration::days(DEFAULT_TOKEN_LIFETIME_DAYS),
        }
    }

    /// Name the current signing key. The id is written to each token's `kid` header.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.signing_key.id = Some(key_id.into());
        self
    }

    /// Accept tokens signed by a previous key.
    ///
    /// Only tokens whose `kid` header equals `key_id` are checked against it.
    pub fn with_retired_key(mut self, key_id: impl Into<String>, secret: &[u8]) -> Self {
        self.retired_keys.push(RetiredKey {
            id: key_id.into(),
            decoding_key: DecodingKey::from_secret(secret),
        });
        self
    }

    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    pub fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    /// Issue a token for a subject, valid from now for the configured lifetime.
    ///
    /// # Arguments
    /// * `role` - Subject role
    /// * `display_name` - Subject display name
    ///
    /// # Returns
    /// Compact JWT string
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, role: &str, display_name: &str) -> Result<String, JwtError> {
        self.issue_at(role, display_name, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        role: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = SessionClaims::new(role, display_name, now, self.token_lifetime)?;
        self.encode(&claims)
    }

    /// Sign already-built claims with the current key.
    pub fn encode(&self, claims: &SessionClaims) -> Result<String, JwtError> {
        let mut header = Header::new(self.algorithm);
        header.kid = self.signing_key.id.clone();

        encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Validate a token against the current time.
    ///
    /// # Arguments
    /// * `token` - JWT token string to validate
    ///
    /// # Returns
    /// Claims embedded in the token
    ///
    /// # Errors
    /// * `Malformed` - Token cannot be parsed into the expected structure
    /// * `InvalidSignature` - Signature does not verify or key is unknown
    /// * `Expired` - Current time is at or past the token expiry
    pub fn validate(&self, token: &str) -> Result<SessionClaims, JwtError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, JwtError> {
        let header = decode_header(token).map_err(|e| JwtError::Malformed(e.to_string()))?;
        let decoding_key = self
            .decoding_key_for(header.kid.as_deref())
            .ok_or(JwtError::InvalidSignature)?;

        // Expiry is checked below against `now`, without leeway.
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let token_data =
            decode::<SessionClaims>(token, decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        JwtError::InvalidSignature
                    }
                    ErrorKind::ExpiredSignature => JwtError::Expired,
                    _ => JwtError::Malformed(e.to_string()),
                }
            })?;

        if token_data.claims.is_expired(now) {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }

    fn decoding_key_for(&self, key_id: Option<&str>) -> Option<&DecodingKey> {
        match key_id {
            None => Some(&self.signing_key.decoding_key),
            Some(id) if self.signing_key.id.as_deref() == Some(id) => {
                Some(&self.signing_key.decoding_key)
            }
            Some(id) => self
                .retired_keys
                .iter()
                .find(|key| key.id == id)
                .map(|key| &key.decoding_key),
        }
    }
}
