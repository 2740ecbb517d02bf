use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Claims carried by a session token.
///
/// Serialized with the registered `iat`/`exp` names plus `role` and
/// `unique_name` for the display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject role (single string, e.g. "User")
    pub role: String,

    /// Subject display name
    #[serde(rename = "unique_name")]
    pub display_name: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Create claims issued at `issued_at` and valid for `lifetime`.
    ///
    /// # Arguments
    /// * `role` - Subject role
    /// * `display_name` - Subject display name
    /// * `issued_at` - Issuance instant
    /// * `lifetime` - Offset from issuance to expiry
    ///
    /// # Errors
    /// * `EncodingFailed` - Expiry falls outside the representable time range
    pub fn new(
        role: impl Into<String>,
        display_name: impl Into<String>,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<Self, JwtError> {
        let expires_at = issued_at.checked_add_signed(lifetime).ok_or_else(|| {
            JwtError::EncodingFailed(format!("token lifetime {} is out of range", lifetime))
        })?;

        Ok(Self {
            role: role.into(),
            display_name: display_name.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Check if the claims are expired at the given instant.
    ///
    /// A token is valid strictly before its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_claims() {
        let now = Utc::now();
        let claims = SessionClaims::new("User", "Alice Liddell", now, Duration::days(7)).unwrap();

        assert_eq!(claims.role, "User");
        assert_eq!(claims.display_name, "Alice Liddell");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_is_expired() {
        let issued = DateTime::from_timestamp(1_000, 0).unwrap();
        let claims = SessionClaims::new("User", "Alice", issued, Duration::seconds(100)).unwrap();

        assert!(!claims.is_expired(DateTime::from_timestamp(1_099, 0).unwrap()));
        assert!(claims.is_expired(DateTime::from_timestamp(1_100, 0).unwrap()));
        assert!(claims.is_expired(DateTime::from_timestamp(1_101, 0).unwrap()));
    }

    #[test]
    fn test_serialized_names() {
        let issued = DateTime::from_timestamp(1_000, 0).unwrap();
        let claims = SessionClaims::new("Admin", "Bob", issued, Duration::seconds(10)).unwrap();

        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "role": "Admin",
                "unique_name": "Bob",
                "iat": 1_000,
                "exp": 1_010,
            })
        );
    }

    #[test]
    fn test_timestamps_round_trip() {
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims = SessionClaims::new("User", "Alice", issued, Duration::days(7)).unwrap();

        assert_eq!(claims.issued_at(), Some(issued));
        assert_eq!(claims.expires_at(), Some(issued + Duration::days(7)));
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let result = SessionClaims::new("User", "Alice", issued, Duration::days(100_000_000));

        assert!(matches!(result, Err(JwtError::EncodingFailed(_))));
    }
}
