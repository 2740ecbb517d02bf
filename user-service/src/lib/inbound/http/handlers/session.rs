use auth::SessionClaims;
use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiSuccess;

/// Echo the claims of the bearer token the middleware accepted.
pub async fn current_session(
    Extension(claims): Extension<SessionClaims>,
) -> ApiSuccess<SessionResponseData> {
    ApiSuccess::new(StatusCode::OK, (&claims).into())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    pub role: String,
    pub display_name: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&SessionClaims> for SessionResponseData {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            role: claims.role.clone(),
            display_name: claims.display_name.clone(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
        }
    }
}
