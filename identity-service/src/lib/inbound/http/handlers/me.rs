use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;

/// `GET /api/auth/me`: echo the verified token's claims.
pub async fn me(
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<MeResponseData>, ApiError> {
    Ok(ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeResponseData {
    pub email: String,
    pub roles: Vec<String>,
    pub token_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<AuthenticatedUser> for MeResponseData {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            email: user.login,
            roles: user.roles,
            token_id: user.token_id,
            expires_at: user.expires_at,
        }
    }
}
