use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::Response;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::RoleName;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type to store the verified token's claims in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub login: String,
    pub roles: Vec<String>,
    pub token_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthenticatedUser {
    /// Role claims are always issued in their canonical spelling.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Middleware that validates JWT tokens and adds user info to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(&req)?;

    let claims = state.token_issuer.verify(token).map_err(|e| {
        tracing::warn!(error = %e, "JWT validation failed");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    let expires_at = claims.expires_at();
    req.extensions_mut().insert(AuthenticatedUser {
        login: claims.sub,
        roles: claims.roles,
        token_id: claims.jti,
        expires_at,
    });

    Ok(next.run(req).await)
}

/// Middleware that only lets tokens carrying the `Admin` role through.
///
/// Must run after [`authenticate`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication".to_string()))?;

    if !user.has_role(RoleName::ADMIN) {
        tracing::warn!(token_id = %user.token_id, "Admin role required");
        return Err(ApiError::Forbidden("Admin role required".to_string()));
    }

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
        )
    })
}
