use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::ApiError;
use super::ApiSuccess;
use super::CredentialsRequest;
use super::TokenResponseData;
use crate::domain::user::models::Password;
use crate::domain::user::policy::RolePolicy;
use crate::inbound::http::router::AppState;

/// `POST /api/auth/login`: tokens carry at most the `User` role.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    authenticate(&state, body, &RolePolicy::user_login()).await
}

/// `POST /api/auth/admin/login`: tokens may also carry `Admin`.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    authenticate(&state, body, &RolePolicy::admin_login()).await
}

async fn authenticate(
    state: &AppState,
    body: CredentialsRequest,
    policy: &RolePolicy,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    let password = Password::new(body.password);

    state
        .identity_service
        .authenticate(&body.email, &password, policy)
        .await
        .map_err(ApiError::from)
        .map(|issued| ApiSuccess::new(StatusCode::OK, issued.into()))
}
