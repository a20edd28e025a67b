use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::ApiError;
use super::ApiSuccess;
use super::CredentialsRequest;
use super::TokenResponseData;
use crate::domain::user::models::Password;
use crate::domain::user::models::Registration;
use crate::domain::user::policy::RolePolicy;
use crate::inbound::http::router::AppState;

/// `POST /api/auth/create`: register an ordinary account.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    register(&state, body, &RolePolicy::user_registration()).await
}

/// `POST /api/auth/admin/create`: register an administrator account.
pub async fn create_admin(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    register(&state, body, &RolePolicy::admin_registration()).await
}

async fn register(
    state: &AppState,
    body: CredentialsRequest,
    policy: &RolePolicy,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    let registration = Registration {
        login: body.email,
        password: Password::new(body.password),
        roles: body.roles,
    };

    state
        .identity_service
        .register(registration, policy)
        .await
        .map_err(ApiError::from)
        .map(|issued| ApiSuccess::new(StatusCode::CREATED, issued.into()))
}
