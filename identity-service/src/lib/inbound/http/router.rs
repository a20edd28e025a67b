use std::sync::Arc;
use std::time::Duration;

use auth::TokenIssuer;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::create_user::create_admin;
use super::handlers::create_user::create_user;
use super::handlers::health::health;
use super::handlers::login::admin_login;
use super::handlers::login::login;
use super::handlers::me::me;
use super::middleware::authenticate as auth_middleware;
use super::middleware::require_admin;
use crate::domain::user::ports::IdentityServicePort;

#[derive(Clone)]
pub struct AppState {
    pub identity_service: Arc<dyn IdentityServicePort>,
    pub token_issuer: Arc<TokenIssuer>,
}

pub fn create_router(
    identity_service: Arc<dyn IdentityServicePort>,
    token_issuer: Arc<TokenIssuer>,
    allow_open_admin_registration: bool,
) -> Router {
    let state = AppState {
        identity_service,
        token_issuer,
    };

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/create", post(create_user))
        .route("/api/auth/login", post(login))
        .route("/api/auth/admin/login", post(admin_login));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = if allow_open_admin_registration {
        tracing::warn!("Administrator creation is open to unauthenticated callers");
        Router::new().route("/api/auth/admin/create", post(create_admin))
    } else {
        // Layers run outside-in: authenticate first, then check the role.
        Router::new()
            .route("/api/auth/admin/create", post(create_admin))
            .route_layer(middleware::from_fn(require_admin))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
    };

    // Headers are left out of the span: they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
