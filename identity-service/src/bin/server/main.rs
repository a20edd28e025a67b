use std::sync::Arc;

use auth::TokenIssuer;
use chrono::Duration;
use identity_service::config::Config;
use identity_service::domain::user::ports::IdentityServicePort;
use identity_service::domain::user::service::IdentityService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryUserRepository;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        persistent = config.database.url.is_some(),
        token_ttl_minutes = config.jwt.expiration_minutes,
        open_admin_registration = config.registration.allow_open_admin_registration,
        "Configuration loaded"
    );

    let token_issuer = Arc::new(TokenIssuer::new(
        config.jwt.secret.as_bytes(),
        Duration::minutes(config.jwt.expiration_minutes),
    )?);

    let identity_service: Arc<dyn IdentityServicePort> = match &config.database.url {
        Some(url) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            Arc::new(IdentityService::new(
                Arc::new(PostgresUserRepository::new(pg_pool)),
                Arc::clone(&token_issuer),
                config.password.clone(),
            ))
        }
        None => {
            tracing::warn!("No database configured, users and roles are kept in memory");

            Arc::new(IdentityService::new(
                Arc::new(InMemoryUserRepository::new()),
                Arc::clone(&token_issuer),
                config.password.clone(),
            ))
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        identity_service,
        token_issuer,
        config.registration.allow_open_admin_registration,
    );

    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited successfully");

    Ok(())
}
