use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::user::policy::PasswordPolicy;

/// Application configuration for identity-service.
///
/// Built once at start-up and passed down explicitly.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordPolicy,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// PostgreSQL configuration. Without a URL the in-memory store is used.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expiration_minutes")]
    pub expiration_minutes: i64,
}

fn default_expiration_minutes() -> i64 {
    60
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("expiration_minutes", &self.expiration_minutes)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RegistrationConfig {
    /// Let anyone call the administrator creation endpoint. Only meant for
    /// bootstrapping the first administrator.
    #[serde(default)]
    pub allow_open_admin_registration: bool,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, DATABASE__URL, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(toml: &str) -> Result<Config, ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = from_toml(
            r#"
            [server]
            http_port = 8080

            [jwt]
            secret = "test-secret-key-for-jwt-signing-at-least-32-bytes"
            "#,
        )
        .expect("Failed to parse config");

        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.jwt.expiration_minutes, 60);
        assert_eq!(config.password, PasswordPolicy::default());
        assert!(!config.registration.allow_open_admin_registration);
    }

    #[test]
    fn test_full_config() {
        let config = from_toml(
            r#"
            [server]
            http_port = 9000

            [database]
            url = "postgresql://localhost/identity"
            max_connections = 10

            [jwt]
            secret = "test-secret-key-for-jwt-signing-at-least-32-bytes"
            expiration_minutes = 15

            [password]
            min_length = 8
            require_digit = true

            [registration]
            allow_open_admin_registration = true
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.server.http_port, 9000);
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgresql://localhost/identity")
        );
        assert_eq!(config.jwt.expiration_minutes, 15);
        assert_eq!(config.password.min_length, 8);
        assert!(config.password.require_digit);
        assert!(!config.password.require_uppercase);
        assert!(config.registration.allow_open_admin_registration);
    }

    #[test]
    fn test_environment_overrides_jwt_secret() {
        // The only test in this binary that touches these variables.
        env::set_var("JWT__SECRET", "secret-from-environment-0123456789abcdef");
        env::set_var("JWT__EXPIRATION_MINUTES", "5");

        let config = Config::load();

        env::remove_var("JWT__SECRET");
        env::remove_var("JWT__EXPIRATION_MINUTES");

        let config = config.expect("Failed to load config");
        assert_eq!(config.jwt.secret, "secret-from-environment-0123456789abcdef");
        assert_eq!(config.jwt.expiration_minutes, 5);
    }

    #[test]
    fn test_jwt_secret_not_printed() {
        let jwt = JwtConfig {
            secret: "super-secret".to_string(),
            expiration_minutes: 60,
        };

        assert!(!format!("{:?}", jwt).contains("super-secret"));
    }
}
