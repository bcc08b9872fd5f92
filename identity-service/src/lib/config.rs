use std::env;

use auth::Access;
use auth::AuthorizationPolicy;
use auth::AuthorizationRule;
use auth::PathPattern;
use auth::Role;
use auth::SigningAlgorithm;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default)]
    pub algorithm: SigningAlgorithm,
    #[serde(default = "default_expiration_minutes")]
    pub expiration_minutes: i64,
}

impl JwtConfig {
    pub const MIN_SECRET_BYTES: usize = 32;
    /// Thirty days.
    pub const MAX_EXPIRATION_MINUTES: i64 = 30 * 24 * 60;

    /// Token lifetime.
    ///
    /// # Errors
    /// Fails when `expiration_minutes` is not in `1..=MAX_EXPIRATION_MINUTES`.
    pub fn ttl(&self) -> Result<chrono::Duration, ConfigError> {
        if !(1..=Self::MAX_EXPIRATION_MINUTES).contains(&self.expiration_minutes) {
            return Err(ConfigError::Message(format!(
                "jwt.expiration_minutes must be between 1 and {}",
                Self::MAX_EXPIRATION_MINUTES
            )));
        }

        chrono::Duration::try_minutes(self.expiration_minutes).ok_or_else(|| {
            ConfigError::Message("jwt.expiration_minutes is out of range".to_string())
        })
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[redacted]")
            .field("algorithm", &self.algorithm)
            .field("expiration_minutes", &self.expiration_minutes)
            .finish()
    }
}

fn default_expiration_minutes() -> i64 {
    60
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub rules: Vec<AuthorizationRule>,
}

impl SecurityConfig {
    /// Policy built from the configured rules, or the default rule set when
    /// none are configured.
    pub fn authorization_policy(&self) -> AuthorizationPolicy {
        if self.rules.is_empty() {
            default_authorization_policy()
        } else {
            AuthorizationPolicy::new(self.rules.clone())
        }
    }
}

/// `/register`, `/login` and `/health` are public, `/users` needs the admin
/// role; everything else requires authentication.
pub fn default_authorization_policy() -> AuthorizationPolicy {
    let exact = |path: &str| PathPattern::Exact(path.to_string());

    AuthorizationPolicy::new(vec![
        AuthorizationRule::new(exact("/register"), Access::Public),
        AuthorizationRule::new(exact("/login"), Access::Public),
        AuthorizationRule::new(exact("/health"), Access::Public),
        AuthorizationRule::new(
            PathPattern::Prefix("/users".to_string()),
            Access::HasRole(Role::Admin),
        ),
    ])
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
        Self::load_from("config", &run_mode, Environment::default().separator("__"))
    }

    fn load_from(
        config_dir: &str,
        run_mode: &str,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        let configuration = ConfigBuilder::builder()
            .set_default("server.http_port", 8080)?
            // Start with default configuration
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(environment)
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < JwtConfig::MIN_SECRET_BYTES {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes",
                JwtConfig::MIN_SECRET_BYTES
            )));
        }
        self.jwt.ttl()?;
        if self.database.backend == StoreBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "database.url is required for the postgres backend".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use auth::Decision;
    use auth::Principal;
    use auth::SecurityContext;

    use super::*;

    fn config(secret: &str) -> Config {
        Config {
            server: ServerConfig { http_port: 0 },
            jwt: JwtConfig {
                secret: secret.to_string(),
                algorithm: SigningAlgorithm::Hs256,
                expiration_minutes: 60,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: String::new(),
                max_connections: 5,
            },
            security: SecurityConfig::default(),
        }
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(config("too-short").validate().is_err());
        assert!(config("0123456789abcdef0123456789abcdef").validate().is_ok());
    }

    #[test]
    fn test_expiration_bounds() {
        let mut config = config("0123456789abcdef0123456789abcdef");

        config.jwt.expiration_minutes = 0;
        assert!(config.validate().is_err());

        config.jwt.expiration_minutes = JwtConfig::MAX_EXPIRATION_MINUTES + 1;
        assert!(config.validate().is_err());

        config.jwt.expiration_minutes = i64::MAX / 2;
        assert!(config.validate().is_err());
        assert!(config.jwt.ttl().is_err());

        config.jwt.expiration_minutes = JwtConfig::MAX_EXPIRATION_MINUTES;
        assert!(config.validate().is_ok());
        assert_eq!(config.jwt.ttl().unwrap(), chrono::Duration::days(30));
    }

    #[test]
    fn test_environment_overrides_files() {
        let config_dir = env!("CARGO_MANIFEST_DIR").to_string() + "/config";
        let environment = Environment::default().separator("__").source(Some(
            [
                ("JWT__SECRET", "secret-from-the-environment-0123456789"),
                ("SERVER__HTTP_PORT", "9090"),
            ]
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        ));

        let config = Config::load_from(&config_dir, "development", environment)
            .expect("Failed to load configuration");

        assert_eq!(config.jwt.secret, "secret-from-the-environment-0123456789");
        assert_eq!(config.server.http_port, 9090);
        // config/development.toml overrides config/default.toml.
        assert_eq!(config.database.backend, StoreBackend::Memory);
        // Untouched keys come from config/default.toml.
        assert_eq!(config.jwt.expiration_minutes, 60);
        assert_eq!(config.security.rules.len(), 4);
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = config("0123456789abcdef0123456789abcdef");
        config.database.backend = StoreBackend::Postgres;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = config("0123456789abcdef0123456789abcdef");
        assert!(!format!("{:?}", config.jwt).contains("0123456789"));
    }

    #[test]
    fn test_default_policy() {
        let policy = SecurityConfig::default().authorization_policy();
        let anonymous = SecurityContext::anonymous();
        let user = SecurityContext::authenticated(Principal::new("alice", [Role::User]));

        assert_eq!(policy.evaluate("/register", &anonymous), Decision::Allow);
        assert_eq!(policy.evaluate("/login", &anonymous), Decision::Allow);
        assert_eq!(policy.evaluate("/health", &anonymous), Decision::Allow);
        assert_eq!(policy.evaluate("/me", &anonymous), Decision::Unauthenticated);
        assert_eq!(policy.evaluate("/me", &user), Decision::Allow);
        assert_eq!(
            policy.evaluate("/users", &user),
            Decision::Forbidden(Role::Admin)
        );
    }
}
