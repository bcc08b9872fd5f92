use std::sync::Arc;

use auth::AuthenticationManager;
use auth::PasswordError;
use auth::ProviderManager;
use auth::TokenCodec;
use axum::Router;
use config::ConfigError;
use thiserror::Error;

use crate::config::Config;
use crate::domain::user::ports::AuthServicePort;
use crate::domain::user::ports::CredentialStore;
use crate::domain::user::provider::StoreAuthenticationProvider;
use crate::domain::user::service::AuthService;
use crate::inbound::http::router::create_router;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

/// Wires the auth pipeline around `store` and returns the HTTP application.
///
/// # Errors
/// * `Config` - The token lifetime in `config` is out of range
/// * `Password` - The authentication provider could not be initialized
pub fn build_router<S>(store: Arc<S>, config: &Config) -> Result<Router, StartupError>
where
    S: CredentialStore,
{
    let token_codec = Arc::new(TokenCodec::new(
        config.jwt.secret.as_bytes(),
        config.jwt.algorithm,
        config.jwt.ttl()?,
    ));

    let authentication_manager: Arc<dyn AuthenticationManager> = Arc::new(
        ProviderManager::default().with_provider(Arc::new(StoreAuthenticationProvider::new(
            Arc::clone(&store),
        )?)),
    );

    let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
        store,
        Arc::clone(&authentication_manager),
        Arc::clone(&token_codec),
    ));

    let authorization_policy = Arc::new(config.security.authorization_policy());
    tracing::debug!(
        rules = authorization_policy.rules().len(),
        algorithm = ?config.jwt.algorithm,
        ttl_minutes = config.jwt.expiration_minutes,
        "Auth pipeline configured"
    );

    Ok(create_router(
        auth_service,
        authentication_manager,
        token_codec,
        authorization_policy,
    ))
}
