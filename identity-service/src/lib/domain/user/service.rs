use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationManager;
use auth::Credentials;
use auth::IssuedToken;
use auth::PasswordHasher;
use auth::Role;
use auth::TokenCodec;
use chrono::Utc;

use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::AuthServicePort;
use crate::user::ports::CredentialStore;

/// Domain service implementation for registration and login.
///
/// Registration goes through the password hasher and the credential store;
/// login goes through the authentication manager and the token codec.
pub struct AuthService<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    authentication_manager: Arc<dyn AuthenticationManager>,
    token_codec: Arc<TokenCodec>,
    password_hasher: PasswordHasher,
}

impl<S> AuthService<S>
where
    S: CredentialStore,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential store implementation
    /// * `authentication_manager` - Verifies login credentials
    /// * `token_codec` - Signs access tokens
    pub fn new(
        store: Arc<S>,
        authentication_manager: Arc<dyn AuthenticationManager>,
        token_codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            store,
            authentication_manager,
            token_codec,
            password_hasher: PasswordHasher::new(),
        }
    }
}

#[async_trait]
impl<S> AuthServicePort for AuthService<S>
where
    S: CredentialStore,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError> {
        // Cheap pre-check; the store's uniqueness guarantee still decides races.
        if self
            .store
            .find_by_username(&command.username)
            .await?
            .is_some()
        {
            return Err(UserError::UsernameAlreadyExists(
                command.username.as_str().to_string(),
            ));
        }

        let password_hash = self.password_hasher.hash(command.password.expose())?;

        let user = User {
            id: UserId::new(),
            username: command.username,
            password_hash,
            roles: BTreeSet::from([Role::User]),
            created_at: Utc::now(),
        };

        let created_user = self.store.save(user).await?;
        tracing::info!(
            user_id = %created_user.id,
            username = %created_user.username,
            "User registered"
        );

        Ok(created_user)
    }

    async fn login(&self, credentials: Credentials) -> Result<IssuedToken, UserError> {
        let principal = self
            .authentication_manager
            .authenticate(&credentials)
            .await
            .map_err(|e| {
                tracing::warn!(username = %credentials.username, error = %e, "Login rejected");
                UserError::from(e)
            })?;

        let issued = self.token_codec.issue(&principal, Utc::now())?;
        tracing::info!(
            username = %principal.username,
            expires_at = %issued.expires_at,
            "Access token issued"
        );

        Ok(issued)
    }

    async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.store.list_all().await
    }
}
