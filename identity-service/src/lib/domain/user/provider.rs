use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::AuthenticationProvider;
use auth::Credentials;
use auth::PasswordError;
use auth::PasswordHasher;
use auth::Principal;

use crate::domain::user::models::Username;
use crate::user::ports::CredentialStore;

/// Authenticates credentials against the credential store.
///
/// Unknown usernames and wrong passwords produce the same error. When the
/// user does not exist a verification against a fixed dummy hash still runs,
/// so both paths cost one Argon2 verification.
pub struct StoreAuthenticationProvider<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    password_hasher: PasswordHasher,
    dummy_hash: String,
}

impl<S> StoreAuthenticationProvider<S>
where
    S: CredentialStore,
{
    /// # Errors
    /// * `HashingFailed` - The dummy hash could not be computed
    pub fn new(store: Arc<S>) -> Result<Self, PasswordError> {
        let password_hasher = PasswordHasher::new();
        let dummy_hash = password_hasher
            .hash("timing-equalizer-password")
            .inspect_err(|e| tracing::error!(error = %e, "Failed to compute dummy password hash"))?;

        Ok(Self {
            store,
            password_hasher,
            dummy_hash,
        })
    }
}

#[async_trait]
impl<S> AuthenticationProvider for StoreAuthenticationProvider<S>
where
    S: CredentialStore,
{
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Principal, AuthenticationError> {
        let user = match Username::new(credentials.username.clone()) {
            Ok(username) => self
                .store
                .find_by_username(&username)
                .await
                .map_err(|e| AuthenticationError::Unavailable(e.to_string()))?,
            Err(_) => None,
        };

        let Some(user) = user else {
            let _ = self
                .password_hasher
                .verify(&credentials.password, &self.dummy_hash);
            tracing::debug!(username = %credentials.username, "Authentication failed: unknown user");
            return Err(AuthenticationError::InvalidCredentials);
        };

        if !self
            .password_hasher
            .verify(&credentials.password, &user.password_hash)
        {
            tracing::debug!(username = %credentials.username, "Authentication failed: password mismatch");
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(user.principal())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use auth::Role;
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::User;
    use crate::domain::user::models::UserId;
    use crate::user::errors::UserError;

    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;
            async fn save(&self, user: User) -> Result<User, UserError>;
            async fn list_all(&self) -> Result<Vec<User>, UserError>;
        }
    }

    fn stored_user(password: &str) -> User {
        User {
            id: UserId::new(),
            username: Username::new("alice".to_string()).unwrap(),
            password_hash: PasswordHasher::new().hash(password).unwrap(),
            roles: BTreeSet::from([Role::User]),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_dummy_hash_is_verifiable() {
        let provider =
            StoreAuthenticationProvider::new(Arc::new(MockTestCredentialStore::new())).unwrap();

        assert!(provider.dummy_hash.starts_with("$argon2id$"));
        assert!(provider
            .password_hasher
            .verify("timing-equalizer-password", &provider.dummy_hash));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut store = MockTestCredentialStore::new();
        let user = stored_user("s3cret");
        store
            .expect_find_by_username()
            .withf(|username| username.as_str() == "alice")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let provider = StoreAuthenticationProvider::new(Arc::new(store)).unwrap();
        let principal = provider
            .authenticate(&Credentials::new("alice", "s3cret"))
            .await
            .expect("Authentication failed");

        assert_eq!(principal, Principal::new("alice", [Role::User]));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let mut store = MockTestCredentialStore::new();
        let user = stored_user("s3cret");
        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let provider = StoreAuthenticationProvider::new(Arc::new(store)).unwrap();
        let result = provider
            .authenticate(&Credentials::new("alice", "wrong-password"))
            .await;

        assert_eq!(result, Err(AuthenticationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));

        let provider = StoreAuthenticationProvider::new(Arc::new(store)).unwrap();
        let result = provider
            .authenticate(&Credentials::new("nobody", "s3cret"))
            .await;

        assert_eq!(result, Err(AuthenticationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_malformed_username_skips_lookup() {
        let mut store = MockTestCredentialStore::new();
        store.expect_find_by_username().times(0);

        let provider = StoreAuthenticationProvider::new(Arc::new(store)).unwrap();
        let result = provider
            .authenticate(&Credentials::new("a b", "s3cret"))
            .await;

        assert_eq!(result, Err(AuthenticationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_corrupt_stored_hash() {
        let mut store = MockTestCredentialStore::new();
        let mut user = stored_user("s3cret");
        user.password_hash = "not-a-phc-string".to_string();
        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let provider = StoreAuthenticationProvider::new(Arc::new(store)).unwrap();
        let result = provider
            .authenticate(&Credentials::new("alice", "s3cret"))
            .await;

        assert_eq!(result, Err(AuthenticationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_store_failure() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Err(UserError::DatabaseError("connection reset".to_string())));

        let provider = StoreAuthenticationProvider::new(Arc::new(store)).unwrap();
        let result = provider
            .authenticate(&Credentials::new("alice", "s3cret"))
            .await;

        assert!(matches!(result, Err(AuthenticationError::Unavailable(_))));
    }
}
