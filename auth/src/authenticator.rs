use std::sync::Arc;

use async_trait::async_trait;

use crate::principal::Credentials;
use crate::principal::Principal;

/// Authentication operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    /// Unknown username or wrong password; deliberately does not say which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The backing user lookup could not be completed.
    #[error("Authentication service unavailable: {0}")]
    Unavailable(String),
}

/// A single strategy for turning credentials into a principal.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync + 'static {
    /// Verify credentials.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Credentials were rejected
    /// * `Unavailable` - The provider could not reach its user source
    async fn authenticate(&self, credentials: &Credentials)
        -> Result<Principal, AuthenticationError>;
}

/// Entry point used by login and by credential-based request filters.
///
/// Callers depend on this seam rather than on a concrete provider.
#[async_trait]
pub trait AuthenticationManager: Send + Sync + 'static {
    async fn authenticate(&self, credentials: &Credentials)
        -> Result<Principal, AuthenticationError>;
}

/// Authentication manager delegating to an ordered list of providers.
///
/// The first provider to accept the credentials wins. A rejection moves on
/// to the next provider; an `Unavailable` error stops the chain.
#[derive(Clone, Default)]
pub struct ProviderManager {
    providers: Vec<Arc<dyn AuthenticationProvider>>,
}

impl ProviderManager {
    pub fn new(providers: Vec<Arc<dyn AuthenticationProvider>>) -> Self {
        Self { providers }
    }

    /// Append a provider to the end of the chain.
    pub fn with_provider(mut self, provider: Arc<dyn AuthenticationProvider>) -> Self {
        self.providers.push(provider);
        self
    }
}

#[async_trait]
impl AuthenticationManager for ProviderManager {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Principal, AuthenticationError> {
        for provider in &self.providers {
            match provider.authenticate(credentials).await {
                Ok(principal) => return Ok(principal),
                Err(AuthenticationError::InvalidCredentials) => continue,
                Err(err) => return Err(err),
            }
        }

        tracing::debug!(username = %credentials.username, "No provider accepted credentials");
        Err(AuthenticationError::InvalidCredentials)
    }
}
