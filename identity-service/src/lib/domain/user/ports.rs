use async_trait::async_trait;
use auth::Credentials;
use auth::IssuedToken;

use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;

/// Port for registration and login.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new user with a hashed password and the default role.
    ///
    /// # Arguments
    /// * `command` - Validated username and password
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `Password` - Password hashing failed
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError>;

    /// Authenticate credentials and issue an access token.
    ///
    /// # Arguments
    /// * `credentials` - Username and plaintext password
    ///
    /// # Returns
    /// Signed token and its validity window
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown user or wrong password
    /// * `Token` - Token signing failed
    /// * `DatabaseError` - Database operation failed
    async fn login(&self, credentials: Credentials) -> Result<IssuedToken, UserError>;

    /// Retrieve all registered users.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_users(&self) -> Result<Vec<User>, UserError>;
}

/// Credential storage for the user aggregate.
///
/// Username uniqueness is enforced by the store itself.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Retrieve user by username.
    ///
    /// # Arguments
    /// * `username` - Username to search for
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;

    /// Persist new user to storage.
    ///
    /// # Arguments
    /// * `user` - User entity to create
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `DatabaseError` - Database operation failed
    async fn save(&self, user: User) -> Result<User, UserError>;

    /// Retrieve all users from storage.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_all(&self) -> Result<Vec<User>, UserError>;
}
