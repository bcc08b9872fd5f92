use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::user::models::User;
use crate::domain::user::models::Username;
use crate::domain::user::ports::CredentialStore;
use crate::user::errors::UserError;

/// Process-local credential store keyed by username.
///
/// The uniqueness check and the insert happen under the same write lock.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `users`; later duplicates overwrite earlier ones.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.username.as_str().to_string(), user))
            .collect();

        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(username.as_str()).cloned())
    }

    async fn save(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;
        if users.contains_key(user.username.as_str()) {
            return Err(UserError::UsernameAlreadyExists(
                user.username.as_str().to_string(),
            ));
        }

        users.insert(user.username.as_str().to_string(), user.clone());
        Ok(user)
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.username.as_str().cmp(b.username.as_str()))
        });
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use auth::Role;
    use chrono::Duration;
    use chrono::Utc;

    use super::*;
    use crate::domain::user::models::UserId;

    fn user(name: &str) -> User {
        User {
            id: UserId::new(),
            username: Username::new(name.to_string()).unwrap(),
            password_hash: "$argon2id$stub".to_string(),
            roles: BTreeSet::from([Role::User]),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let store = InMemoryCredentialStore::new();
        let saved = store.save(user("alice")).await.expect("Save failed");

        let found = store
            .find_by_username(&saved.username)
            .await
            .expect("Lookup failed")
            .expect("User missing");
        assert_eq!(found.id, saved.id);

        let missing = store
            .find_by_username(&Username::new("bob".to_string()).unwrap())
            .await
            .expect("Lookup failed");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_save_duplicate_username() {
        let store = InMemoryCredentialStore::new();
        store.save(user("alice")).await.expect("Save failed");

        let result = store.save(user("alice")).await;
        assert!(matches!(
            result.unwrap_err(),
            UserError::UsernameAlreadyExists(name) if name == "alice"
        ));
    }

    #[tokio::test]
    async fn test_concurrent_registration_single_winner() {
        let store = Arc::new(InMemoryCredentialStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.save(user("alice")).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.expect("Task panicked").is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let mut older = user("older");
        older.created_at = Utc::now() - Duration::hours(1);
        let store = InMemoryCredentialStore::with_users([older, user("newer")]);

        let users = store.list_all().await.expect("Listing failed");
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["newer", "older"]);
    }
}
