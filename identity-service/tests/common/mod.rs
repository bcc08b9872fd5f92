use std::collections::BTreeSet;
use std::sync::Arc;

use auth::PasswordHasher;
use auth::Role;
use auth::SigningAlgorithm;
use auth::TokenCodec;
use chrono::Utc;
use identity_service::config::Config;
use identity_service::config::DatabaseConfig;
use identity_service::config::JwtConfig;
use identity_service::config::SecurityConfig;
use identity_service::config::ServerConfig;
use identity_service::config::StoreBackend;
use identity_service::domain::user::models::User;
use identity_service::domain::user::models::UserId;
use identity_service::domain::user::models::Username;
use identity_service::outbound::repositories::InMemoryCredentialStore;
use identity_service::startup::build_router;

pub const JWT_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const ADMIN_USERNAME: &str = "root_admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub token_codec: TokenCodec,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp.
    ///
    /// The in-memory store is seeded with one administrator.
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let config = Config {
            server: ServerConfig { http_port: port },
            jwt: JwtConfig {
                secret: JWT_SECRET.to_string(),
                algorithm: SigningAlgorithm::Hs256,
                expiration_minutes: 60,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: String::new(),
                max_connections: 1,
            },
            security: SecurityConfig::default(),
        };

        let admin = User {
            id: UserId::new(),
            username: Username::new(ADMIN_USERNAME.to_string()).unwrap(),
            password_hash: PasswordHasher::new().hash(ADMIN_PASSWORD).unwrap(),
            roles: BTreeSet::from([Role::User, Role::Admin]),
            created_at: Utc::now(),
        };
        let store = Arc::new(InMemoryCredentialStore::with_users([admin]));

        let router = build_router(store, &config).expect("Failed to build router");

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            token_codec: TokenCodec::new(
                JWT_SECRET.as_bytes(),
                SigningAlgorithm::Hs256,
                config.jwt.ttl().unwrap(),
            ),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/register")
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/login")
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the issued token, panicking on failure.
    pub async fn token_for(&self, username: &str, password: &str) -> String {
        let response = self.login(username, password).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }
}
