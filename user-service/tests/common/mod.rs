use std::sync::Arc;

use auth::Authenticator;
use auth::JwtHandler;
use auth::PasswordHasher;
use serde_json::json;
use user_service::config::CorsConfig;
use user_service::config::JwtConfig;
use user_service::domain::user::service::UserService;
use user_service::inbound::http::router::create_router;
use user_service::outbound::repositories::InMemoryUserRepository;

pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

pub const STRONG_PASSWORD: &str = "Str0ng!Pass";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub jwt_handler: JwtHandler,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let jwt_config = JwtConfig {
            secret: TEST_SECRET.to_string(),
            key_id: Some("test".to_string()),
            expiration_days: 7,
            retired_keys: Vec::new(),
        };

        // Low iteration count keeps the suite fast
        let authenticator = Arc::new(Authenticator::new(
            PasswordHasher::with_iterations(1_000),
            jwt_config.jwt_handler(),
        ));

        let user_repo = Arc::new(InMemoryUserRepository::new());
        let user_service = Arc::new(UserService::new(user_repo, authenticator));

        let router = create_router(user_service, &CorsConfig::default());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::builder()
                .build()
                .expect("Failed to create reqwest client"),
            jwt_handler: jwt_config.jwt_handler(),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register a user with fixed names and return the response
    pub async fn register(&self, username: &str, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/user/register")
            .json(&json!({
                "first_name": "Alice",
                "last_name": "Liddell",
                "username": username,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Authenticate and return the response
    pub async fn authenticate(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/api/user/authenticate")
            .json(&json!({
                "username": username,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
