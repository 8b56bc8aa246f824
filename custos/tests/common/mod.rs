use std::sync::Arc;
use std::time::Duration;

use auth::HashingParams;
use auth::PasswordHasher;
use chrono::Utc;
use custos::domain::token::TokenService;
use custos::domain::token::TokenSettings;
use custos::domain::user::models::CredentialPolicy;
use custos::domain::user::models::NewUser;
use custos::domain::user::models::Role;
use custos::domain::user::models::User;
use custos::domain::user::service::AuthService;
use custos::inbound::http::router::create_router;
use custos::outbound::repositories::InMemoryUserDirectory;
use custos::user::ports::UserDirectory;

pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub directory: Arc<InMemoryUserDirectory>,
    pub api_client: reqwest::Client,
    pub token_settings: TokenSettings,
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

        let directory = Arc::new(InMemoryUserDirectory::new());

        let token_settings = TokenSettings {
            secret: TEST_SECRET.to_string(),
            issuer: "custos".to_string(),
            ttl: Duration::from_secs(900),
        };
        let tokens = Arc::new(TokenService::new(&token_settings).expect("Invalid token settings"));

        let auth_service = AuthService::new(
            Arc::clone(&directory),
            tokens,
            Self::hasher(),
            CredentialPolicy::default(),
        );

        let router = create_router(Arc::new(auth_service), Duration::from_secs(10));

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            directory,
            api_client: reqwest::Client::new(),
            token_settings,
        }
    }

    /// Cheap Argon2 parameters so tests stay fast
    pub fn hasher() -> PasswordHasher {
        PasswordHasher::new(HashingParams {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .expect("Invalid hashing params")
    }

    /// Insert a user with the given role straight into the directory
    pub async fn seed_user(&self, username: &str, password: &str, role: Role) -> User {
        let mut user = NewUser::registered(
            username.to_string(),
            format!("{}@example.com", username),
            Self::hasher().hash(password).expect("Failed to hash password"),
            Utc::now(),
        );
        user.role = role;

        self.directory
            .create(user)
            .await
            .expect("Failed to seed user")
    }

    /// Register a user through the API and return the response
    pub async fn register(&self, username: &str, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/register")
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in through the API and return the response
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/login")
            .json(&serde_json::json!({
                "username": username,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the access token
    pub async fn login_token(&self, username: &str, password: &str) -> String {
        let body: serde_json::Value = self
            .login(username, password)
            .await
            .json()
            .await
            .expect("Failed to parse response");

        body["data"]["access_token"]
            .as_str()
            .expect("No access token in response")
            .to_string()
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
}
