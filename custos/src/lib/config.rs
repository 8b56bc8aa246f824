use std::env;
use std::time::Duration;

use auth::HashingParams;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::token::TokenSettings;
use crate::domain::user::models::CredentialPolicy;
use crate::domain::user::models::LengthBounds;

const DEVELOPMENT_MODE: &str = "development";

/// Signing secret shipped in config/development.toml.
const DEVELOPMENT_SECRET: &str = "development-only-signing-secret-do-not-deploy";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub hashing: HashingConfig,
}

/// Without a URL the service falls back to the in-memory directory.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub http_port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 3000,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "JwtConfig::default_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "JwtConfig::default_issuer")]
    pub issuer: String,
}

impl JwtConfig {
    fn default_ttl_seconds() -> u64 {
        900
    }

    fn default_issuer() -> String {
        "custos".to_string()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CredentialsConfig {
    pub username_min: usize,
    pub username_max: usize,
    pub password_min: usize,
    pub password_max: usize,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        let policy = CredentialPolicy::default();
        Self {
            username_min: policy.username.min,
            username_max: policy.username.max,
            password_min: policy.password.min,
            password_max: policy.password.max,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        let params = HashingParams::default();
        Self {
            memory_kib: params.memory_kib,
            iterations: params.iterations,
            parallelism: params.parallelism,
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (CUSTOS__JWT__SECRET, CUSTOS__DATABASE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| DEVELOPMENT_MODE.to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: CUSTOS__DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("CUSTOS").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.check_secret(&run_mode)?;

        Ok(config)
    }

    /// Refuses secrets that must never sign production tokens.
    ///
    /// # Errors
    /// * `Message` - The secret is blank, or is the development secret outside development
    pub fn check_secret(&self, run_mode: &str) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret is empty".to_string()));
        }
        if run_mode != DEVELOPMENT_MODE && self.jwt.secret == DEVELOPMENT_SECRET {
            return Err(ConfigError::Message(format!(
                "jwt.secret is the development secret but RUN_MODE is {}; set CUSTOS__JWT__SECRET",
                run_mode
            )));
        }

        Ok(())
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            secret: self.jwt.secret.clone(),
            issuer: self.jwt.issuer.clone(),
            ttl: Duration::from_secs(self.jwt.ttl_seconds),
        }
    }

    /// Length bounds for registration.
    ///
    /// # Errors
    /// * `Message` - A minimum exceeds its maximum
    pub fn credential_policy(&self) -> Result<CredentialPolicy, ConfigError> {
        let credentials = &self.credentials;

        if credentials.username_min > credentials.username_max {
            return Err(ConfigError::Message(format!(
                "credentials.username_min ({}) exceeds credentials.username_max ({})",
                credentials.username_min, credentials.username_max
            )));
        }
        if credentials.password_min > credentials.password_max {
            return Err(ConfigError::Message(format!(
                "credentials.password_min ({}) exceeds credentials.password_max ({})",
                credentials.password_min, credentials.password_max
            )));
        }

        Ok(CredentialPolicy {
            username: LengthBounds::new(credentials.username_min, credentials.username_max),
            password: LengthBounds::new(credentials.password_min, credentials.password_max),
        })
    }

    pub fn hashing_params(&self) -> HashingParams {
        HashingParams {
            memory_kib: self.hashing.memory_kib,
            iterations: self.hashing.iterations,
            parallelism: self.hashing.parallelism,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}
