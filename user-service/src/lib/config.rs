use std::env;

use auth::Authenticator;
use auth::JwtHandler;
use auth::PasswordHasher;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Minimum accepted length of a signing secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Longest session lifetime accepted from configuration.
pub const MAX_EXPIRATION_DAYS: i64 = 3_650;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default)]
    pub key_id: Option<String>,
    #[serde(default = "default_expiration_days")]
    pub expiration_days: i64,
    #[serde(default)]
    pub retired_keys: Vec<RetiredKeyConfig>,
}

/// A previous signing key still accepted for verification.
#[derive(Debug, Deserialize, Clone)]
pub struct RetiredKeyConfig {
    pub key_id: String,
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_max_connections() -> u32 {
    5
}

fn default_expiration_days() -> i64 {
    auth::jwt::handler::DEFAULT_TOKEN_LIFETIME_DAYS
}

fn default_iterations() -> u32 {
    auth::password::pbkdf2::DEFAULT_ITERATIONS
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:4200".to_string(),
        "https://localhost:4200".to_string(),
    ]
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (APP__DATABASE__URL, APP__JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: APP__JWT__SECRET=... overrides jwt.secret
            .add_source(environment())
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the service cannot run safely with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }

        if let Some(key) = self
            .jwt
            .retired_keys
            .iter()
            .find(|key| key.secret.len() < MIN_SECRET_LENGTH)
        {
            return Err(ConfigError::Message(format!(
                "jwt.retired_keys[{}].secret must be at least {} bytes",
                key.key_id, MIN_SECRET_LENGTH
            )));
        }

        if !(1..=MAX_EXPIRATION_DAYS).contains(&self.jwt.expiration_days) {
            return Err(ConfigError::Message(format!(
                "jwt.expiration_days must be between 1 and {}",
                MAX_EXPIRATION_DAYS
            )));
        }

        Ok(())
    }
}

/// `APP__`-prefixed variables; `cors.allowed_origins` is comma separated.
fn environment() -> Environment {
    Environment::with_prefix("APP")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors.allowed_origins")
}

impl JwtConfig {
    /// Build the token handler, current key first, then retired keys.
    ///
    /// The lifetime is clamped to `0..=MAX_EXPIRATION_DAYS` even when the
    /// config was never validated.
    pub fn jwt_handler(&self) -> JwtHandler {
        let lifetime_days = self.expiration_days.clamp(0, MAX_EXPIRATION_DAYS);
        let mut handler = JwtHandler::new(self.secret.as_bytes())
            .with_token_lifetime(chrono::Duration::days(lifetime_days));

        if let Some(key_id) = &self.key_id {
            handler = handler.with_key_id(key_id.clone());
        }

        for retired in &self.retired_keys {
            handler = handler.with_retired_key(retired.key_id.clone(), retired.secret.as_bytes());
        }

        handler
    }
}

impl Config {
    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(
            PasswordHasher::with_iterations(self.password.iterations),
            self.jwt.jwt_handler(),
        )
    }
}
