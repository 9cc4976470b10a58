use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    100
}
fn default_min_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Mark the auth cookie `Secure`. Enable in production (HTTPS only).
    #[serde(default)]
    pub cookie_secure: bool,
    /// Token lifetime for students and admins. Default: 3 hours.
    #[serde(default = "default_token_hours")]
    pub token_hours: i64,
    /// Token lifetime for super-admins. Default: 1 hour.
    #[serde(default = "default_super_token_hours")]
    pub super_token_hours: i64,
}

fn default_token_hours() -> i64 {
    3
}
fn default_super_token_hours() -> i64 {
    1
}

impl AuthConfig {
    /// How long a freshly issued token stays valid.
    pub fn token_ttl(&self, is_super: bool) -> chrono::Duration {
        if is_super {
            chrono::Duration::hours(self.super_token_hours)
        } else {
            chrono::Duration::hours(self.token_hours)
        }
    }
}

/// Remote code execution service used for coding contests.
#[derive(Debug, Deserialize, Clone)]
pub struct Judge0Config {
    /// Base URL of the Judge0 API. Default: "http://localhost:2358".
    #[serde(default = "default_judge0_url")]
    pub base_url: String,
    /// Sent as `X-RapidAPI-Key` when set.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sent as `X-RapidAPI-Host` when set.
    #[serde(default)]
    pub api_host: Option<String>,
    /// Per-request timeout in seconds. Default: 15.
    #[serde(default = "default_judge0_timeout")]
    pub timeout_secs: u64,
}

fn default_judge0_url() -> String {
    "http://localhost:2358".into()
}
fn default_judge0_timeout() -> u64 {
    15
}

impl Default for Judge0Config {
    fn default() -> Self {
        Self {
            base_url: default_judge0_url(),
            api_key: None,
            api_host: None,
            timeout_secs: default_judge0_timeout(),
        }
    }
}

/// Bootstrap super-admin, created on startup if the email is not taken.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    pub super_name: Option<String>,
    pub super_email: Option<String>,
    pub super_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub judge0: Judge0Config,
    #[serde(default)]
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., QUIZ__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("QUIZ")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
