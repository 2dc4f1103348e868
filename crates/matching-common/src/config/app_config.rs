//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub snowflake: SnowflakeConfig,
    pub payment: PaymentConfig,
    pub settlement: SettlementConfig,
    pub estimate: EstimateConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending SQL migrations at startup
    #[serde(default)]
    pub run_migrations: bool,
}

/// Actor token verification
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Snowflake ID generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub worker_id: u16,
}

/// External payment gateway
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Base URL of the gateway API, e.g. `https://pg.example.com/v1`
    pub base_url: String,
    pub merchant_id: String,
    /// Sent as `Authorization: SECRET_KEY <key>`
    pub secret_key: String,
    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,
    /// Public base URL of this API, used to build the gateway redirect callbacks
    pub callback_base_url: String,
}

impl PaymentConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Reconciliation sweep for payments stuck in `NOT_PAID`
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    #[serde(default = "default_true")]
    pub reconcile_enabled: bool,
    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,
    #[serde(default = "default_reconcile_grace_secs")]
    pub reconcile_grace_secs: i64,
    #[serde(default = "default_reconcile_batch_size")]
    pub reconcile_batch_size: i64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            reconcile_enabled: true,
            reconcile_interval_secs: default_reconcile_interval_secs(),
            reconcile_grace_secs: default_reconcile_grace_secs(),
            reconcile_batch_size: default_reconcile_batch_size(),
        }
    }
}

/// Estimate building policy
#[derive(Debug, Clone, Deserialize)]
pub struct EstimateConfig {
    #[serde(default = "default_true")]
    pub reject_unknown_options: bool,
}

// Default value functions
fn default_app_name() -> String {
    "matching-engine".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    50
}

fn default_gateway_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_reconcile_interval_secs() -> u64 {
    60
}

fn default_reconcile_grace_secs() -> i64 {
    900 // 15 minutes
}

fn default_reconcile_batch_size() -> i64 {
    100
}

/// Read a required variable
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

/// Read and parse a required variable
fn required_parsed<T: FromStr>(name: &'static str) -> Result<T, ConfigError> {
    let raw = required(name)?;
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name, raw))
}

/// Read and parse an optional variable; a present but unparsable value is an error
fn parsed_or<T: FromStr>(name: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(default()),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: parsed_or("APP_ENV", Environment::default)?,
            },
            api: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| default_host()),
                port: required_parsed("API_PORT")?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: parsed_or("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
                run_migrations: parsed_or("DATABASE_RUN_MIGRATIONS", || false)?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: parsed_or(
                    "RATE_LIMIT_REQUESTS_PER_SECOND",
                    default_requests_per_second,
                )?,
                burst: parsed_or("RATE_LIMIT_BURST", default_burst)?,
            },
            cors: CorsConfig {
                allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .ok()
                    .map(|s| s.split(',').map(str::trim).map(String::from).collect())
                    .unwrap_or_default(),
            },
            snowflake: SnowflakeConfig {
                worker_id: parsed_or("WORKER_ID", || 0)?,
            },
            payment: PaymentConfig {
                base_url: required("PAYMENT_GATEWAY_URL")?,
                merchant_id: required("PAYMENT_MERCHANT_ID")?,
                secret_key: required("PAYMENT_SECRET_KEY")?,
                timeout_secs: parsed_or("PAYMENT_TIMEOUT_SECS", default_gateway_timeout_secs)?,
                callback_base_url: required("PAYMENT_CALLBACK_BASE_URL")?,
            },
            settlement: SettlementConfig {
                reconcile_enabled: parsed_or("RECONCILE_ENABLED", default_true)?,
                reconcile_interval_secs: parsed_or(
                    "RECONCILE_INTERVAL_SECS",
                    default_reconcile_interval_secs,
                )?,
                reconcile_grace_secs: parsed_or("RECONCILE_GRACE_SECS", default_reconcile_grace_secs)?,
                reconcile_batch_size: parsed_or("RECONCILE_BATCH_SIZE", default_reconcile_batch_size)?,
            },
            estimate: EstimateConfig {
                reject_unknown_options: parsed_or("ESTIMATE_REJECT_UNKNOWN_OPTIONS", default_true)?,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
