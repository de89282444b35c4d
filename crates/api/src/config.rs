use serde::Deserialize;
use std::net::SocketAddr;

use chrono::Duration;
use domain::services::{ReconcilerSettings, RetentionPolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub reservations: ReservationsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Device inventory (Relution) connection.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    pub host: String,

    #[serde(default)]
    pub token: String,

    #[serde(default = "default_inventory_timeout")]
    pub timeout_secs: u64,

    /// Account the inventory reports for tablets nobody is logged into.
    #[serde(default = "default_shared_device_user")]
    pub shared_device_user: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_charging_lookback")]
    pub charging_lookback_minutes: i64,

    #[serde(default = "default_history_retention")]
    pub history_retention_days: i64,

    #[serde(default = "default_battery_retention")]
    pub battery_retention_days: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sync_interval(),
            charging_lookback_minutes: default_charging_lookback(),
            history_retention_days: default_history_retention(),
            battery_retention_days: default_battery_retention(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationsConfig {
    #[serde(default = "default_current_retention")]
    pub current_retention_minutes: i64,

    #[serde(default = "default_history_retention")]
    pub history_retention_days: i64,

    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for ReservationsConfig {
    fn default() -> Self {
        Self {
            current_retention_minutes: default_current_retention(),
            history_retention_days: default_history_retention(),
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

/// HTTP Basic credential checking.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Endpoint answering a GET carrying the caller's Basic credentials.
    #[serde(default)]
    pub url: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_inventory_timeout() -> u64 {
    10
}
fn default_shared_device_user() -> String {
    "AACHEN-VSA Device User".to_string()
}
fn default_sync_interval() -> u64 {
    60
}
fn default_charging_lookback() -> i64 {
    15
}
fn default_history_retention() -> i64 {
    30
}
fn default_battery_retention() -> i64 {
    7
}
fn default_current_retention() -> i64 {
    60
}
fn default_cleanup_interval() -> u64 {
    15
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with TF__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("TF").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Built from an embedded TOML string so tests do not depend on config files.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [inventory]
            host = "relution.test"
            token = "test-token"

            [sync]
            interval_secs = 60

            [reservations]
            current_retention_minutes = 60
            history_retention_days = 30
            cleanup_interval_minutes = 15

            [auth]
            enabled = false
            url = ""
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Validation is left to the caller so tests can build partial configs.
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "TF__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.inventory.host.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "TF__INVENTORY__HOST environment variable must be set".to_string(),
            ));
        }

        if self.sync.interval_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "sync.interval_secs cannot be 0".to_string(),
            ));
        }

        if self.reservations.cleanup_interval_minutes == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "reservations.cleanup_interval_minutes cannot be 0".to_string(),
            ));
        }

        let horizons = [
            ("sync.charging_lookback_minutes", self.sync.charging_lookback_minutes),
            ("sync.history_retention_days", self.sync.history_retention_days),
            ("sync.battery_retention_days", self.sync.battery_retention_days),
            (
                "reservations.current_retention_minutes",
                self.reservations.current_retention_minutes,
            ),
            (
                "reservations.history_retention_days",
                self.reservations.history_retention_days,
            ),
        ];
        if let Some((name, _)) = horizons.iter().find(|(_, value)| *value <= 0) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "{} must be positive",
                name
            )));
        }

        if self.auth.enabled && self.auth.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "auth.url is required when authentication is enabled".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn reconciler_settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            shared_device_user: self.inventory.shared_device_user.clone(),
            charging_lookback: Duration::minutes(self.sync.charging_lookback_minutes),
            history_retention: Duration::days(self.sync.history_retention_days),
            battery_retention: Duration::days(self.sync.battery_retention_days),
        }
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            current: Duration::minutes(self.reservations.current_retention_minutes),
            history: Duration::days(self.reservations.history_retention_days),
        }
    }
}
