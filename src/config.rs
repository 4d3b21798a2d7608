//! Configuration module for ChatZone.

use serde::Deserialize;
use std::path::Path;

use crate::{ChatzoneError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Display name of this deployment.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Timezone for rendering ban expiries (e.g., "Europe/Paris", "UTC").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_server_name() -> String {
    "ChatZone".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            timezone: default_timezone(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/chatzone.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Administrator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Nickname of the singleton administrator.
    #[serde(default = "default_admin_nickname")]
    pub nickname: String,
    /// Seed credential, used until the administrator changes it.
    #[serde(default = "default_admin_credential")]
    pub credential: String,
    /// Profile picture shown for the administrator.
    #[serde(default = "default_profile_picture")]
    pub profile_picture: String,
}

fn default_admin_nickname() -> String {
    "Admin".to_string()
}

fn default_admin_credential() -> String {
    "admin".to_string()
}

fn default_profile_picture() -> String {
    crate::auth::DEFAULT_PROFILE_PICTURE.to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            nickname: default_admin_nickname(),
            credential: default_admin_credential(),
            profile_picture: default_profile_picture(),
        }
    }
}

/// A public room seeded at startup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DefaultRoom {
    /// Room ID.
    pub id: String,
    /// Room name.
    pub name: String,
    /// Theme color.
    #[serde(default)]
    pub color: Option<String>,
}

impl DefaultRoom {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: None,
        }
    }
}

/// Room configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomsConfig {
    /// Public rooms available at startup.
    #[serde(default = "default_rooms")]
    pub defaults: Vec<DefaultRoom>,
    /// Message retention window in hours.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

fn default_rooms() -> Vec<DefaultRoom> {
    vec![
        DefaultRoom::new("general", "General"),
        DefaultRoom::new("tech", "Tech"),
        DefaultRoom::new("random", "Random"),
    ]
}

fn default_retention_hours() -> u64 {
    24
}

/// Longest accepted retention window: ten years.
pub const MAX_RETENTION_HOURS: u64 = 24 * 366 * 10;

impl RoomsConfig {
    /// Retention window as a duration, clamped to [`MAX_RETENTION_HOURS`].
    pub fn retention(&self) -> chrono::Duration {
        let hours = self.retention_hours.min(MAX_RETENTION_HOURS);
        chrono::Duration::hours(hours as i64)
    }
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            defaults: default_rooms(),
            retention_hours: default_retention_hours(),
        }
    }
}

/// Automated participant configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Whether the automated participant replies in shared rooms.
    #[serde(default = "default_bot_enabled")]
    pub enabled: bool,
    /// API key for the language model. Empty means offline.
    #[serde(default)]
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_bot_model")]
    pub model: String,
    /// Base URL of the generative language API.
    #[serde(default = "default_bot_endpoint")]
    pub endpoint: String,
    /// Number of most recent messages sent as context.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Delay before a reply is requested, in milliseconds.
    #[serde(default = "default_reply_delay")]
    pub reply_delay_ms: u64,
    /// Total timeout for one model request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_bot_enabled() -> bool {
    true
}

fn default_bot_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_bot_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_history_limit() -> usize {
    10
}

fn default_reply_delay() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            enabled: default_bot_enabled(),
            api_key: String::new(),
            model: default_bot_model(),
            endpoint: default_bot_endpoint(),
            history_limit: default_history_limit(),
            reply_delay_ms: default_reply_delay(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/chatzone.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Administrator configuration.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Room configuration.
    #[serde(default)]
    pub rooms: RoomsConfig,
    /// Automated participant configuration.
    #[serde(default)]
    pub bot: BotConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ChatzoneError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ChatzoneError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `CHATZONE_ADMIN_CREDENTIAL`: seed administrator credential
    /// - `CHATZONE_BOT_API_KEY`: language model API key
    pub fn apply_env_overrides(&mut self) {
        if let Ok(credential) = std::env::var("CHATZONE_ADMIN_CREDENTIAL") {
            if !credential.is_empty() {
                self.admin.credential = credential;
            }
        }
        if let Ok(api_key) = std::env::var("CHATZONE_BOT_API_KEY") {
            if !api_key.is_empty() {
                self.bot.api_key = api_key;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.admin.credential.is_empty() {
            return Err(ChatzoneError::Config(
                "admin credential must not be empty. \
                 Set it in config.toml or via CHATZONE_ADMIN_CREDENTIAL."
                    .to_string(),
            ));
        }
        if self.rooms.retention_hours == 0 {
            return Err(ChatzoneError::Config(
                "rooms.retention_hours must be at least 1".to_string(),
            ));
        }
        if self.rooms.retention_hours > MAX_RETENTION_HOURS {
            return Err(ChatzoneError::Config(format!(
                "rooms.retention_hours must be at most {MAX_RETENTION_HOURS}"
            )));
        }
        if self.bot.history_limit == 0 {
            return Err(ChatzoneError::Config(
                "bot.history_limit must be at least 1".to_string(),
            ));
        }
        if self.server.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ChatzoneError::Config(format!(
                "unknown timezone: {}",
                self.server.timezone
            )));
        }
        Ok(())
    }
}
