//! Configuration for the doorsync daemon.
//!
//! TOML file + `DOORSYNC_`-prefixed environment variables, credential
//! resolution (env var → system keyring → plaintext), and translation
//! into `doorsync_core::BridgeConfig`. Loaded once before the bridge
//! starts; never re-read at runtime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doorsync_core::{BridgeConfig, CommandStyle};

/// Default production endpoint of the cloud service.
pub const DEFAULT_SERVICE_URL: &str = "https://api.myqdevice.com";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured (set password, password_env, or a keyring entry)")]
    NoCredentials,

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// On-disk daemon configuration.
///
/// Interval fields are plain seconds, matching the service's own
/// coarse-grained cadences; sub-second polling is never meaningful
/// against a cloud API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Service base URL.
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Account username (email address).
    #[serde(default)]
    pub username: String,

    /// Account password (plaintext — prefer `password_env` or keyring).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Serial number of the door to bridge.
    #[serde(default)]
    pub device_serial: String,

    /// Display name for the door (logs and presentation).
    #[serde(default = "default_door_name")]
    pub door_name: String,

    /// Regular reconciliation interval.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Fast-poll interval while the door is mid-transition.
    #[serde(default = "default_fast_poll_interval")]
    pub fast_poll_interval_secs: u64,

    /// Delay between confirmation polls after a command.
    #[serde(default = "default_confirm_interval")]
    pub confirm_interval_secs: u64,

    /// Confirmation deadline. Deployments run 60–90 seconds.
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,

    /// Command shape: `"state-name"` or `"action-token"`.
    #[serde(default = "default_command_style")]
    pub command_style: String,

    /// Whether the reconciliation loop infers the target from observed
    /// state. Disable for deployments that only report terminal states.
    #[serde(default = "default_target_inference")]
    pub target_inference: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            username: String::new(),
            password: None,
            password_env: None,
            device_serial: String::new(),
            door_name: default_door_name(),
            poll_interval_secs: default_poll_interval(),
            fast_poll_interval_secs: default_fast_poll_interval(),
            confirm_interval_secs: default_confirm_interval(),
            confirm_timeout_secs: default_confirm_timeout(),
            command_style: default_command_style(),
            target_inference: default_target_inference(),
        }
    }
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.into()
}
fn default_door_name() -> String {
    "Garage Door".into()
}
fn default_poll_interval() -> u64 {
    300
}
fn default_fast_poll_interval() -> u64 {
    5
}
fn default_confirm_interval() -> u64 {
    5
}
fn default_confirm_timeout() -> u64 {
    60
}
fn default_command_style() -> String {
    "state-name".into()
}
fn default_target_inference() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "doorsync", "doorsync").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("doorsync");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load configuration from a TOML file merged with environment
/// variables. `path` defaults to the platform config path.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("DOORSYNC_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the account password.
///
/// Chain: named env var → system keyring (`doorsync` / username) →
/// plaintext `password` field.
pub fn resolve_password(config: &Config) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = config.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if !config.username.is_empty() {
        if let Ok(entry) = keyring::Entry::new("doorsync", &config.username) {
            if let Ok(secret) = entry.get_password() {
                return Ok(SecretString::from(secret));
            }
        }
    }

    if let Some(ref password) = config.password {
        return Ok(SecretString::from(password.clone()));
    }

    Err(ConfigError::NoCredentials)
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Parse and validate the service URL.
    pub fn service_url(&self) -> Result<url::Url, ConfigError> {
        self.service_url
            .parse()
            .map_err(|_| ConfigError::Validation {
                field: "service_url".into(),
                reason: format!("invalid URL: {}", self.service_url),
            })
    }

    /// The configured command style.
    pub fn parsed_command_style(&self) -> Result<CommandStyle, ConfigError> {
        match self.command_style.as_str() {
            "state-name" => Ok(CommandStyle::StateName),
            "action-token" => Ok(CommandStyle::ActionToken),
            other => Err(ConfigError::Validation {
                field: "command_style".into(),
                reason: format!("expected 'state-name' or 'action-token', got '{other}'"),
            }),
        }
    }

    /// Validate and translate into a `BridgeConfig`.
    pub fn to_bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        if self.device_serial.is_empty() {
            return Err(ConfigError::Validation {
                field: "device_serial".into(),
                reason: "must be set".into(),
            });
        }
        if self.poll_interval_secs == 0 || self.fast_poll_interval_secs == 0 {
            return Err(ConfigError::Validation {
                field: "poll_interval_secs".into(),
                reason: "intervals must be non-zero".into(),
            });
        }
        if self.confirm_timeout_secs < self.confirm_interval_secs {
            return Err(ConfigError::Validation {
                field: "confirm_timeout_secs".into(),
                reason: "deadline must cover at least one confirmation poll".into(),
            });
        }

        Ok(BridgeConfig {
            device_id: self.device_serial.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            fast_poll_interval: Duration::from_secs(self.fast_poll_interval_secs),
            confirm_interval: Duration::from_secs(self.confirm_interval_secs),
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            command_style: self.parsed_command_style()?,
            target_inference: self.target_inference,
            ..BridgeConfig::default()
        })
    }
}
