//! Configuration for the mowlink CLI.
//!
//! TOML profiles merged with `MOWLINK_`-prefixed environment overrides,
//! credential resolution (env var or plaintext), and translation into
//! the settings `mowlink_core` and `mowlink_api` consume.

use std::collections::HashMap;
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
use url::Url;

use mowlink_api::{CONFIRM_INTERVAL, Credentials, DEFAULT_BASE_URL, TransportConfig};
use mowlink_core::{CoordinatorConfig, DeviceId};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no user token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

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

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is given on the command line.
    pub default_profile: Option<String>,

    /// Tuning shared by every profile.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named robot profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

/// Global defaults. Every duration is in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Defaults {
    pub output: String,
    /// Per-request HTTP timeout.
    pub timeout: u64,
    pub poll_interval: u64,
    pub config_refresh_interval: u64,
    pub unavailable_timeout: u64,
    pub unavailable_fetches: u32,
    pub mode_refresh_interval: u64,
    pub status_fetch_timeout: u64,
    pub config_reload_timeout: u64,
    pub config_validate_timeout: u64,
    pub config_validate_spacing: u64,
    pub command_timeout: u64,
    pub burst_delays: Vec<u64>,
}

impl Default for Defaults {
    fn default() -> Self {
        let core = CoordinatorConfig::default();
        Self {
            output: "table".into(),
            timeout: 30,
            poll_interval: core.poll_interval.as_secs(),
            config_refresh_interval: core.config_refresh_interval.as_secs(),
            unavailable_timeout: core.unavailable_timeout.as_secs(),
            unavailable_fetches: core.unavailable_fetches,
            mode_refresh_interval: core.mode_refresh_interval.as_secs(),
            status_fetch_timeout: core.status_fetch_timeout.as_secs(),
            config_reload_timeout: core.config_reload_timeout.as_secs(),
            config_validate_timeout: core.config_validate_timeout.as_secs(),
            config_validate_spacing: core.config_validate_spacing.as_secs(),
            command_timeout: core.command_timeout.as_secs(),
            burst_delays: core.burst_delays.iter().map(Duration::as_secs).collect(),
        }
    }
}

/// A named robot profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Robot serial as shown in the mower cloud.
    pub robot_id: String,

    /// Account id sent as the `UserId` cookie.
    pub user_id: String,

    /// Session token (plaintext; prefer `user_token_env`).
    pub user_token: Option<String>,

    /// Environment variable holding the session token.
    pub user_token_env: Option<String>,

    /// Override the cloud endpoint.
    pub base_url: Option<String>,

    /// Override `defaults.poll_interval`.
    pub poll_interval: Option<u64>,

    /// Override `defaults.command_timeout`.
    pub command_timeout: Option<u64>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "mowlink", "mowlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("mowlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
///
/// Nested keys are overridden with a double underscore, e.g.
/// `MOWLINK_DEFAULTS__POLL_INTERVAL=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MOWLINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Render config for display with any plaintext token redacted.
pub fn render_redacted(cfg: &Config) -> Result<String, ConfigError> {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.user_token.is_some() {
            profile.user_token = Some("<redacted>".into());
        }
    }
    Ok(toml::to_string_pretty(&cfg)?)
}

// ── Profile resolution ──────────────────────────────────────────────

/// Pick the profile named `name`, or the configured default.
pub fn select_profile<'a>(
    cfg: &'a Config,
    name: Option<&str>,
) -> Result<(String, &'a Profile), ConfigError> {
    let name = name
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    cfg.profiles
        .get(&name)
        .map(|p| (name.clone(), p))
        .ok_or(ConfigError::UnknownProfile { name })
}

/// Resolve the session token: named env var first, then plaintext.
pub fn resolve_user_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.user_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(ref token) = profile.user_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Everything needed to build a client and coordinator for one robot.
#[derive(Debug, Clone)]
pub struct RobotSettings {
    pub device_id: DeviceId,
    pub base_url: Url,
    pub credentials: Credentials,
    pub transport: TransportConfig,
    pub coordinator: CoordinatorConfig,
}

impl RobotSettings {
    /// Mode read-backs that fit in three quarters of the command timeout,
    /// so an unconfirmed change fails before the command times out.
    pub fn confirm_attempts(&self) -> u32 {
        let window = self.coordinator.command_timeout.as_secs() * 3 / 4;
        let attempts = window / CONFIRM_INTERVAL.as_secs().max(1);
        u32::try_from(attempts).unwrap_or(u32::MAX).max(1)
    }
}

/// Build [`RobotSettings`] from a profile and the global defaults.
pub fn profile_to_settings(
    defaults: &Defaults,
    profile: &Profile,
    profile_name: &str,
) -> Result<RobotSettings, ConfigError> {
    if profile.robot_id.trim().is_empty() {
        return Err(validation("robot_id", "must not be empty"));
    }
    if profile.user_id.trim().is_empty() {
        return Err(validation("user_id", "must not be empty"));
    }

    let raw_url = profile.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    let base_url: Url = raw_url
        .parse()
        .map_err(|_| validation("base_url", &format!("invalid URL: {raw_url}")))?;

    let user_token = resolve_user_token(profile, profile_name)?;

    let transport = TransportConfig {
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        ..TransportConfig::default()
    };

    Ok(RobotSettings {
        device_id: DeviceId::from(profile.robot_id.as_str()),
        base_url,
        credentials: Credentials {
            user_id: profile.user_id.clone(),
            user_token,
        },
        transport,
        coordinator: coordinator_config(defaults, profile)?,
    })
}

fn coordinator_config(defaults: &Defaults, profile: &Profile) -> Result<CoordinatorConfig, ConfigError> {
    let secs = Duration::from_secs;
    let poll_interval = profile.poll_interval.unwrap_or(defaults.poll_interval);

    if poll_interval == 0 {
        return Err(validation("poll_interval", "must be at least 1 second"));
    }
    if defaults.unavailable_fetches == 0 {
        return Err(validation("unavailable_fetches", "must be at least 1"));
    }
    if defaults.config_validate_spacing == 0 {
        return Err(validation("config_validate_spacing", "must be at least 1 second"));
    }

    Ok(CoordinatorConfig {
        poll_interval: secs(poll_interval),
        config_refresh_interval: secs(defaults.config_refresh_interval),
        unavailable_timeout: secs(defaults.unavailable_timeout),
        unavailable_fetches: defaults.unavailable_fetches,
        mode_refresh_interval: secs(defaults.mode_refresh_interval),
        status_fetch_timeout: secs(defaults.status_fetch_timeout),
        config_reload_timeout: secs(defaults.config_reload_timeout),
        config_validate_timeout: secs(defaults.config_validate_timeout),
        config_validate_spacing: secs(defaults.config_validate_spacing),
        command_timeout: secs(profile.command_timeout.unwrap_or(defaults.command_timeout)),
        burst_delays: defaults.burst_delays.iter().copied().map(secs).collect(),
    })
}

fn validation(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}
