//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use mowlink_config::ConfigError;
use mowlink_core::{CoreError, Mode};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const BUSY: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Availability ─────────────────────────────────────────────────

    #[error("Robot {robot} is unavailable after {failures} failed fetches: {reason}")]
    #[diagnostic(
        code(mowlink::unavailable),
        help(
            "The mower cloud did not return a status for this robot.\n\
             Check the robot id and that the robot is online, then retry with -v."
        )
    )]
    Unavailable {
        robot: String,
        failures: u32,
        reason: String,
    },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(mowlink::auth_failed),
        help(
            "The session token was rejected. Log in to the Echorobotics web app,\n\
             copy a fresh UserToken cookie and update user_token or user_token_env."
        )
    )]
    AuthFailed { message: String },

    #[error("No user token configured for profile '{profile}'")]
    #[diagnostic(
        code(mowlink::no_credentials),
        help("Set user_token_env (recommended) or user_token in the profile.")
    )]
    NoCredentials { profile: String },

    // ── Commands ─────────────────────────────────────────────────────

    #[error("A change to {pending} is already in flight for {robot}")]
    #[diagnostic(code(mowlink::busy), help("Wait for it to finish and try again."))]
    CommandInFlight { robot: String, pending: Mode },

    #[error("Mode change to {mode} failed: {reason}")]
    #[diagnostic(code(mowlink::command_failed))]
    CommandFailed { mode: Mode, reason: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(mowlink::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(mowlink::profile_not_found),
        help(
            "Add a [profiles.{name}] table to {path}\n\
             or select another profile with --profile."
        )
    )]
    ProfileNotFound { name: String, path: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error: {message}")]
    #[diagnostic(code(mowlink::api_error))]
    ApiError { message: String, status: Option<u16> },

    // ── Validation / configuration ───────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(mowlink::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(mowlink::config))]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Timed out after {seconds}s")]
    #[diagnostic(
        code(mowlink::timeout),
        help("The mower cloud is slow to respond; raise the timeout in your profile.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(mowlink::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. }
            | Self::ProfileNotFound { .. }
            | Self::ApiError {
                status: Some(404), ..
            } => exit_code::NOT_FOUND,
            Self::CommandInFlight { .. } => exit_code::BUSY,
            Self::Unavailable { .. } | Self::ApiError { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::DeviceUnavailable {
                device_id,
                failures,
                reason,
            } => CliError::Unavailable {
                robot: device_id.to_string(),
                failures,
                reason,
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::CommandInFlight { device_id, pending } => CliError::CommandInFlight {
                robot: device_id.to_string(),
                pending,
            },

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "robot".into(),
                identifier,
            },

            CoreError::DeviceExists { identifier } => CliError::Validation {
                field: "robot".into(),
                reason: format!("'{identifier}' is already registered"),
            },

            CoreError::Api { message, status } => CliError::ApiError { message, status },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                path: mowlink_config::config_path().display().to_string(),
            },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mowlink_core::DeviceId;

    #[test]
    fn core_errors_keep_their_exit_codes() {
        let auth = CliError::from(CoreError::AuthenticationFailed {
            message: "401".into(),
        });
        let busy = CliError::from(CoreError::CommandInFlight {
            device_id: DeviceId::from("R1"),
            pending: Mode::Work,
        });
        let gone = CliError::from(CoreError::DeviceUnavailable {
            device_id: DeviceId::from("R1"),
            failures: 3,
            reason: "503".into(),
        });

        assert_eq!(auth.exit_code(), exit_code::AUTH);
        assert_eq!(busy.exit_code(), exit_code::BUSY);
        assert_eq!(gone.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn unknown_profile_is_not_found() {
        let err = CliError::from(ConfigError::UnknownProfile {
            name: "lawn".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }
}
