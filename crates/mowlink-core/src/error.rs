// ── Core error types ──
//
// Errors that cross the coordinator boundary. Only authentication
// failures and "device is now unavailable" fetch failures are ever
// surfaced by a tick; everything else is absorbed and logged inside the
// coordinator. The `From<mowlink_api::Error>` impl classifies transport
// errors into this taxonomy.

use thiserror::Error;

use crate::model::{DeviceId, Mode};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Availability ─────────────────────────────────────────────────
    /// Backend rejected the credentials. Never masked; the host should
    /// prompt for re-authentication.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Status fetches have failed for long enough that the device is
    /// considered unavailable.
    #[error("Device {device_id} unavailable after {failures} failed fetches: {reason}")]
    DeviceUnavailable {
        device_id: DeviceId,
        failures: u32,
        reason: String,
    },

    #[error("Operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Commands ─────────────────────────────────────────────────────
    /// A mode change is already in flight for this device.
    #[error("Device {device_id} already has a pending mode change to {pending}")]
    CommandInFlight { device_id: DeviceId, pending: Mode },

    // ── Registry ─────────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Device already registered: {identifier}")]
    DeviceExists { identifier: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` for errors that retrying cannot fix.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    pub(crate) fn timeout(limit: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_secs: limit.as_secs(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<mowlink_api::Error> for CoreError {
    fn from(err: mowlink_api::Error) -> Self {
        if err.is_auth_failure() {
            return CoreError::AuthenticationFailed {
                message: err.to_string(),
            };
        }

        match err {
            mowlink_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            mowlink_api::Error::Transport(ref e) => CoreError::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            mowlink_api::Error::Http { status, body } => CoreError::Api {
                message: body,
                status: Some(status),
            },
            mowlink_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            other => CoreError::Api {
                message: other.to_string(),
                status: None,
            },
        }
    }
}
