use thiserror::Error;

/// Top-level error type for the `mowlink-api` crate.
///
/// Covers every failure mode of the mower cloud API: authentication,
/// transport, HTTP status, and payload decoding. `mowlink-core` classifies
/// these into its narrower availability taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected by the backend (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Backend responses ───────────────────────────────────────────
    /// Non-success HTTP status that is not an auth rejection.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The status response did not contain the requested robot.
    #[error("Robot {robot_id} not present in status response")]
    RobotNotFound { robot_id: String },

    /// `SetMode` was accepted but the read-back never reported the new mode.
    #[error("Mode change to {requested} was not confirmed after {attempts} read-backs")]
    ModeNotConfirmed { requested: String, attempts: u32 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the backend rejected our credentials.
    ///
    /// Retrying cannot fix these; the host must re-authenticate.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Transport(e) => matches!(
                e.status(),
                Some(reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN)
            ),
            Self::Http { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } | Self::ModeNotConfirmed { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
