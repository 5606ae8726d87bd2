// Mower cloud HTTP client
//
// Wraps `reqwest::Client` with endpoint URL construction, status-code
// classification, and JSON decoding. Session cookies are installed by
// `TransportConfig`; this module never sees the raw token.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{CurrentState, GetConfig, LastStatuses, Mode, SetModeRequest};
use crate::transport::{Credentials, TransportConfig};

/// Public cloud endpoint.
pub const DEFAULT_BASE_URL: &str = "https://myrobot.echorobotics.com/";

/// Default spacing between mode read-backs.
pub const CONFIRM_INTERVAL: Duration = Duration::from_secs(2);
/// Default number of mode read-backs. Kept short of the coordinator's
/// command timeout so an unconfirmed change surfaces as an error.
pub const CONFIRM_ATTEMPTS: u32 = 15;

/// Raw HTTP client for the mower cloud API.
///
/// Cheap to clone; the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct EchoClient {
    http: reqwest::Client,
    base_url: Url,
    confirm_interval: Duration,
    confirm_attempts: u32,
    /// Timeout reqwest applies per request, when this client configured it.
    request_timeout: Option<Duration>,
}

impl EchoClient {
    /// Create a client authenticated with the given account credentials.
    pub fn new(
        base_url: Url,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = normalize_base(base_url);
        let http = transport.build_client(&base_url, credentials)?;
        let mut client = Self::with_parts(http, base_url);
        client.request_timeout = Some(transport.timeout);
        Ok(client)
    }

    /// Create a client from a pre-built `reqwest::Client`.
    ///
    /// Used by tests and by hosts that manage their own cookie jar.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = normalize_base(Url::parse(base_url)?);
        Ok(Self::with_parts(http, base_url))
    }

    fn with_parts(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            confirm_interval: CONFIRM_INTERVAL,
            confirm_attempts: CONFIRM_ATTEMPTS,
            request_timeout: None,
        }
    }

    /// Override how `set_mode` polls for read-back confirmation.
    pub fn with_confirm_policy(mut self, interval: Duration, attempts: u32) -> Self {
        self.confirm_interval = interval;
        self.confirm_attempts = attempts.max(1);
        self
    }

    /// The API base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the most recent status of each listed robot.
    pub async fn last_statuses(&self, robot_ids: &[String]) -> Result<LastStatuses, Error> {
        let url = self.api_url("api/RobotData/LastStatuses")?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(robot_ids)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        parse_json(resp).await
    }

    /// Fetch the robot configuration.
    ///
    /// `reload = true` asks the backend to pull a fresh configuration from
    /// the robot; the response to that call is usually not yet validated.
    pub async fn get_config(&self, robot_id: &str, reload: bool) -> Result<GetConfig, Error> {
        let mut url = self.api_url(&format!("api/RobotConfig/GetConfig/{robot_id}"))?;
        url.query_pairs_mut()
            .append_pair("reload", if reload { "true" } else { "false" });
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        parse_json(resp).await
    }

    /// Read back the mode the backend currently reports for a robot.
    pub async fn current(&self, robot_id: &str) -> Result<CurrentState, Error> {
        let url = self.api_url(&format!("api/RobotData/Current/{robot_id}"))?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        parse_json(resp).await
    }

    /// Request a mode change.
    ///
    /// The backend acknowledges `SetMode` quickly but keeps reporting the
    /// old mode for a long time. With `use_current` set, this call only
    /// returns once `current()` reports the requested mode, so success
    /// means the change is visible. Callers should bound it with a timeout.
    pub async fn set_mode(&self, robot_id: &str, mode: Mode, use_current: bool) -> Result<(), Error> {
        let url = self.api_url("api/RobotAction/SetMode")?;
        debug!(%mode, "POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(&SetModeRequest { mode, robot_id })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        check_status(resp).await?;

        if !use_current {
            return Ok(());
        }

        for attempt in 1..=self.confirm_attempts {
            tokio::time::sleep(self.confirm_interval).await;
            let current = self.current(robot_id).await?;
            if current.mode == Some(mode) {
                debug!(%mode, attempt, "mode change confirmed");
                return Ok(());
            }
            debug!(%mode, attempt, reported = ?current.mode, "mode change not visible yet");
        }

        Err(Error::ModeNotConfirmed {
            requested: mode.to_string(),
            attempts: self.confirm_attempts,
        })
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        match self.request_timeout {
            Some(limit) if err.is_timeout() => Error::Timeout {
                timeout_secs: limit.as_secs(),
            },
            _ => Error::Transport(err),
        }
    }
}

fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Map auth rejections and other non-2xx responses to errors.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("backend rejected credentials (HTTP {})", status.as_u16()),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Http {
            status: status.as_u16(),
            body,
        });
    }

    Ok(resp)
}

async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let resp = check_status(resp).await?;
    let body = resp.text().await.map_err(Error::Transport)?;

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
