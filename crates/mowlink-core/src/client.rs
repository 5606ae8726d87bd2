// ── Device capability ──
//
// The narrow contract the coordinator needs from the backend. The
// production implementation wraps `mowlink_api::EchoClient`; tests use a
// scripted fake.

use std::future::Future;

use tracing::warn;

use mowlink_api::{EchoClient, Error};

use crate::model::{ConfigSnapshot, DeviceId, Mode, StatusSnapshot};

/// What the coordinator needs from a single robot's backend.
pub trait DeviceClient: Send + Sync + 'static {
    /// Fetch the robot's current status.
    fn fetch_status(&self) -> impl Future<Output = Result<StatusSnapshot, Error>> + Send;

    /// Ask the backend to pull a fresh configuration from the robot.
    /// Only triggers the reload; see [`fetch_config`](Self::fetch_config).
    fn reload_config(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Read the configuration; check [`ConfigSnapshot::validated`].
    fn fetch_config(&self) -> impl Future<Output = Result<ConfigSnapshot, Error>> + Send;

    /// Read the mode the backend currently reports, if it reports one.
    fn fetch_mode(&self) -> impl Future<Output = Result<Option<Mode>, Error>> + Send;

    /// Change the operating mode.
    ///
    /// With `use_current_as_baseline`, success means the backend already
    /// reads back the new mode.
    fn set_mode(
        &self,
        mode: Mode,
        use_current_as_baseline: bool,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

/// [`DeviceClient`] for one robot on the mower cloud.
#[derive(Debug, Clone)]
pub struct RobotClient {
    api: EchoClient,
    device_id: DeviceId,
    robot_ids: Vec<String>,
}

impl RobotClient {
    pub fn new(api: EchoClient, device_id: DeviceId) -> Self {
        let robot_ids = vec![device_id.as_str().to_owned()];
        Self {
            api,
            device_id,
            robot_ids,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }
}

impl DeviceClient for RobotClient {
    async fn fetch_status(&self) -> Result<StatusSnapshot, Error> {
        let statuses = self.api.last_statuses(&self.robot_ids).await?;

        let Some(info) = statuses.for_robot(self.device_id.as_str()) else {
            warn!(
                device_id = %self.device_id,
                returned = statuses.statuses_info.len(),
                "robot missing from status response"
            );
            return Err(Error::RobotNotFound {
                robot_id: self.device_id.to_string(),
            });
        };

        Ok(StatusSnapshot::from(info.clone()))
    }

    async fn reload_config(&self) -> Result<(), Error> {
        self.api.get_config(self.device_id.as_str(), true).await?;
        Ok(())
    }

    async fn fetch_config(&self) -> Result<ConfigSnapshot, Error> {
        let cfg = self.api.get_config(self.device_id.as_str(), false).await?;
        Ok(ConfigSnapshot::from_api(self.device_id.clone(), cfg))
    }

    async fn fetch_mode(&self) -> Result<Option<Mode>, Error> {
        Ok(self.api.current(self.device_id.as_str()).await?.mode)
    }

    async fn set_mode(&self, mode: Mode, use_current_as_baseline: bool) -> Result<(), Error> {
        self.api
            .set_mode(self.device_id.as_str(), mode, use_current_as_baseline)
            .await
    }
}
