// Wire types for the mower cloud API.
//
// The backend speaks PascalCase JSON. Unknown fields are kept in `extra`
// maps so callers can surface raw vendor data without a schema bump.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operating mode accepted by `SetMode`.
///
/// The string forms are the vendor's exact vocabulary.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Mode {
    /// Leave the station and mow.
    Work,
    /// Charge, then resume the mowing schedule.
    ChargeAndWork,
    /// Return to the station and stay there.
    ChargeAndStay,
}

/// Response of `POST api/RobotData/LastStatuses`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LastStatuses {
    #[serde(default)]
    pub query_date: Option<String>,
    #[serde(default)]
    pub statuses_info: Vec<StatusInfo>,
}

impl LastStatuses {
    /// Find the entry for a given robot.
    pub fn for_robot(&self, robot_id: &str) -> Option<&StatusInfo> {
        self.statuses_info.iter().find(|si| si.robot == robot_id)
    }
}

/// Last known status of a single robot.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusInfo {
    pub robot: String,
    /// Raw state string, e.g. `"Work"` or `"Charge"`.
    pub status: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub delta: Option<String>,
    #[serde(default)]
    pub estimated_battery_level: Option<f64>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub query_time: Option<String>,
    #[serde(default)]
    pub has_values: bool,
    #[serde(default)]
    pub is_online: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Position {
    pub longitude: f64,
    pub latitude: f64,
}

/// Response of `GET api/RobotConfig/GetConfig/{robot}`.
///
/// With `reload=true` the backend only schedules a reload from the robot;
/// the returned document is trustworthy once `config_validated` is set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetConfig {
    #[serde(default)]
    pub config_validated: bool,
    #[serde(default)]
    pub data: RobotConfigData,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RobotConfigData {
    #[serde(default)]
    pub brain_version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `GET api/RobotData/Current/{robot}`, used to read back a mode change.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurrentState {
    #[serde(default)]
    pub robot: Option<String>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST api/RobotAction/SetMode`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetModeRequest<'a> {
    pub mode: Mode,
    pub robot_id: &'a str,
}
