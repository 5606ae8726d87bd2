// ── API → domain conversions ──
//
// Bridges raw `mowlink_api` wire types into canonical snapshots.
// Timestamps are taken at conversion time, which is when the response
// arrived.

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::time::Instant;

use mowlink_api::{GetConfig, StatusInfo};

use crate::model::{ConfigSnapshot, DeviceId, OperationalState, StatusSnapshot};

impl From<StatusInfo> for StatusSnapshot {
    fn from(si: StatusInfo) -> Self {
        let raw = to_object(&si);
        Self {
            device_id: DeviceId::new(si.robot),
            state: OperationalState::parse(&si.status),
            battery_level: si.estimated_battery_level,
            position: si.position,
            is_online: si.is_online,
            raw,
            fetched_at: Utc::now(),
            received_at: Instant::now(),
        }
    }
}

impl ConfigSnapshot {
    pub(crate) fn from_api(device_id: DeviceId, cfg: GetConfig) -> Self {
        Self {
            device_id,
            validated: cfg.config_validated,
            brain_version: cfg.data.brain_version,
            raw: cfg.data.extra,
            fetched_at: Utc::now(),
            received_at: Instant::now(),
        }
    }
}

fn to_object<T: serde::Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
