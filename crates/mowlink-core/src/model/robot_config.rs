use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Instant;

use super::DeviceId;

/// Robot configuration as last read from the backend.
///
/// Only snapshots with `validated == true` are ever stored by the
/// coordinator; unvalidated reads are part of the refresh protocol.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub device_id: DeviceId,
    pub validated: bool,
    pub brain_version: Option<String>,
    pub raw: Map<String, Value>,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip)]
    pub received_at: Instant,
}

impl ConfigSnapshot {
    pub fn new(device_id: DeviceId, validated: bool) -> Self {
        Self {
            device_id,
            validated,
            brain_version: None,
            raw: Map::new(),
            fetched_at: Utc::now(),
            received_at: Instant::now(),
        }
    }
}
