// ── Status domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Instant;

use super::DeviceId;
use mowlink_api::{Mode, Position};

/// Operational state reported by the robot.
///
/// Parsed from the vendor's status string. Strings we do not know are
/// kept verbatim in [`OperationalState::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum OperationalState {
    Offline,
    Alarm,
    Warning,
    OffAfterAlarm,
    Idle,
    WaitStation,
    Charge,
    Off,
    GoUnloadStation,
    GoChargeStation,
    Work,
    LeaveStation,
    GoStation,
    Border,
    BorderCheck,
    BorderDiscovery,
    Unknown(String),
}

const KNOWN_STATES: &[(&str, OperationalState)] = &[
    ("Offline", OperationalState::Offline),
    ("Alarm", OperationalState::Alarm),
    ("Warning", OperationalState::Warning),
    ("OffAfterAlarm", OperationalState::OffAfterAlarm),
    ("Idle", OperationalState::Idle),
    ("WaitStation", OperationalState::WaitStation),
    ("Charge", OperationalState::Charge),
    ("Off", OperationalState::Off),
    ("GoUnloadStation", OperationalState::GoUnloadStation),
    ("GoChargeStation", OperationalState::GoChargeStation),
    ("Work", OperationalState::Work),
    ("LeaveStation", OperationalState::LeaveStation),
    ("GoStation", OperationalState::GoStation),
    ("Border", OperationalState::Border),
    ("BorderCheck", OperationalState::BorderCheck),
    ("BorderDiscovery", OperationalState::BorderDiscovery),
];

impl OperationalState {
    pub fn parse(raw: &str) -> Self {
        KNOWN_STATES
            .iter()
            .find(|(name, _)| *name == raw)
            .map_or_else(|| Self::Unknown(raw.to_owned()), |(_, state)| state.clone())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown(raw) => raw,
            known => KNOWN_STATES
                .iter()
                .find(|(_, state)| state == known)
                .map_or("Unknown", |(name, _)| name),
        }
    }

    /// Alarm-ish states where the robot needs attention.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::Offline | Self::Alarm | Self::Warning | Self::OffAfterAlarm
        )
    }

    pub fn is_docked(&self) -> bool {
        matches!(self, Self::Idle | Self::WaitStation | Self::Charge | Self::Off)
    }

    /// Out in the field, including the trips to and from the station.
    pub fn is_mowing(&self) -> bool {
        matches!(
            self,
            Self::GoUnloadStation
                | Self::GoChargeStation
                | Self::Work
                | Self::LeaveStation
                | Self::GoStation
                | Self::Border
                | Self::BorderCheck
                | Self::BorderDiscovery
        )
    }
}

impl fmt::Display for OperationalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OperationalState> for String {
    fn from(state: OperationalState) -> Self {
        state.as_str().to_owned()
    }
}

/// An immutable, timestamped read of one robot's status.
///
/// Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub device_id: DeviceId,
    pub state: OperationalState,
    pub battery_level: Option<f64>,
    pub position: Option<Position>,
    pub is_online: bool,
    /// Every field the backend sent, verbatim.
    pub raw: Map<String, Value>,
    /// Wall-clock time the snapshot was obtained.
    pub fetched_at: DateTime<Utc>,
    /// Monotonic time the snapshot was obtained; drives staleness.
    #[serde(skip)]
    pub received_at: Instant,
}

impl StatusSnapshot {
    pub fn new(device_id: DeviceId, state: OperationalState) -> Self {
        Self {
            device_id,
            state,
            battery_level: None,
            position: None,
            is_online: true,
            raw: Map::new(),
            fetched_at: Utc::now(),
            received_at: Instant::now(),
        }
    }

    /// Best guess of the active mode from the reported state alone.
    ///
    /// The status feed does not carry the mode, so docked states other than
    /// `Off` are ambiguous between `chargeAndWork` and `chargeAndStay`.
    pub fn derived_mode(&self) -> Option<Mode> {
        match self.state {
            OperationalState::Work
            | OperationalState::LeaveStation
            | OperationalState::Border
            | OperationalState::BorderCheck
            | OperationalState::BorderDiscovery => Some(Mode::Work),
            OperationalState::Off => Some(Mode::ChargeAndStay),
            _ => None,
        }
    }
}
