// ── Read-only projections ──
//
// A `MowerView` is what a UI shows for one robot: a point-in-time read of
// the coordinator with the pending overlay applied. It holds no state of
// its own; capture a new one after every `CoordinatorEvent`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::client::DeviceClient;
use crate::command::CommandOutcome;
use crate::coordinator::{Coordinator, TickReport};
use crate::error::CoreError;
use crate::model::{DeviceId, Mode, OperationalState, Position};

/// Coarse activity of a lawn mower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LawnMowerActivity {
    Mowing,
    Docked,
    Error,
}

impl LawnMowerActivity {
    /// Pending mode wins; otherwise the reported state decides.
    pub fn resolve(pending: Option<Mode>, state: Option<&OperationalState>) -> Option<Self> {
        match pending {
            Some(Mode::Work) => return Some(Self::Mowing),
            Some(Mode::ChargeAndWork | Mode::ChargeAndStay) => return Some(Self::Docked),
            None => {}
        }

        let state = state?;
        if state.is_fault() {
            Some(Self::Error)
        } else if state.is_docked() {
            Some(Self::Docked)
        } else if state.is_mowing() {
            Some(Self::Mowing)
        } else {
            debug!(state = %state, "no activity for unrecognised state");
            None
        }
    }
}

/// One-press actions a mower control offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum LawnMowerAction {
    /// Leave the station and mow.
    StartMowing,
    /// Park until the next schedule.
    Dock,
}

impl LawnMowerAction {
    pub fn mode(self) -> Mode {
        match self {
            Self::StartMowing => Mode::Work,
            Self::Dock => Mode::ChargeAndStay,
        }
    }

    pub async fn perform<C: DeviceClient>(
        self,
        coordinator: &Coordinator<C>,
    ) -> Result<CommandOutcome, CoreError> {
        coordinator.issue_command(self.mode()).await
    }
}

/// Force-refresh button. Always pressable, even while unavailable.
pub async fn force_refresh<C: DeviceClient>(
    coordinator: &Coordinator<C>,
) -> Result<TickReport, CoreError> {
    coordinator.request_refresh().await
}

/// Point-in-time view of one robot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MowerView {
    pub device_id: DeviceId,
    pub available: bool,
    pub state: Option<OperationalState>,
    pub activity: Option<LawnMowerActivity>,
    /// Switch position: on while the robot is (or is about to be) on a
    /// mowing schedule. Off when the mode is unknown.
    pub auto_mow: bool,
    pub battery_level: Option<f64>,
    pub position: Option<Position>,
    pub brain_version: Option<String>,
    pub pending_mode: Option<Mode>,
    /// Last known mode, else the one derived from the reported state.
    pub guessed_mode: Option<Mode>,
    pub failure_count: u32,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl MowerView {
    pub fn capture<C: DeviceClient>(coordinator: &Coordinator<C>) -> Self {
        let status = coordinator.status();
        let pending_mode = coordinator.pending_mode();
        let guessed_mode = coordinator.guessed_mode();
        let effective = pending_mode.or(guessed_mode);

        Self {
            device_id: coordinator.device_id().clone(),
            available: status.is_some(),
            activity: LawnMowerActivity::resolve(pending_mode, status.as_ref().map(|s| &s.state)),
            auto_mow: effective.is_some_and(|m| matches!(m, Mode::Work | Mode::ChargeAndWork)),
            state: status.as_ref().map(|s| s.state.clone()),
            battery_level: status.as_ref().and_then(|s| s.battery_level),
            position: status.as_ref().and_then(|s| s.position),
            brain_version: coordinator.config().and_then(|c| c.brain_version.clone()),
            pending_mode,
            guessed_mode,
            failure_count: coordinator.failure_count(),
            fetched_at: status.as_ref().map(|s| s.fetched_at),
        }
    }

    pub fn state_label(&self) -> String {
        self.state
            .as_ref()
            .map_or_else(|| "unavailable".to_owned(), ToString::to_string)
    }
}
