use crate::model::{DeviceId, Mode};

/// Notifications emitted by a coordinator after each state transition.
///
/// Projections re-read the coordinator when they receive one; the events
/// carry only enough to route them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// A status fetch succeeded and replaced the snapshot.
    StatusUpdated { device_id: DeviceId },
    /// A validated configuration replaced the previous one.
    ConfigUpdated { device_id: DeviceId },
    /// The availability decision flipped.
    AvailabilityChanged { device_id: DeviceId, available: bool },
    /// The optimistic overlay was set or cleared. `pending: None` is only
    /// sent after the overlay is already gone.
    PendingModeChanged {
        device_id: DeviceId,
        pending: Option<Mode>,
    },
    /// The last known mode changed, either read from the backend or
    /// confirmed by a command.
    ModeChanged { device_id: DeviceId, mode: Mode },
    /// The backend rejected our credentials; scheduled polling stops.
    AuthFailed { device_id: DeviceId },
}

impl CoordinatorEvent {
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::StatusUpdated { device_id }
            | Self::ConfigUpdated { device_id }
            | Self::AvailabilityChanged { device_id, .. }
            | Self::PendingModeChanged { device_id, .. }
            | Self::ModeChanged { device_id, .. }
            | Self::AuthFailed { device_id } => device_id,
        }
    }
}
