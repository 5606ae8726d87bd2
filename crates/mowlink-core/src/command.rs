// ── Pending-mode state machine ──
//
// Idle -> InFlight -> Idle. The pending slot is claimed atomically, so a
// second command while one is in flight is rejected without touching
// state. The slot is released by a drop guard, which covers success,
// failure, timeout and a dropped caller alike.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::event::CoordinatorEvent;
use crate::model::{DeviceId, Mode};

/// How a mode change ended. Failures are absorbed here; the pending
/// overlay is already cleared by the time the caller sees this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The backend reads back the requested mode.
    Confirmed,
    /// The backend refused or the read-back never matched.
    Failed { reason: String },
    /// The command did not finish within the command timeout.
    TimedOut,
}

impl CommandOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

pub(crate) struct CommandCoordinator {
    device_id: DeviceId,
    command_timeout: Duration,
    pending: watch::Sender<Option<Mode>>,
    events: broadcast::Sender<CoordinatorEvent>,
}

/// Holds the pending slot. Dropping it clears the slot and then announces
/// the change.
pub(crate) struct PendingGuard<'a> {
    owner: &'a CommandCoordinator,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.owner.pending.send_replace(None);
        let _ = self.owner.events.send(CoordinatorEvent::PendingModeChanged {
            device_id: self.owner.device_id.clone(),
            pending: None,
        });
    }
}

impl CommandCoordinator {
    pub(crate) fn new(
        device_id: DeviceId,
        command_timeout: Duration,
        events: broadcast::Sender<CoordinatorEvent>,
    ) -> Self {
        let (pending, _) = watch::channel(None);
        Self {
            device_id,
            command_timeout,
            pending,
            events,
        }
    }

    /// Claim the pending slot for `mode`.
    pub(crate) fn begin(&self, mode: Mode) -> Result<PendingGuard<'_>, CoreError> {
        let mut in_flight = None;
        self.pending.send_if_modified(|slot| match slot {
            Some(current) => {
                in_flight = Some(*current);
                false
            }
            None => {
                *slot = Some(mode);
                true
            }
        });

        if let Some(pending) = in_flight {
            warn!(
                device_id = %self.device_id,
                requested = %mode,
                pending = %pending,
                "mode change already in flight, ignoring"
            );
            return Err(CoreError::CommandInFlight {
                device_id: self.device_id.clone(),
                pending,
            });
        }

        let _ = self.events.send(CoordinatorEvent::PendingModeChanged {
            device_id: self.device_id.clone(),
            pending: Some(mode),
        });
        Ok(PendingGuard { owner: self })
    }

    /// Run the mode-set call under the command timeout. The caller releases
    /// the slot by dropping its guard.
    pub(crate) async fn execute<F>(&self, mode: Mode, call: F) -> CommandOutcome
    where
        F: Future<Output = Result<(), mowlink_api::Error>>,
    {
        match tokio::time::timeout(self.command_timeout, call).await {
            Ok(Ok(())) => {
                info!(device_id = %self.device_id, mode = %mode, "mode change confirmed");
                CommandOutcome::Confirmed
            }
            Ok(Err(e)) => {
                warn!(device_id = %self.device_id, mode = %mode, error = %e, "mode change failed");
                CommandOutcome::Failed {
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                warn!(
                    device_id = %self.device_id,
                    mode = %mode,
                    timeout_secs = self.command_timeout.as_secs(),
                    "mode change timed out"
                );
                CommandOutcome::TimedOut
            }
        }
    }

    pub(crate) fn pending(&self) -> Option<Mode> {
        *self.pending.borrow()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Option<Mode>> {
        self.pending.subscribe()
    }
}
