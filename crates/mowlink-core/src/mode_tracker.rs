// ── Last known mode ──
//
// The status feed never carries the operating mode, so it is tracked on
// its own: read from the backend once it is older than its refresh
// interval, and overwritten whenever a command is confirmed. A failed
// read keeps the previous value.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

use crate::client::DeviceClient;
use crate::config::CoordinatorConfig;
use crate::event::CoordinatorEvent;
use crate::model::{DeviceId, Mode};

#[derive(Debug, Clone, Copy)]
struct KnownMode {
    mode: Mode,
    received_at: Instant,
}

pub(crate) struct ModeTracker<C> {
    client: Arc<C>,
    device_id: DeviceId,
    refresh_interval: Duration,
    fetch_timeout: Duration,
    known: ArcSwapOption<KnownMode>,
    /// Time of the last read attempt, successful or not.
    last_attempt: ArcSwapOption<Instant>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl<C: DeviceClient> ModeTracker<C> {
    pub(crate) fn new(
        client: Arc<C>,
        device_id: DeviceId,
        config: &CoordinatorConfig,
        events: broadcast::Sender<CoordinatorEvent>,
    ) -> Self {
        Self {
            client,
            device_id,
            refresh_interval: config.mode_refresh_interval,
            fetch_timeout: config.status_fetch_timeout,
            known: ArcSwapOption::empty(),
            last_attempt: ArcSwapOption::empty(),
            events,
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        let fresh_value = self
            .known
            .load()
            .as_ref()
            .is_some_and(|k| now.saturating_duration_since(k.received_at) < self.refresh_interval);
        let recent_attempt = self
            .last_attempt
            .load()
            .as_ref()
            .is_some_and(|at| now.saturating_duration_since(**at) < self.refresh_interval);
        !fresh_value && !recent_attempt
    }

    /// Read the mode from the backend if the known one is stale. Returns
    /// the mode read, if any.
    pub(crate) async fn refresh(&self) -> Option<Mode> {
        let now = Instant::now();
        if !self.is_due(now) {
            return None;
        }
        self.last_attempt.store(Some(Arc::new(now)));

        match tokio::time::timeout(self.fetch_timeout, self.client.fetch_mode()).await {
            Ok(Ok(Some(mode))) => {
                self.record(mode);
                Some(mode)
            }
            Ok(Ok(None)) => {
                debug!(device_id = %self.device_id, "backend reported no mode");
                None
            }
            Ok(Err(e)) => {
                debug!(device_id = %self.device_id, error = %e, "mode read failed");
                None
            }
            Err(_) => {
                debug!(
                    device_id = %self.device_id,
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "mode read timed out"
                );
                None
            }
        }
    }

    /// Store `mode` as the robot's mode, as of now.
    pub(crate) fn record(&self, mode: Mode) {
        let previous = self.known.swap(Some(Arc::new(KnownMode {
            mode,
            received_at: Instant::now(),
        })));
        if previous.is_none_or(|p| p.mode != mode) {
            debug!(device_id = %self.device_id, mode = %mode, "known mode changed");
            let _ = self.events.send(CoordinatorEvent::ModeChanged {
                device_id: self.device_id.clone(),
                mode,
            });
        }
    }

    pub(crate) fn known(&self) -> Option<Mode> {
        self.known.load().as_ref().map(|k| k.mode)
    }
}
