// ── Coordinator ──
//
// Per-device composition of the status poller, the configuration
// refresher, the mode tracker and the pending-mode state machine. Owns the periodic tick
// task and every post-command burst task; all of them stop on shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::DeviceClient;
use crate::command::{CommandCoordinator, CommandOutcome};
use crate::config::CoordinatorConfig;
use crate::config_refresh::{ConfigRefresher, RefreshOutcome};
use crate::error::CoreError;
use crate::event::CoordinatorEvent;
use crate::mode_tracker::ModeTracker;
use crate::model::{ConfigSnapshot, DeviceId, Mode, StatusSnapshot};
use crate::poller::{PollOutcome, StatusPoller};

const EVENT_CHANNEL_SIZE: usize = 64;

/// What one tick did. Configuration failures never fail a tick, so only
/// the status half can turn into an error.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub status: PollOutcome,
    pub config: RefreshOutcome,
    /// Mode read from the backend during this tick, if one was due.
    pub mode: Option<Mode>,
}

/// Coordinates status, configuration and mode changes for one robot.
///
/// Cheap to clone; clones share state. Consumers only read: every mutation
/// goes through [`tick`](Self::tick) or [`issue_command`](Self::issue_command).
pub struct Coordinator<C> {
    inner: Arc<CoordinatorInner<C>>,
}

impl<C> Clone for Coordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CoordinatorInner<C> {
    device_id: DeviceId,
    config: CoordinatorConfig,
    client: Arc<C>,
    poller: StatusPoller<C>,
    refresher: ConfigRefresher<C>,
    modes: ModeTracker<C>,
    commands: CommandCoordinator,
    event_tx: broadcast::Sender<CoordinatorEvent>,
    /// Scheduled and burst ticks never overlap.
    tick_lock: Mutex<()>,
    started: AtomicBool,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: DeviceClient> Coordinator<C> {
    /// Create a coordinator. Nothing is fetched until the first tick; call
    /// [`start()`](Self::start) to tick on the configured interval.
    pub fn new(device_id: DeviceId, client: impl Into<Arc<C>>, config: CoordinatorConfig) -> Self {
        let client = client.into();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        let poller = StatusPoller::new(
            Arc::clone(&client),
            device_id.clone(),
            &config,
            event_tx.clone(),
        );
        let refresher = ConfigRefresher::new(
            Arc::clone(&client),
            device_id.clone(),
            &config,
            event_tx.clone(),
        );
        let modes = ModeTracker::new(
            Arc::clone(&client),
            device_id.clone(),
            &config,
            event_tx.clone(),
        );
        let commands =
            CommandCoordinator::new(device_id.clone(), config.command_timeout, event_tx.clone());

        Self {
            inner: Arc::new(CoordinatorInner {
                device_id,
                config,
                client,
                poller,
                refresher,
                modes,
                commands,
                event_tx,
                tick_lock: Mutex::new(()),
                started: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.inner.device_id
    }

    pub fn settings(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the periodic tick task. The first tick runs immediately.
    /// Calling this more than once has no effect.
    pub async fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            debug!(device_id = %self.inner.device_id, "coordinator already started");
            return;
        }

        let ctrl = self.clone();
        let period = self.inner.config.poll_interval;
        let cancel = self.inner.cancel.clone();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(tick_task(ctrl, period, cancel)));
        info!(
            device_id = %self.inner.device_id,
            poll_interval_secs = period.as_secs(),
            "coordinator started"
        );
    }

    /// Cancel the periodic task and every outstanding burst task, then wait
    /// for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let handles = std::mem::take(&mut *self.inner.task_handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }
        debug!(device_id = %self.inner.device_id, "coordinator stopped");
    }

    // ── Ticks ────────────────────────────────────────────────────────

    /// Poll status, refresh configuration and read the mode concurrently.
    ///
    /// Fails only on authentication errors and on status failures that
    /// leave the device unavailable.
    pub async fn tick(&self) -> Result<TickReport, CoreError> {
        let _serial = self.inner.tick_lock.lock().await;
        let (status, config, mode) = tokio::join!(
            self.inner.poller.poll(),
            self.inner.refresher.refresh(),
            self.inner.modes.refresh()
        );
        Ok(TickReport {
            status: status?,
            config,
            mode,
        })
    }

    /// Tick now, outside the schedule.
    pub async fn request_refresh(&self) -> Result<TickReport, CoreError> {
        debug!(device_id = %self.inner.device_id, "immediate refresh requested");
        self.tick().await
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change the robot's mode.
    ///
    /// The pending mode is visible as soon as this is called and cleared
    /// when it returns. A second call while one is in flight is rejected
    /// with [`CoreError::CommandInFlight`] and changes nothing. Failures
    /// and timeouts of the call itself are reported in the outcome.
    pub async fn issue_command(&self, mode: Mode) -> Result<CommandOutcome, CoreError> {
        let guard = self.inner.commands.begin(mode)?;
        self.schedule_burst().await;

        info!(device_id = %self.inner.device_id, mode = %mode, "issuing mode change");
        let call = self.inner.client.set_mode(mode, true);
        let outcome = self.inner.commands.execute(mode, call).await;
        if outcome.is_confirmed() {
            // Recorded before the overlay clears, so readers never fall
            // back to the stale mode.
            self.inner.modes.record(mode);
        }
        drop(guard);
        Ok(outcome)
    }

    async fn schedule_burst(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        handles.retain(|h| !h.is_finished());

        for &delay in &self.inner.config.burst_delays {
            let ctrl = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(burst_tick(ctrl, delay, cancel)));
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The latest status, or `None` while the device is unavailable.
    pub fn status(&self) -> Option<Arc<StatusSnapshot>> {
        self.inner.poller.available_snapshot(Instant::now())
    }

    /// The latest validated configuration, if any.
    pub fn config(&self) -> Option<Arc<ConfigSnapshot>> {
        self.inner.refresher.latest()
    }

    pub fn pending_mode(&self) -> Option<Mode> {
        self.inner.commands.pending()
    }

    pub fn pending_watch(&self) -> watch::Receiver<Option<Mode>> {
        self.inner.commands.watch()
    }

    /// The mode last read from the backend or confirmed by a command.
    /// Hidden while the device is unavailable.
    pub fn known_mode(&self) -> Option<Mode> {
        if self.is_available() {
            self.inner.modes.known()
        } else {
            None
        }
    }

    /// Best available mode: the pending one, else the known one, else
    /// the one derived from the latest available status.
    pub fn effective_mode(&self) -> Option<Mode> {
        self.pending_mode().or_else(|| self.guessed_mode())
    }

    /// The known mode, else the one derived from the latest available status.
    pub fn guessed_mode(&self) -> Option<Mode> {
        self.known_mode()
            .or_else(|| self.status().and_then(|s| s.derived_mode()))
    }

    pub fn is_available(&self) -> bool {
        self.inner.poller.is_available(Instant::now())
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.poller.failure_count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.inner.event_tx.subscribe()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn tick_task<C: DeviceClient>(
    coordinator: Coordinator<C>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(result) = cancel.run_until_cancelled(coordinator.tick()).await else {
                    break;
                };
                match result {
                    Ok(_) => {}
                    Err(e) if e.is_auth_failure() => {
                        error!(
                            device_id = %coordinator.inner.device_id,
                            error = %e,
                            "credentials rejected, scheduled polling stopped"
                        );
                        let _ = coordinator.inner.event_tx.send(CoordinatorEvent::AuthFailed {
                            device_id: coordinator.inner.device_id.clone(),
                        });
                        break;
                    }
                    // The transition itself was already logged by the poller.
                    Err(e) => debug!(device_id = %coordinator.inner.device_id, error = %e, "scheduled tick failed"),
                }
            }
        }
    }
}

/// One extra tick `delay` after a command was issued.
async fn burst_tick<C: DeviceClient>(
    coordinator: Coordinator<C>,
    delay: Duration,
    cancel: CancellationToken,
) {
    let refresh = async {
        tokio::time::sleep(delay).await;
        debug!(
            device_id = %coordinator.inner.device_id,
            delay_secs = delay.as_secs(),
            "post-command refresh"
        );
        coordinator.tick().await
    };

    if let Some(Err(e)) = cancel.run_until_cancelled(refresh).await {
        warn!(
            device_id = %coordinator.inner.device_id,
            error = %e,
            "post-command refresh failed"
        );
    }
}
