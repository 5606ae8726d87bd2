// ── Status polling ──
//
// One fetch per tick. Success replaces the snapshot wholesale; failures
// are counted and masked until the staleness policy says the device is
// gone. Authentication failures are never masked.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::DeviceClient;
use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::event::CoordinatorEvent;
use crate::model::{DeviceId, StatusSnapshot};
use crate::staleness::StalenessPolicy;

/// Result of a poll that did not have to be surfaced as an error.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The fetch succeeded and replaced the snapshot.
    Updated(Arc<StatusSnapshot>),
    /// The fetch failed but the device is still considered available.
    Unchanged,
}

/// Settles the failure counter exactly once per attempt, even when the
/// poll future is dropped mid-fetch.
struct AttemptGuard<'a> {
    failures: &'a AtomicU32,
    succeeded: bool,
}

impl<'a> AttemptGuard<'a> {
    fn new(failures: &'a AtomicU32) -> Self {
        Self {
            failures,
            succeeded: false,
        }
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.succeeded {
            self.failures.store(0, Ordering::SeqCst);
        } else {
            let _ = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    Some(n.saturating_add(1))
                });
        }
    }
}

pub(crate) struct StatusPoller<C> {
    client: Arc<C>,
    device_id: DeviceId,
    policy: StalenessPolicy,
    fetch_timeout: Duration,
    snapshot: ArcSwapOption<StatusSnapshot>,
    failures: AtomicU32,
    reported_unavailable: AtomicBool,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl<C: DeviceClient> StatusPoller<C> {
    pub(crate) fn new(
        client: Arc<C>,
        device_id: DeviceId,
        config: &CoordinatorConfig,
        events: broadcast::Sender<CoordinatorEvent>,
    ) -> Self {
        Self {
            client,
            device_id,
            policy: config.staleness(),
            fetch_timeout: config.status_fetch_timeout,
            snapshot: ArcSwapOption::empty(),
            failures: AtomicU32::new(0),
            reported_unavailable: AtomicBool::new(false),
            events,
        }
    }

    pub(crate) async fn poll(&self) -> Result<PollOutcome, CoreError> {
        let mut attempt = AttemptGuard::new(&self.failures);
        let result = match tokio::time::timeout(self.fetch_timeout, self.client.fetch_status()).await
        {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(e)) => Err(CoreError::from(e)),
            Err(_) => Err(CoreError::timeout(self.fetch_timeout)),
        };
        attempt.succeeded = result.is_ok();
        // The counter must be settled before the availability decision reads it.
        drop(attempt);

        match result {
            Ok(snapshot) => Ok(PollOutcome::Updated(self.accept(snapshot))),
            Err(err) if err.is_auth_failure() => {
                warn!(device_id = %self.device_id, error = %err, "status fetch rejected credentials");
                Err(err)
            }
            Err(err) => self.absorb(err),
        }
    }

    fn accept(&self, snapshot: StatusSnapshot) -> Arc<StatusSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.snapshot.store(Some(Arc::clone(&snapshot)));
        debug!(device_id = %self.device_id, state = %snapshot.state, "status updated");
        self.emit(CoordinatorEvent::StatusUpdated {
            device_id: self.device_id.clone(),
        });

        if self.reported_unavailable.swap(false, Ordering::SeqCst) {
            info!(device_id = %self.device_id, "device available again");
            self.emit(CoordinatorEvent::AvailabilityChanged {
                device_id: self.device_id.clone(),
                available: true,
            });
        }
        snapshot
    }

    fn absorb(&self, err: CoreError) -> Result<PollOutcome, CoreError> {
        let failures = self.failures.load(Ordering::SeqCst);

        if !self
            .policy
            .is_unavailable(Instant::now(), self.last_success(), failures)
        {
            debug!(device_id = %self.device_id, failures, error = %err, "status fetch failed, keeping previous snapshot");
            return Ok(PollOutcome::Unchanged);
        }

        if !self.reported_unavailable.swap(true, Ordering::SeqCst) {
            warn!(device_id = %self.device_id, failures, error = %err, "device unavailable");
            self.emit(CoordinatorEvent::AvailabilityChanged {
                device_id: self.device_id.clone(),
                available: false,
            });
        }

        Err(CoreError::DeviceUnavailable {
            device_id: self.device_id.clone(),
            failures,
            reason: err.to_string(),
        })
    }

    fn emit(&self, event: CoordinatorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn last_success(&self) -> Option<Instant> {
        self.snapshot.load().as_ref().map(|s| s.received_at)
    }

    pub(crate) fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub(crate) fn is_available(&self, now: Instant) -> bool {
        !self
            .policy
            .is_unavailable(now, self.last_success(), self.failure_count())
    }

    /// Latest snapshot regardless of availability.
    pub(crate) fn latest(&self) -> Option<Arc<StatusSnapshot>> {
        self.snapshot.load_full()
    }

    /// Latest snapshot, or `None` while the device is unavailable.
    pub(crate) fn available_snapshot(&self, now: Instant) -> Option<Arc<StatusSnapshot>> {
        if self.is_available(now) {
            self.latest()
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::OperationalState;
    use crate::testing::{FakeClient, Reply};

    const MIN: Duration = Duration::from_secs(60);

    fn poller(client: &Arc<FakeClient>) -> (StatusPoller<FakeClient>, broadcast::Receiver<CoordinatorEvent>) {
        let (tx, rx) = broadcast::channel(32);
        let poller = StatusPoller::new(
            Arc::clone(client),
            DeviceId::from("R1"),
            &CoordinatorConfig::default(),
            tx,
        );
        (poller, rx)
    }

    fn drain(rx: &mut broadcast::Receiver<CoordinatorEvent>) -> Vec<CoordinatorEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn success_replaces_snapshot_and_resets_counter() {
        let client = Arc::new(FakeClient::new("R1"));
        client
            .push_status(Reply::Ok(OperationalState::Work))
            .push_status(Reply::Fail)
            .push_status(Reply::Ok(OperationalState::GoChargeStation));
        let (poller, _rx) = poller(&client);

        poller.poll().await.unwrap();
        assert_eq!(poller.latest().unwrap().state, OperationalState::Work);

        assert!(matches!(poller.poll().await.unwrap(), PollOutcome::Unchanged));
        assert_eq!(poller.failure_count(), 1);
        assert_eq!(poller.latest().unwrap().state, OperationalState::Work);

        let PollOutcome::Updated(snap) = poller.poll().await.unwrap() else {
            panic!("expected an update");
        };
        assert_eq!(snap.state, OperationalState::GoChargeStation);
        assert_eq!(poller.failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sustained_outage_flips_availability_once() {
        let client = Arc::new(FakeClient::new("R1"));
        client.push_status(Reply::Ok(OperationalState::Charge));
        for _ in 0..5 {
            client.push_status(Reply::Fail);
        }
        client.push_status(Reply::Ok(OperationalState::Charge));
        let (poller, mut rx) = poller(&client);

        poller.poll().await.unwrap();
        drain(&mut rx);

        // Last success one minute before the first failure; polls every 2 min.
        tokio::time::advance(MIN).await;
        assert!(matches!(poller.poll().await.unwrap(), PollOutcome::Unchanged));
        tokio::time::advance(2 * MIN).await;
        assert!(matches!(poller.poll().await.unwrap(), PollOutcome::Unchanged));
        tokio::time::advance(2 * MIN).await;
        // Five minutes elapsed, three failures: not yet strictly past the timeout.
        assert!(matches!(poller.poll().await.unwrap(), PollOutcome::Unchanged));
        assert!(drain(&mut rx).is_empty());

        tokio::time::advance(2 * MIN).await;
        let err = poller.poll().await.unwrap_err();
        assert!(matches!(err, CoreError::DeviceUnavailable { failures: 4, .. }));
        assert!(poller.available_snapshot(Instant::now()).is_none());
        assert_eq!(
            drain(&mut rx),
            vec![CoordinatorEvent::AvailabilityChanged {
                device_id: DeviceId::from("R1"),
                available: false,
            }]
        );

        tokio::time::advance(2 * MIN).await;
        assert!(poller.poll().await.is_err());
        assert!(drain(&mut rx).is_empty());

        poller.poll().await.unwrap();
        assert_eq!(poller.failure_count(), 0);
        assert!(poller.available_snapshot(Instant::now()).is_some());
        let events = drain(&mut rx);
        assert!(events.contains(&CoordinatorEvent::AvailabilityChanged {
            device_id: DeviceId::from("R1"),
            available: true,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_is_never_masked() {
        let client = Arc::new(FakeClient::new("R1"));
        client
            .push_status(Reply::Ok(OperationalState::Work))
            .push_status(Reply::Auth);
        let (poller, _rx) = poller(&client);

        poller.poll().await.unwrap();
        let err = poller.poll().await.unwrap_err();

        assert!(err.is_auth_failure());
        assert_eq!(poller.failure_count(), 1);
        assert!(poller.is_available(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_timeout_counts_as_failure() {
        let client = Arc::new(FakeClient::new("R1"));
        client.push_status(Reply::Hang);
        let (poller, _rx) = poller(&client);

        let outcome = poller.poll().await.unwrap();

        assert!(matches!(outcome, PollOutcome::Unchanged));
        assert_eq!(poller.failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_poll_still_counts_the_attempt() {
        let client = Arc::new(FakeClient::new("R1"));
        client.push_status(Reply::Hang);
        let (poller, _rx) = poller(&client);

        let cancelled = tokio::time::timeout(Duration::from_secs(1), poller.poll()).await;

        assert!(cancelled.is_err());
        assert_eq!(poller.failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn never_fetched_goes_unavailable_after_threshold() {
        let client = Arc::new(FakeClient::new("R1"));
        for _ in 0..3 {
            client.push_status(Reply::Fail);
        }
        let (poller, _rx) = poller(&client);

        assert!(poller.poll().await.is_ok());
        assert!(poller.poll().await.is_ok());
        assert!(matches!(
            poller.poll().await,
            Err(CoreError::DeviceUnavailable { failures: 3, .. })
        ));
    }
}
