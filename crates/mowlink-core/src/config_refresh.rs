// ── Configuration refresh ──
//
// Runs on every tick but only does work once the stored configuration
// is older than its refresh interval. A refresh triggers a server-side
// reload and then polls until the backend reports the configuration as
// validated. Failures never leave this module.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::DeviceClient;
use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::event::CoordinatorEvent;
use crate::model::{ConfigSnapshot, DeviceId};

/// What a refresh attempt did.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// The stored configuration is still fresh.
    NotDue,
    /// A validated configuration replaced the stored one.
    Refreshed(Arc<ConfigSnapshot>),
    /// The attempt failed; the previous configuration (if any) is kept.
    Kept,
}

pub(crate) struct ConfigRefresher<C> {
    client: Arc<C>,
    device_id: DeviceId,
    refresh_interval: Duration,
    reload_timeout: Duration,
    validate_timeout: Duration,
    validate_spacing: Duration,
    snapshot: ArcSwapOption<ConfigSnapshot>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl<C: DeviceClient> ConfigRefresher<C> {
    pub(crate) fn new(
        client: Arc<C>,
        device_id: DeviceId,
        config: &CoordinatorConfig,
        events: broadcast::Sender<CoordinatorEvent>,
    ) -> Self {
        Self {
            client,
            device_id,
            refresh_interval: config.config_refresh_interval,
            reload_timeout: config.config_reload_timeout,
            validate_timeout: config.config_validate_timeout,
            validate_spacing: config.config_validate_spacing,
            snapshot: ArcSwapOption::empty(),
            events,
        }
    }

    pub(crate) fn is_due(&self, now: Instant) -> bool {
        self.snapshot.load().as_ref().is_none_or(|s| {
            now.saturating_duration_since(s.received_at) >= self.refresh_interval
        })
    }

    pub(crate) async fn refresh(&self) -> RefreshOutcome {
        if !self.is_due(Instant::now()) {
            return RefreshOutcome::NotDue;
        }

        match self.reload_and_validate().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.snapshot.store(Some(Arc::clone(&snapshot)));
                info!(
                    device_id = %self.device_id,
                    brain_version = snapshot.brain_version.as_deref().unwrap_or("unknown"),
                    "configuration refreshed"
                );
                let _ = self.events.send(CoordinatorEvent::ConfigUpdated {
                    device_id: self.device_id.clone(),
                });
                RefreshOutcome::Refreshed(snapshot)
            }
            Err(e) => {
                warn!(
                    device_id = %self.device_id,
                    error = %e,
                    has_previous = self.snapshot.load().is_some(),
                    "configuration refresh failed"
                );
                RefreshOutcome::Kept
            }
        }
    }

    async fn reload_and_validate(&self) -> Result<ConfigSnapshot, CoreError> {
        debug!(device_id = %self.device_id, "requesting configuration reload");
        tokio::time::timeout(self.reload_timeout, self.client.reload_config())
            .await
            .map_err(|_| CoreError::timeout(self.reload_timeout))??;

        tokio::time::timeout(self.validate_timeout, self.await_validated())
            .await
            .map_err(|_| CoreError::timeout(self.validate_timeout))?
    }

    async fn await_validated(&self) -> Result<ConfigSnapshot, CoreError> {
        loop {
            tokio::time::sleep(self.validate_spacing).await;
            let snapshot = self.client.fetch_config().await?;
            if snapshot.validated {
                return Ok(snapshot);
            }
            debug!(device_id = %self.device_id, "configuration not validated yet");
        }
    }

    pub(crate) fn latest(&self) -> Option<Arc<ConfigSnapshot>> {
        self.snapshot.load_full()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeClient, Reply};

    fn refresher(client: &Arc<FakeClient>) -> ConfigRefresher<FakeClient> {
        let (tx, _rx) = broadcast::channel(16);
        ConfigRefresher::new(
            Arc::clone(client),
            DeviceId::from("R1"),
            &CoordinatorConfig::default(),
            tx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_validated() {
        let client = Arc::new(FakeClient::new("R1"));
        client
            .push_config(Reply::Ok(false))
            .push_config(Reply::Ok(false))
            .push_config(Reply::Ok(true));
        let refresher = refresher(&client);
        let started = Instant::now();

        let outcome = refresher.refresh().await;

        assert!(matches!(outcome, RefreshOutcome::Refreshed(_)));
        assert_eq!(FakeClient::calls(&client.reload_calls), 1);
        assert_eq!(FakeClient::calls(&client.config_calls), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
        assert!(refresher.latest().unwrap().validated);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_configuration_is_not_refetched() {
        let client = Arc::new(FakeClient::new("R1"));
        let refresher = refresher(&client);

        assert!(matches!(refresher.refresh().await, RefreshOutcome::Refreshed(_)));
        tokio::time::advance(Duration::from_secs(60 * 60)).await;
        assert!(matches!(refresher.refresh().await, RefreshOutcome::NotDue));
        assert_eq!(FakeClient::calls(&client.reload_calls), 1);

        tokio::time::advance(Duration::from_secs(24 * 60 * 60)).await;
        assert!(matches!(refresher.refresh().await, RefreshOutcome::Refreshed(_)));
        assert_eq!(FakeClient::calls(&client.reload_calls), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn never_validated_keeps_previous() {
        let client = Arc::new(FakeClient::new("R1"));
        let refresher = refresher(&client);
        refresher.refresh().await;
        let previous = refresher.latest().unwrap();

        tokio::time::advance(Duration::from_secs(25 * 60 * 60)).await;
        for _ in 0..20 {
            client.push_config(Reply::Ok(false));
        }
        let outcome = refresher.refresh().await;

        assert!(matches!(outcome, RefreshOutcome::Kept));
        assert!(Arc::ptr_eq(&previous, &refresher.latest().unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn reload_failure_leaves_config_absent() {
        let client = Arc::new(FakeClient::new("R1"));
        client.push_reload(Reply::Hang);
        let refresher = refresher(&client);

        assert!(matches!(refresher.refresh().await, RefreshOutcome::Kept));
        assert!(refresher.latest().is_none());
        assert_eq!(FakeClient::calls(&client.config_calls), 0);
        assert!(refresher.is_due(Instant::now()));
    }
}
