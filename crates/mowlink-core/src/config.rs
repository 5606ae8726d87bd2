// ── Coordinator tuning ──
//
// Every timing knob the coordinator uses. Built by the host (CLI or a
// config profile) and handed in; core never reads config files.

use std::time::Duration;

use crate::staleness::StalenessPolicy;

/// Timing configuration for one device's coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Cadence of the scheduled tick.
    pub poll_interval: Duration,
    /// Minimum age of the last validated configuration before it is refreshed.
    pub config_refresh_interval: Duration,
    /// Time since the last successful status fetch before the device may
    /// be reported unavailable.
    pub unavailable_timeout: Duration,
    /// Consecutive failed status fetches before the device may be
    /// reported unavailable.
    pub unavailable_fetches: u32,
    /// Minimum age of the last known mode before it is read again.
    pub mode_refresh_interval: Duration,
    pub status_fetch_timeout: Duration,
    pub config_reload_timeout: Duration,
    pub config_validate_timeout: Duration,
    /// Sleep between validation polls.
    pub config_validate_spacing: Duration,
    /// Bound on a single mode change, read-back included.
    pub command_timeout: Duration,
    /// Extra ticks scheduled after a command, measured from issuance.
    pub burst_delays: Vec<Duration>,
}

impl CoordinatorConfig {
    pub fn staleness(&self) -> StalenessPolicy {
        StalenessPolicy {
            unavailable_timeout: self.unavailable_timeout,
            unavailable_fetches: self.unavailable_fetches,
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2 * 60),
            config_refresh_interval: Duration::from_secs(24 * 60 * 60),
            unavailable_timeout: Duration::from_secs(5 * 60),
            unavailable_fetches: 3,
            mode_refresh_interval: Duration::from_secs(15 * 60),
            status_fetch_timeout: Duration::from_secs(5),
            config_reload_timeout: Duration::from_secs(10),
            config_validate_timeout: Duration::from_secs(30),
            config_validate_spacing: Duration::from_secs(2),
            command_timeout: Duration::from_secs(40),
            burst_delays: [2, 10, 20, 40, 60]
                .into_iter()
                .map(Duration::from_secs)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_read_back_ends_before_command_timeout() {
        let read_back = mowlink_api::CONFIRM_INTERVAL * mowlink_api::CONFIRM_ATTEMPTS;
        assert!(read_back < CoordinatorConfig::default().command_timeout);
    }
}
