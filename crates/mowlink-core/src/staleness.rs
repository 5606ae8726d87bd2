// ── Availability policy ──
//
// A device is reported unavailable only when BOTH the last good status is
// older than the timeout AND enough consecutive fetches have failed. A
// burst of quick failures against a fresh snapshot, or an old snapshot
// with no failures, both keep the device available.

use std::time::Duration;

use tokio::time::Instant;

/// Thresholds deciding when repeated fetch failures mean "unavailable".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    pub unavailable_timeout: Duration,
    pub unavailable_fetches: u32,
}

impl StalenessPolicy {
    /// `last_success = None` (never fetched) counts as infinitely old.
    pub fn is_unavailable(&self, now: Instant, last_success: Option<Instant>, failures: u32) -> bool {
        let too_old = last_success.is_none_or(|at| {
            now.saturating_duration_since(at) > self.unavailable_timeout
        });
        let too_many_failures = failures >= self.unavailable_fetches;
        too_old && too_many_failures
    }
}
