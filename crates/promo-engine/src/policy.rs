//! Cooldown and restart policy
//!
//! All waits in the engine come from these two structs. The defaults are the
//! cadence the remote API has been observed to tolerate.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Waits applied by the poller and worker after each classified outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// After the remote signals rate limiting
    pub rate_limited: Duration,
    /// After an accepted event that did not make the session eligible
    pub pending: Duration,
    /// After a transport failure, unparseable reply or failed redemption
    pub transient: Duration,
    /// Before re-authenticating after a failed login or a lost session
    pub reauth: Duration,
    /// Registration attempts per session; `None` polls until eligible
    pub max_poll_attempts: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limited: Duration::from_secs(120),
            pending: Duration::from_secs(15),
            transient: Duration::from_secs(5),
            reauth: Duration::from_secs(1),
            max_poll_attempts: None,
        }
    }
}

/// Backoff between respawns of a crashed execution unit.
///
/// The first respawn waits `min_interval`; each further consecutive crash
/// doubles the wait up to `max_backoff`. A unit that stays up for at least
/// `max_backoff` resets the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    pub min_interval: Duration,
    pub max_backoff: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RestartPolicy {
    /// Wait before the `consecutive`-th respawn in a row (1-based).
    pub fn delay(&self, consecutive: u32) -> Duration {
        let exponent = consecutive.saturating_sub(1).min(31);
        self.min_interval
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_backoff)
    }
}

/// Sleep for `duration` unless `cancel` fires first.
///
/// Returns `false` when cancelled so callers can leave their loop.
pub async fn cooldown(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
