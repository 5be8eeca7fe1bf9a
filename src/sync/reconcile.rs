use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::ReconcileConfig;
use crate::power::{fmt_power, PowerControl};

/// How a reconciliation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The local state could not be read, nothing was attempted
    Unsupported,
    /// The local state already matched the target
    AlreadyInSync,
    /// The state was read back equal to the target after `attempts` writes
    Converged {
        /// Writes before the state was observed at the target
        attempts: u32,
    },
    /// The retry budget ran out without observing the target state
    Exhausted {
        /// Writes attempted, equal to the configured maximum
        attempts: u32,
    },
}

/// Drives a flaky actuator until its state is observed at a target
///
/// A single `set_power` may take effect late or not at all, so every write
/// is followed by a settle delay and a read back. Once the target is seen,
/// or the budget is spent, one more write is issued as a final assurance.
/// The caller is blocked for the whole run, at most
/// `max_attempts * settle_delay` plus actuator time.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    /// Creates a reconciler with the given bounds
    pub fn new(config: ReconcileConfig) -> Self {
        Reconciler { config }
    }

    /// Returns the bounds in use
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Brings `power` to `target`
    ///
    /// Never fails: actuation problems are logged and reflected in the
    /// returned [`Outcome`].
    pub async fn reconcile<P: PowerControl>(&self, power: &mut P, target: bool) -> Outcome {
        let current = match power.get_power().await {
            Some(current) => current,
            None => {
                warn!("DPMS not enabled, cannot reconcile towards {}", fmt_power(target));
                return Outcome::Unsupported;
            }
        };

        if current == target {
            debug!("Already {}, nothing to do", fmt_power(target));
            return Outcome::AlreadyInSync;
        }

        info!("sync: {} -> {}", fmt_power(current), fmt_power(target));

        for attempt in 1..=self.config.max_attempts {
            actuate(power, target).await;
            sleep(self.config.settle_delay).await;

            // An unreadable state counts as off
            if power.get_power().await.unwrap_or(false) == target {
                actuate(power, target).await;
                debug!(attempt, "Power state converged to {}", fmt_power(target));
                return Outcome::Converged { attempts: attempt };
            }
        }

        actuate(power, target).await;
        warn!(
            "Power state did not reach {} after {} attempts",
            fmt_power(target),
            self.config.max_attempts
        );
        Outcome::Exhausted { attempts: self.config.max_attempts }
    }
}

async fn actuate<P: PowerControl>(power: &mut P, target: bool) {
    if let Err(e) = power.set_power(target).await {
        warn!("DPMS set failed: {}", e);
    }
}
