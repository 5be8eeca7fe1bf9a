use crate::core::PollRate;

/// Power state snapshot broadcast by the server
///
/// Only meaningful relative to the sender's clock; receivers compare
/// `epoch_ms` against their own clock using a tolerance derived from
/// `poll_rate_hz`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorState {
    /// Sender wall clock at sampling, milliseconds since the Unix epoch
    pub epoch_ms: i64,
    /// Rate at which the sender samples its power source
    pub poll_rate_hz: f64,
    /// Sampled power state
    pub powered_on: bool,
}

/// Result of checking a message's age against its tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Freshness {
    /// Within tolerance
    Fresh {
        /// Absolute clock difference
        delta_ms: u64,
    },
    /// Older (or further in the future) than the sender's own cadence
    Stale {
        /// Absolute clock difference
        delta_ms: u64,
        /// Maximum accepted difference
        tolerance_ms: f64,
    },
}

impl MonitorState {
    /// Creates a snapshot stamped with the given time
    pub fn new(epoch_ms: i64, rate: PollRate, powered_on: bool) -> Self {
        MonitorState {
            epoch_ms,
            poll_rate_hz: rate.hz(),
            powered_on,
        }
    }

    /// Maximum accepted clock difference, `1000 / poll_rate_hz` milliseconds
    pub fn tolerance_ms(&self) -> f64 {
        1000.0 / self.poll_rate_hz
    }

    /// Absolute difference between `now_ms` and the message timestamp
    pub fn delta_ms(&self, now_ms: i64) -> u64 {
        now_ms.abs_diff(self.epoch_ms)
    }

    /// Checks the message against the receiver's clock
    ///
    /// The boundary is inclusive: a delta equal to the tolerance is fresh.
    pub fn freshness(&self, now_ms: i64) -> Freshness {
        let delta_ms = self.delta_ms(now_ms);
        let tolerance_ms = self.tolerance_ms();
        if delta_ms as f64 > tolerance_ms {
            Freshness::Stale { delta_ms, tolerance_ms }
        } else {
            Freshness::Fresh { delta_ms }
        }
    }
}
