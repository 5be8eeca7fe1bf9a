use std::net::Ipv4Addr;
use std::time::Duration;

use super::{Error, Result};

/// Validated sampling rate of the power source, in Hz
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollRate(f64);

impl PollRate {
    /// Creates a poll rate, rejecting non-finite values and rates below
    /// [`MIN_POLL_RATE_HZ`](super::MIN_POLL_RATE_HZ)
    pub fn new(hz: f64) -> Result<Self> {
        if hz.is_finite() && hz >= super::MIN_POLL_RATE_HZ {
            Ok(PollRate(hz))
        } else {
            Err(Error::config(format!(
                "poll rate must be at least {} Hz, got {}",
                super::MIN_POLL_RATE_HZ,
                hz
            )))
        }
    }

    /// Returns the rate in Hz
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Returns the sampling period, `round(1000 / hz)` milliseconds
    ///
    /// Never shorter than one millisecond.
    pub fn period(&self) -> Duration {
        let millis = (1000.0 / self.0).round().max(1.0);
        Duration::from_millis(millis as u64)
    }

    /// Returns the staleness tolerance receivers derive from this rate
    pub fn tolerance_ms(&self) -> f64 {
        1000.0 / self.0
    }
}

impl Default for PollRate {
    fn default() -> Self {
        PollRate(super::DEFAULT_POLL_RATE_HZ)
    }
}

/// Bounds for driving the local actuator towards a target state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Maximum `set_power` attempts before giving up
    pub max_attempts: u32,
    /// Wait between an attempt and reading the state back
    pub settle_delay: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            max_attempts: super::DEFAULT_MAX_ATTEMPTS,
            settle_delay: Duration::from_millis(super::DEFAULT_SETTLE_DELAY_MS),
        }
    }
}

/// Configuration shared by the server and client roles
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// UDP port messages are sent to and received on
    pub port: u16,
    /// Multicast group to use instead of broadcast
    pub multicast: Option<Ipv4Addr>,
    /// X display selector, `None` for the default display
    pub display: Option<String>,
    /// Rate at which the server samples the power state
    pub poll_rate: PollRate,
    /// Client side actuation bounds
    pub reconcile: ReconcileConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            port: super::DEFAULT_PORT,
            multicast: None,
            display: None,
            poll_rate: PollRate::default(),
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Checks the configuration before any socket is opened
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("port must be non-zero"));
        }

        if let Some(group) = self.multicast {
            if !group.is_multicast() {
                return Err(Error::config(format!(
                    "{} is not a multicast address (expected 224.0.0.0/4)",
                    group
                )));
            }
        }

        if self.reconcile.max_attempts == 0 {
            return Err(Error::config("max attempts must be at least 1"));
        }

        Ok(())
    }

    /// Human readable destination, used in startup logs
    pub fn describe_address(&self) -> String {
        match self.multicast {
            Some(group) => format!("{}:{}", group, self.port),
            None => format!("(any):{}", self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_rate_validation() {
        assert!(PollRate::new(1.0).is_ok());
        assert!(PollRate::new(0.25).is_ok());
        assert!(matches!(PollRate::new(0.0), Err(Error::Config(_))));
        assert!(PollRate::new(-2.0).is_err());
        assert!(PollRate::new(f64::NAN).is_err());
        assert!(PollRate::new(f64::INFINITY).is_err());
        assert!(PollRate::new(1e-9).is_err());
        assert!(PollRate::new(0.001).is_ok());
    }

    #[test]
    fn test_poll_rate_period() {
        assert_eq!(PollRate::new(1.0).unwrap().period(), Duration::from_millis(1000));
        assert_eq!(PollRate::new(3.0).unwrap().period(), Duration::from_millis(333));
        assert_eq!(PollRate::new(0.5).unwrap().period(), Duration::from_millis(2000));
        // Very high rates never produce a zero period
        assert_eq!(PollRate::new(5000.0).unwrap().period(), Duration::from_millis(1));
    }

    #[test]
    fn test_poll_rate_tolerance() {
        let rate = PollRate::new(2.0).unwrap();
        assert_eq!(rate.tolerance_ms(), 500.0);
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.multicast, None);
        assert_eq!(config.poll_rate.hz(), 1.0);
        assert_eq!(config.reconcile.max_attempts, 100);
        assert_eq!(config.reconcile.settle_delay, Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_unicast_group() {
        let config = SyncConfig {
            multicast: Some(Ipv4Addr::new(192, 168, 1, 10)),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = SyncConfig {
            multicast: Some(Ipv4Addr::new(239, 0, 0, 1)),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.describe_address(), "239.0.0.1:3000");
    }

    #[test]
    fn test_config_rejects_zero_port_and_attempts() {
        let config = SyncConfig { port: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let mut config = SyncConfig::default();
        config.reconcile.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
