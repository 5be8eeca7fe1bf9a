//! Power state adapters
//!
//! The sync loops only see two capabilities: reading the power state of the
//! local display and forcing it on or off. [`XsetDpms`] implements both for
//! an X11 display; tests use a scripted mock.

mod dpms;
#[cfg(test)]
pub(crate) mod mock;

pub use self::dpms::XsetDpms;

use std::future::Future;
use std::io;
use thiserror::Error;

/// Errors from a `set_power` call
#[derive(Debug, Error)]
pub enum ActuationError {
    /// The display has no power management capability
    #[error("power management not supported")]
    Unsupported,

    /// The helper command ran but reported failure
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// The helper command could not be run
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Read access to a power state
pub trait PowerSource {
    /// Returns the current power state, `None` when it cannot be determined
    /// on this host.
    fn get_power(&mut self) -> impl Future<Output = Option<bool>> + Send;
}

/// Read and write access to a power state
///
/// A successful `set_power` does not guarantee the state changed; callers
/// read it back to confirm.
pub trait PowerControl: PowerSource {
    /// Requests the given power state
    fn set_power(&mut self, on: bool) -> impl Future<Output = Result<(), ActuationError>> + Send;
}

/// Formats a power state the way it appears in logs
pub fn fmt_power(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

/// Formats a possibly unknown power state
pub fn fmt_last(state: Option<bool>) -> &'static str {
    state.map(fmt_power).unwrap_or("NONE")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting() {
        assert_eq!(fmt_power(true), "ON");
        assert_eq!(fmt_power(false), "OFF");
        assert_eq!(fmt_last(None), "NONE");
        assert_eq!(fmt_last(Some(false)), "OFF");
    }

    #[test]
    fn test_actuation_error_display() {
        let err = ActuationError::CommandFailed("xset exited with 1".into());
        assert_eq!(err.to_string(), "command failed: xset exited with 1");
        assert_eq!(ActuationError::Unsupported.to_string(), "power management not supported");
    }
}
