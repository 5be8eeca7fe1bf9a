//! Monitor sync: keeps display power (DPMS) state in step across machines
//!
//! A server samples its display's power state and broadcasts every
//! transition as a small fixed-size UDP datagram. Clients check each message
//! against a staleness tolerance derived from the sender's poll rate and
//! drive their own display to match, retrying until the change is observed
//! or a retry budget runs out.
pub mod core;
pub mod network;
pub mod power;
pub mod protocol;
pub mod sync;
pub mod util;

// Re-export commonly used items
pub use self::core::{Error, Result, SyncConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
