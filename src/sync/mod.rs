//! Synchronization module
//!
//! The server side samples and broadcasts power state transitions; the
//! client side checks each message's freshness and reconciles its own
//! display towards it.

pub mod client;
pub mod reconcile;
pub mod server;

pub use self::client::{ClientLoop, Disposition};
pub use self::reconcile::{Outcome, Reconciler};
pub use self::server::{ChangeDetector, ServerLoop};
