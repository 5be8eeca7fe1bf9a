use std::net::SocketAddr;
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::network::Transport;
use crate::power::PowerControl;
use crate::protocol::{Freshness, MonitorStateCodec, MAX_MESSAGE_SIZE};
use crate::util::epoch_ms_now;
use super::reconcile::{Outcome, Reconciler};

/// What the client did with one datagram
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Disposition {
    /// Not a valid record, discarded
    Malformed,
    /// Older than the sender's own cadence allows, discarded
    Stale {
        /// Absolute clock difference
        delta_ms: u64,
        /// Maximum accepted difference
        tolerance_ms: f64,
    },
    /// Fresh, handed to reconciliation
    Applied(Outcome),
}

/// Receives state broadcasts and mirrors them onto the local display
///
/// Datagrams are handled one at a time; a running reconciliation delays the
/// next receive, since only the latest target matters.
pub struct ClientLoop<P, T> {
    /// Local power state to drive
    power: P,
    /// Incoming datagram endpoint
    transport: T,
    /// Actuation bounds
    reconciler: Reconciler,
    /// Message codec
    codec: MonitorStateCodec,
}

impl<P: PowerControl, T: Transport> ClientLoop<P, T> {
    /// Creates a client loop
    pub fn new(power: P, transport: T, reconciler: Reconciler) -> Self {
        ClientLoop {
            power,
            transport,
            reconciler,
            codec: MonitorStateCodec::new(),
        }
    }

    /// Runs until `shutdown` is cancelled
    ///
    /// Receive errors are logged and the loop carries on. A reconciliation
    /// in progress is allowed to finish before shutdown is noticed, so the
    /// worst-case shutdown latency is one exhausted reconciliation:
    /// `max_attempts` settle delays plus the time spent in the actuator
    /// (10 s with the defaults, more when every write spawns `xset`).
    pub async fn run(&mut self, shutdown: CancellationToken) {
        // Larger than any record so oversized datagrams are not truncated
        // into something that looks valid
        let mut buf = vec![0u8; MAX_MESSAGE_SIZE];

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = self.transport.recv_from(&mut buf) => received,
            };

            match received {
                Ok((len, from)) => {
                    self.handle_datagram(&buf[..len], from).await;
                }
                Err(e) => warn!("{}", e),
            }
        }

        debug!("Client loop stopped");
    }

    /// Handles one datagram against the current wall clock
    pub async fn handle_datagram(&mut self, payload: &[u8], from: SocketAddr) -> Disposition {
        self.handle_datagram_at(payload, from, epoch_ms_now()).await
    }

    /// Handles one datagram as if received at `now_ms`
    pub async fn handle_datagram_at(
        &mut self,
        payload: &[u8],
        from: SocketAddr,
        now_ms: i64,
    ) -> Disposition {
        let mut frame = BytesMut::from(payload);
        let state = match self.codec.decode(&mut frame) {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!("Empty datagram from {}, ignoring", from);
                return Disposition::Malformed;
            }
            Err(e) => {
                debug!("Discarding datagram from {}: {}", from, e);
                return Disposition::Malformed;
            }
        };

        match state.freshness(now_ms) {
            Freshness::Stale { delta_ms, tolerance_ms } => {
                warn!(
                    "Received message timestamp tolerance: {} > {} (rate={}Hz), ignoring",
                    delta_ms, tolerance_ms, state.poll_rate_hz
                );
                Disposition::Stale { delta_ms, tolerance_ms }
            }
            Freshness::Fresh { .. } => {
                let outcome = self.reconciler.reconcile(&mut self.power, state.powered_on).await;
                Disposition::Applied(outcome)
            }
        }
    }
}
