use std::net::SocketAddr;
use bytes::BytesMut;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::codec::Encoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::PollRate;
use crate::network::Transport;
use crate::power::{fmt_last, fmt_power, PowerSource};
use crate::protocol::{MonitorState, MonitorStateCodec};
use crate::util::epoch_ms_now;

/// Remembers the last sampled power state to detect transitions
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<bool>,
}

impl ChangeDetector {
    /// Creates a detector with no known state
    pub fn new() -> Self {
        ChangeDetector::default()
    }

    /// Returns the last recorded state
    pub fn last(&self) -> Option<bool> {
        self.last
    }

    /// Records a sample, returning whether it must be broadcast
    ///
    /// True for the very first sample and whenever the value changes.
    pub fn observe(&mut self, current: bool) -> bool {
        if self.last == Some(current) {
            return false;
        }

        info!("sync: {} -> {}", fmt_last(self.last), fmt_power(current));
        self.last = Some(current);
        true
    }
}

/// Samples the local power state and broadcasts transitions
///
/// Edge-triggered: nothing is sent while the state is unchanged, so a
/// receiver that misses a message stays out of sync until the next change.
pub struct ServerLoop<P, T> {
    /// Power state being monitored
    power: P,
    /// Outgoing datagram endpoint
    transport: T,
    /// Broadcast or multicast destination
    destination: SocketAddr,
    /// Sampling rate, also advertised in every message
    rate: PollRate,
    /// Last known state
    detector: ChangeDetector,
    /// Message codec
    codec: MonitorStateCodec,
    /// Reused encode buffer
    send_buffer: BytesMut,
}

impl<P: PowerSource, T: Transport> ServerLoop<P, T> {
    /// Creates a server loop
    pub fn new(power: P, transport: T, destination: SocketAddr, rate: PollRate) -> Self {
        ServerLoop {
            power,
            transport,
            destination,
            rate,
            detector: ChangeDetector::new(),
            codec: MonitorStateCodec::new(),
            send_buffer: BytesMut::with_capacity(crate::protocol::RECORD_LEN),
        }
    }

    /// Runs until `shutdown` is cancelled
    ///
    /// The first sample is taken immediately, then one per period.
    /// Cancellation interrupts the wait between samples and no final message
    /// is sent.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        let mut ticker = interval(self.rate.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.tick().await;
        }

        debug!("Server loop stopped");
    }

    /// Takes one sample, broadcasting it if the state changed
    ///
    /// An unreadable state is reported as off. Returns the message that was
    /// built, whether or not sending it succeeded.
    pub async fn tick(&mut self) -> Option<MonitorState> {
        let current = self.power.get_power().await.unwrap_or(false);
        if !self.detector.observe(current) {
            return None;
        }

        let state = MonitorState::new(epoch_ms_now(), self.rate, current);
        self.broadcast(state).await;
        Some(state)
    }

    /// Returns the last known state
    pub fn last_state(&self) -> Option<bool> {
        self.detector.last()
    }

    async fn broadcast(&mut self, state: MonitorState) {
        self.send_buffer.clear();
        if let Err(e) = self.codec.encode(state, &mut self.send_buffer) {
            warn!("Failed to encode state: {}", e);
            return;
        }

        // Fire and forget, the next change is sent regardless
        if let Err(e) = self.transport.send_to(&self.send_buffer, self.destination).await {
            warn!("{}", e);
        }
    }
}
