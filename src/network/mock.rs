//! In-memory transport for tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::core::{Error, Result};
use super::Transport;

/// Address reported as the sender of injected datagrams.
pub(crate) const MOCK_PEER: &str = "192.0.2.1:3000";

/// Transport backed by a channel for incoming datagrams and a log of sent ones.
#[derive(Debug)]
pub(crate) struct MockTransport {
    incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    shared: Arc<Shared>,
}

/// Test-side handle to a [`MockTransport`].
#[derive(Debug, Clone)]
pub(crate) struct MockNetwork {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    shared: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
    fail_sends: AtomicBool,
    fail_next_recv: AtomicBool,
}

impl MockTransport {
    pub fn new() -> (Self, MockNetwork) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());
        let transport = MockTransport {
            incoming: tokio::sync::Mutex::new(rx),
            shared: Arc::clone(&shared),
        };
        (transport, MockNetwork { tx, shared })
    }
}

impl MockNetwork {
    /// Deliver a datagram to the transport.
    pub fn inject(&self, payload: &[u8]) {
        let _ = self.tx.send(payload.to_vec());
    }

    /// Datagrams sent so far.
    pub fn sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.shared.sent.lock().unwrap().clone()
    }

    /// Make every send fail from now on.
    pub fn fail_sends(&self) {
        self.shared.fail_sends.store(true, Ordering::SeqCst);
    }

    /// Make the next receive fail once, queued datagrams stay queued.
    pub fn fail_next_recv(&self) {
        self.shared.fail_next_recv.store(true, Ordering::SeqCst);
    }
}

impl Transport for MockTransport {
    async fn send_to(&self, payload: &[u8], dest: SocketAddr) -> Result<usize> {
        if self.shared.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::network("mock send failure"));
        }
        self.shared.sent.lock().unwrap().push((payload.to_vec(), dest));
        Ok(payload.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        if self.shared.fail_next_recv.swap(false, Ordering::SeqCst) {
            return Err(Error::network("mock receive failure"));
        }
        let mut incoming = self.incoming.lock().await;
        match incoming.recv().await {
            Some(datagram) => {
                // Truncate like a real socket would
                let len = datagram.len().min(buf.len());
                buf[..len].copy_from_slice(&datagram[..len]);
                let peer = MOCK_PEER
                    .parse()
                    .map_err(|_| Error::network("bad mock peer address"))?;
                Ok((len, peer))
            }
            // Every handle dropped: behave like a silent network
            None => std::future::pending().await,
        }
    }
}
