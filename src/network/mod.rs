//! Datagram transport module
//!
//! This module hides socket setup behind a small send/receive trait so the
//! sync loops can be driven by a real UDP socket or by an in-memory channel.

mod udp;
#[cfg(test)]
pub(crate) mod mock;

pub use self::udp::UdpTransport;

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::core::Result;

/// One-to-many, best-effort datagram endpoint
pub trait Transport {
    /// Sends one datagram, returning the number of bytes written
    fn send_to(&self, payload: &[u8], dest: SocketAddr) -> impl Future<Output = Result<usize>> + Send;

    /// Waits for the next datagram, returning its length and sender
    fn recv_from(&self, buf: &mut [u8]) -> impl Future<Output = Result<(usize, SocketAddr)>> + Send;
}

/// Resolves where the server sends its messages
///
/// The multicast group when one is configured, the limited broadcast
/// address otherwise.
pub fn destination(multicast: Option<Ipv4Addr>, port: u16) -> SocketAddr {
    let ip = multicast.unwrap_or(Ipv4Addr::BROADCAST);
    SocketAddr::V4(SocketAddrV4::new(ip, port))
}
