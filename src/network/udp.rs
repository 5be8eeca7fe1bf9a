use std::net::{Ipv4Addr, SocketAddr};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::core::{Error, Result};
use super::Transport;

/// UDP socket configured for broadcast/multicast sync traffic
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Creates the server side socket
    ///
    /// Broadcast is allowed and multicast loopback enabled, so a client on
    /// the same host also receives the messages. Must be called from within
    /// a tokio runtime.
    pub fn sender() -> Result<Self> {
        let socket = new_socket()?;
        socket
            .set_broadcast(true)
            .map_err(|e| Error::network(format!("Failed to enable broadcast: {}", e)))?;
        socket
            .set_multicast_loop_v4(true)
            .map_err(|e| Error::network(format!("Failed to enable multicast loopback: {}", e)))?;

        let local = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
        socket
            .bind(&local.into())
            .map_err(|e| Error::network(format!("Failed to bind socket: {}", e)))?;

        Self::from_socket(socket)
    }

    /// Creates a client side socket bound to `port` on all interfaces
    ///
    /// Joins `multicast` on the default interface when given. Must be called
    /// from within a tokio runtime.
    pub fn listener(port: u16, multicast: Option<Ipv4Addr>) -> Result<Self> {
        let socket = new_socket()?;

        let local = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        socket
            .bind(&local.into())
            .map_err(|e| Error::network(format!("Failed to bind {}: {}", local, e)))?;

        if let Some(group) = multicast {
            socket
                .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
                .map_err(|e| Error::network(format!("Failed to join multicast group {}: {}", group, e)))?;
        }

        Self::from_socket(socket)
    }

    /// Returns the local socket address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr()
            .map_err(|e| Error::network(format!("Failed to get local address: {}", e)))
    }

    fn from_socket(socket: Socket) -> Result<Self> {
        socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(socket.into())?;
        Ok(UdpTransport { socket })
    }
}

fn new_socket() -> Result<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| Error::network(format!("Failed to open socket: {}", e)))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| Error::network(format!("Failed to set SO_REUSEADDR: {}", e)))?;
    Ok(socket)
}

impl Transport for UdpTransport {
    async fn send_to(&self, payload: &[u8], dest: SocketAddr) -> Result<usize> {
        self.socket.send_to(payload, dest).await
            .map_err(|e| Error::network(format!("Failed to send message: {}", e)))
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
            .map_err(|e| Error::network(format!("Failed to receive message: {}", e)))
    }
}
