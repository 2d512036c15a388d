//! Invalidation Sender
//!
//! Publishes prefix invalidations to the group other processes listen on.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::multicast::protocol;

/// Sends invalidation datagrams to one destination.
#[derive(Debug)]
pub struct InvalidationSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl InvalidationSender {
    /// Creates a sender for the multicast `group` and `port`.
    pub async fn new(group: IpAddr, port: u16) -> Result<Self> {
        if !group.is_multicast() {
            return Err(CacheError::NotMulticast(group));
        }
        Self::bind_to(SocketAddr::new(group, port)).await
    }

    /// Creates a sender for any destination, unicast included.
    pub async fn bind_to(target: SocketAddr) -> Result<Self> {
        let local: SocketAddr = match target {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;

        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Broadcasts one prefix invalidation.
    pub async fn send(&self, prefix: &str) -> Result<()> {
        let payload = protocol::encode(prefix)?;
        self.socket.send_to(&payload, self.target).await?;
        debug!("Sent invalidation for prefix {:?} to {}", prefix, self.target);
        Ok(())
    }
}
