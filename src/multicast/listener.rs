//! Invalidation Listener
//!
//! Receives prefix datagrams and forwards them to `CacheStore::uncache_like`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};
use crate::multicast::protocol::{self, MAX_DATAGRAM_SIZE};

// == Invalidation Listener ==
/// A bound socket ready to receive invalidation datagrams.
#[derive(Debug)]
pub struct InvalidationListener {
    socket: UdpSocket,
}

impl InvalidationListener {
    /// Binds `port` on all interfaces and joins the multicast `group`.
    ///
    /// The port is bound with address (and on unix, port) reuse so every
    /// process on the host can join the same group.
    pub async fn bind(group: IpAddr, port: u16) -> Result<Self> {
        if !group.is_multicast() {
            return Err(CacheError::NotMulticast(group));
        }

        let socket = match group {
            IpAddr::V4(group) => {
                let socket = reusable_socket((Ipv4Addr::UNSPECIFIED, port).into())?;
                socket.join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)?;
                socket
            }
            IpAddr::V6(group) => {
                let socket = reusable_socket((Ipv6Addr::UNSPECIFIED, port).into())?;
                socket.join_multicast_v6(&group, 0)?;
                socket
            }
        };

        info!("Joined invalidation group {} on port {}", group, port);
        Ok(Self { socket })
    }

    /// Wraps an already bound socket, for instance a unicast one.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self { socket }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    // == Spawn ==
    /// Starts the receive loop on the current tokio runtime.
    pub fn spawn<V>(self, store: CacheStore<V>) -> ListenerHandle
    where
        V: Send + Sync + 'static,
    {
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.receive_loop(store, stop_rx));

        ListenerHandle { task, stop }
    }

    async fn receive_loop<V>(self, store: CacheStore<V>, mut stop: watch::Receiver<bool>)
    where
        V: Send + Sync + 'static,
    {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            tokio::select! {
                _ = stop.changed() => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, from)) => apply(&store, &buf[..len], from),
                    Err(e) => warn!("Error receiving invalidation datagram: {}", e),
                },
            }
        }

        info!("Invalidation listener stopped");
    }
}

fn reusable_socket(local: SocketAddr) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(local), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&local.into())?;

    Ok(UdpSocket::from_std(socket.into())?)
}

fn apply<V: Send + Sync + 'static>(store: &CacheStore<V>, payload: &[u8], from: SocketAddr) {
    match protocol::decode(payload) {
        Ok(Some(prefix)) => {
            let removed = store.uncache_like(prefix);
            debug!(
                "Invalidated {} entries with prefix {:?} from {}",
                removed, prefix, from
            );
        }
        Ok(None) => debug!("Ignoring empty invalidation from {}", from),
        Err(e) => warn!("Dropping invalidation from {}: {}", from, e),
    }
}

// == Listener Handle ==
/// Owner side of a running listener.
#[derive(Debug)]
pub struct ListenerHandle {
    task: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

impl ListenerHandle {
    pub fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the receive loop and waits for the socket to be released.
    pub async fn stop(self) {
        self.stop.send_replace(true);
        if let Err(e) = self.task.await {
            warn!("Invalidation listener ended abnormally: {}", e);
        }
    }
}
