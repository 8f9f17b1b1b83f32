//! Forward exchange with the upstream resolver.
//!
//! Each exchange binds its own ephemeral UDP socket, sends the client's
//! query bytes once and waits for a single reply datagram. The socket is
//! owned by the exchange and dropped on every return path.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use hickory_proto::op::Message;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::dns::{DnsQuery, Reply};
use crate::error::{ConfigError, ForwardError};

pub const DEFAULT_UPSTREAM: &str = "8.8.8.8:53";
pub const DEFAULT_PORT: u16 = 53;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upstream receive buffer. Large enough for plain UDP replies; bigger
/// EDNS0 replies are truncated and fail to parse.
pub const DEFAULT_RECV_BUFFER: usize = 1024;

/// Parse an upstream address, defaulting the port to 53.
///
/// Accepts `ip`, `ip:port`, `[ipv6]` and `[ipv6]:port`.
pub fn parse_upstream(s: &str) -> Result<SocketAddr, ConfigError> {
    let s = s.trim();
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let host = s
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(s);
    host.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DEFAULT_PORT))
        .map_err(|_| ConfigError::InvalidUpstream(s.to_string()))
}

/// Upstream resolver settings shared read-only by all queries.
#[derive(Debug, Clone)]
pub struct Upstream {
    addr: SocketAddr,
    timeout: Duration,
    recv_buffer: usize,
}

impl Upstream {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeout: DEFAULT_TIMEOUT,
            recv_buffer: DEFAULT_RECV_BUFFER,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_recv_buffer(mut self, size: usize) -> Self {
        self.recv_buffer = size;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Forward a query and wait for the upstream's answer.
    ///
    /// The whole round trip (send and receive) is bounded by the timeout.
    /// The returned reply keeps the upstream's exact bytes.
    pub async fn exchange(&self, query: &DnsQuery) -> Result<Reply, ForwardError> {
        let socket = UdpSocket::bind(self.local_addr())
            .await
            .map_err(ForwardError::Bind)?;
        socket
            .connect(self.addr)
            .await
            .map_err(|source| ForwardError::Connect {
                addr: self.addr,
                source,
            })?;

        let mut buf = vec![0u8; self.recv_buffer];
        let len = tokio::time::timeout(self.timeout, async {
            socket.send(query.wire()).await.map_err(ForwardError::Send)?;
            socket.recv(&mut buf).await.map_err(ForwardError::Receive)
        })
        .await
        .map_err(|_| ForwardError::Timeout(self.timeout))??;

        buf.truncate(len);

        debug!(
            upstream = %self.addr,
            bytes_received = len,
            "upstream reply received"
        );

        let message = Message::from_vec(&buf).map_err(ForwardError::Parse)?;
        if message.id() != query.id() {
            return Err(ForwardError::IdMismatch {
                expected: query.id(),
                actual: message.id(),
            });
        }

        Ok(Reply::relayed(message, buf))
    }

    fn local_addr(&self) -> SocketAddr {
        let ip = if self.addr.is_ipv4() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        };
        SocketAddr::new(ip, 0)
    }
}

impl Default for Upstream {
    fn default() -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::new(8, 8, 8, 8), DEFAULT_PORT)))
    }
}
