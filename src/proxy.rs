//! DNS proxy orchestration.
//!
//! Loads the allow-list, binds the UDP transport and runs the proxy server
//! until shutdown.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::ConfigError;
use crate::filter::Allowlist;
use crate::resolver::FilteringResolver;
use crate::transport::udp::UdpTransport;
use crate::transport::upstream::Upstream;

pub const DEFAULT_ALLOWLIST_PATH: &str = "/data/whitelist.txt";

/// Configuration for the DNS proxy.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Local address to bind (e.g., 0.0.0.0:53)
    pub bind_addr: SocketAddr,
    /// Upstream resolver for allowed queries
    pub upstream: Upstream,
    /// Allow-list file, one domain per line
    pub allowlist_path: PathBuf,
}

/// Build a bind address from an IP string and port.
pub fn parse_bind_addr(bind: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let ip = bind
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| ConfigError::InvalidBindAddress(bind.to_string()))?;

    Ok(SocketAddr::new(ip, port))
}

/// A bound proxy, ready to serve.
pub struct Proxy {
    transport: UdpTransport,
    resolver: Arc<FilteringResolver>,
}

impl Proxy {
    /// Load the allow-list and bind the listening socket.
    ///
    /// A missing allow-list is not an error; failing to bind is.
    pub async fn bind(config: ProxyConfig) -> io::Result<Self> {
        let allowlist = Arc::new(Allowlist::load(&config.allowlist_path));
        let resolver = Arc::new(FilteringResolver::new(allowlist, config.upstream));

        info!(
            "DNS proxy started with {} allowed domains",
            resolver.allowed_count()
        );

        let transport = UdpTransport::bind(config.bind_addr).await?;

        Ok(Self {
            transport,
            resolver,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Serve queries until `shutdown` is cancelled and in-flight queries
    /// have been answered.
    pub async fn run(self, shutdown: CancellationToken) {
        if let Ok(addr) = self.local_addr() {
            info!("DNS server listening on {}", addr);
        }
        info!(
            "Forwarding allowed queries to upstream: {}",
            self.resolver.upstream().addr()
        );

        self.transport.serve(self.resolver, shutdown).await;
    }
}
