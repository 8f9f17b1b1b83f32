//! Error types.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use hickory_proto::error::ProtoError;
use thiserror::Error;

/// Failure of a single forward exchange with the upstream resolver.
///
/// Every variant is answered with SERVFAIL; none of them reach the
/// server loop.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("timed out after {0:?} waiting for upstream")]
    Timeout(Duration),

    #[error("failed to open upstream socket: {0}")]
    Bind(#[source] io::Error),

    #[error("failed to connect to upstream {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to send query to upstream: {0}")]
    Send(#[source] io::Error),

    #[error("failed to receive reply from upstream: {0}")]
    Receive(#[source] io::Error),

    #[error("malformed reply from upstream: {0}")]
    Parse(#[source] ProtoError),

    #[error("upstream reply id mismatch: expected {expected:#06x}, got {actual:#06x}")]
    IdMismatch { expected: u16, actual: u16 },
}

impl ForwardError {
    /// True for timeouts, false for every other failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ForwardError::Timeout(_))
    }
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid upstream address '{0}': expected ip, ip:port or [ipv6]:port")]
    InvalidUpstream(String),
}
