//! Transport layer for the DNS proxy.
//!
//! `udp` receives client queries and sends replies back; `upstream`
//! performs the forward exchange with the upstream resolver.

pub mod udp;
pub mod upstream;

/// Maximum size of an inbound client datagram.
pub const MAX_DNS_PACKET_SIZE: usize = 4096;

/// Replies waiting to be written back to clients.
pub const REPLY_QUEUE_DEPTH: usize = 1024;
