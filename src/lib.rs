//! allowdns - An allow-list filtering DNS proxy.
//!
//! Queries for allow-listed domains are forwarded unmodified to an upstream
//! resolver; everything else is answered NXDOMAIN locally.

pub mod dns;
pub mod error;
pub mod filter;
pub mod logging;
pub mod proxy;
pub mod resolver;
pub mod transport;
