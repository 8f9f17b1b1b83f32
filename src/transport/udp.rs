//! UDP transport for DNS queries.
//!
//! The receive loop spawns one task per datagram. Handling tasks push
//! encoded replies onto a channel drained by a single sender task, so
//! replies leave in completion order rather than arrival order.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dns::DnsQuery;
use crate::resolver::FilteringResolver;

use super::{MAX_DNS_PACKET_SIZE, REPLY_QUEUE_DEPTH};

type OutboundReply = (Vec<u8>, SocketAddr);

/// UDP transport for DNS proxy.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
}

impl UdpTransport {
    /// Bind the listening socket.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);

        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serve queries until `shutdown` is cancelled.
    ///
    /// After cancellation no new datagrams are read; in-flight queries run
    /// to completion (or their upstream timeout) and their replies are sent
    /// before this returns.
    pub async fn serve(self, resolver: Arc<FilteringResolver>, shutdown: CancellationToken) {
        let (reply_tx, reply_rx) = mpsc::channel::<OutboundReply>(REPLY_QUEUE_DEPTH);
        let sender = tokio::spawn(send_replies(self.socket.clone(), reply_rx));

        let mut handlers = JoinSet::new();
        let mut buf = vec![0u8; MAX_DNS_PACKET_SIZE];

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.socket.recv_from(&mut buf) => {
                    let (len, src) = match result {
                        Ok(r) => r,
                        Err(e) => {
                            warn!("UDP recv error: {}", e);
                            continue;
                        }
                    };

                    let query = match DnsQuery::parse(&buf[..len]) {
                        Ok(q) => q,
                        Err(e) => {
                            debug!(client = %src, "dropping malformed query: {}", e);
                            continue;
                        }
                    };

                    handlers.spawn(handle_query(query, src, resolver.clone(), reply_tx.clone()));
                }
                Some(result) = handlers.join_next(), if !handlers.is_empty() => {
                    if let Err(e) = result {
                        warn!("query handler failed: {}", e);
                    }
                }
            }
        }

        if !handlers.is_empty() {
            info!("waiting for {} in-flight queries", handlers.len());
        }
        while let Some(result) = handlers.join_next().await {
            if let Err(e) = result {
                warn!("query handler failed: {}", e);
            }
        }

        drop(reply_tx);
        if let Err(e) = sender.await {
            warn!("reply sender failed: {}", e);
        }
    }
}

async fn handle_query(
    query: DnsQuery,
    client: SocketAddr,
    resolver: Arc<FilteringResolver>,
    replies: mpsc::Sender<OutboundReply>,
) {
    let reply = resolver.resolve(&query).await;

    match reply.into_bytes() {
        Ok(bytes) => {
            if replies.send((bytes, client)).await.is_err() {
                warn!(client = %client, "reply queue closed, dropping reply");
            }
        }
        Err(e) => warn!(client = %client, "failed to encode reply: {}", e),
    }
}

async fn send_replies(socket: Arc<UdpSocket>, mut replies: mpsc::Receiver<OutboundReply>) {
    while let Some((bytes, client)) = replies.recv().await {
        if let Err(e) = socket.send_to(&bytes, client).await {
            warn!(client = %client, "UDP response error: {}", e);
        }
    }
}
