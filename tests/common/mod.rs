//! Shared helpers: query builders and a mock upstream resolver bound to
//! localhost.

#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hickory_proto::op::{Header, Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use allowdns::dns::DnsQuery;

pub const ANSWER_IP: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);

pub fn query_message(id: u16, domain: &str) -> Message {
    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(
        Name::from_ascii(domain).unwrap(),
        RecordType::A,
    ));
    message
}

pub fn query(id: u16, domain: &str) -> DnsQuery {
    DnsQuery::from_message(query_message(id, domain)).unwrap()
}

pub fn answer_record(name: &Name) -> Record {
    Record::from_rdata(name.clone(), 300, RData::A(A(ANSWER_IP)))
}

/// Build a NOERROR response with a single A record for the request.
pub fn answer(request: &Message) -> Message {
    let mut response = Message::new();
    let mut header = Header::response_from_request(request.header());
    header.set_recursion_available(true);
    response.set_header(header);
    response.add_queries(request.queries().to_vec());
    if let Some(question) = request.queries().first() {
        response.add_answer(answer_record(question.name()));
    }
    response
}

pub const OVERSIZED_ANSWERS: usize = 100;

/// Build a NOERROR response whose encoding is well over 1024 bytes.
pub fn oversized_answer(request: &Message) -> Message {
    let mut response = answer(request);
    response.take_answers();
    if let Some(question) = request.queries().first() {
        for i in 0..OVERSIZED_ANSWERS {
            let ip = Ipv4Addr::new(10, 0, (i / 256) as u8, (i % 256) as u8);
            response.add_answer(Record::from_rdata(
                question.name().clone(),
                300,
                RData::A(A(ip)),
            ));
        }
    }
    response
}

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Reply with a single A record.
    Answer,
    /// Reply with a valid message too large for the default receive buffer.
    Oversized,
    /// Reply with bytes that are not a DNS message.
    Garbage,
    /// Never reply.
    Silent,
}

/// Upstream resolver stand-in that counts the datagrams it receives.
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl MockUpstream {
    pub async fn spawn(behavior: Behavior) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let task = tokio::spawn(async move {
            let mut buf = [0u8; 4096];
            loop {
                let Ok((len, src)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let reply = match behavior {
                    Behavior::Answer => {
                        let request = Message::from_vec(&buf[..len]).unwrap();
                        answer(&request).to_vec().unwrap()
                    }
                    Behavior::Oversized => {
                        let request = Message::from_vec(&buf[..len]).unwrap();
                        oversized_answer(&request).to_vec().unwrap()
                    }
                    Behavior::Garbage => b"\x12\x34not dns".to_vec(),
                    Behavior::Silent => continue,
                };
                let _ = socket.send_to(&reply, src).await;
            }
        });

        Self { addr, hits, task }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// An address on localhost with nothing listening.
pub async fn closed_addr() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.local_addr().unwrap()
}
