//! DNS message handling on top of `hickory-proto`.
//!
//! `DnsQuery` keeps the exact bytes a query arrived as, so it can be
//! forwarded unmodified. `Reply` is either a relayed upstream answer
//! (sent back byte-for-byte) or a locally synthesized negative response.

use hickory_proto::error::ProtoError;
use hickory_proto::op::{Header, Message, ResponseCode};

/// Strip a single trailing dot from a domain name.
pub fn normalize_domain(domain: &str) -> &str {
    domain.strip_suffix('.').unwrap_or(domain)
}

/// A parsed DNS query together with its wire bytes.
#[derive(Debug, Clone)]
pub struct DnsQuery {
    message: Message,
    wire: Vec<u8>,
}

impl DnsQuery {
    /// Parse a DNS query from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, ProtoError> {
        let message = Message::from_vec(data)?;

        Ok(Self {
            message,
            wire: data.to_vec(),
        })
    }

    /// Wrap an already built message, encoding it to wire format.
    pub fn from_message(message: Message) -> Result<Self, ProtoError> {
        let wire = message.to_vec()?;

        Ok(Self { message, wire })
    }

    pub fn id(&self) -> u16 {
        self.message.id()
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The bytes this query was parsed from.
    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    /// The queried domain, trailing dot stripped.
    ///
    /// Returns `None` if the message carries no question.
    pub fn domain(&self) -> Option<String> {
        let question = self.message.queries().first()?;
        let name = question.name().to_string();

        Some(normalize_domain(&name).to_string())
    }
}

/// A DNS response for exactly one query.
#[derive(Debug, Clone)]
pub struct Reply {
    message: Message,
    /// Upstream bytes for relayed replies.
    wire: Option<Vec<u8>>,
}

impl Reply {
    /// Synthesize a response with no answers and the given response code.
    ///
    /// The id, opcode, RD flag and question section are echoed from the
    /// query.
    pub fn negative(query: &Message, rcode: ResponseCode) -> Self {
        let mut header = Header::response_from_request(query.header());
        header.set_response_code(rcode);
        header.set_recursion_available(true);
        header.set_authoritative(false);

        let mut message = Message::new();
        message.set_header(header);
        for q in query.queries() {
            message.add_query(q.clone());
        }

        Self {
            message,
            wire: None,
        }
    }

    /// A reply relayed unmodified from upstream.
    pub fn relayed(message: Message, wire: Vec<u8>) -> Self {
        Self {
            message,
            wire: Some(wire),
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn id(&self) -> u16 {
        self.message.id()
    }

    pub fn response_code(&self) -> ResponseCode {
        self.message.response_code()
    }

    pub fn is_relayed(&self) -> bool {
        self.wire.is_some()
    }

    /// Encode the reply to wire format bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>, ProtoError> {
        match self.wire {
            Some(wire) => Ok(wire),
            None => self.message.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::op::{MessageType, OpCode, Query};
    use hickory_proto::rr::{Name, RecordType};

    fn build_query(id: u16, domain: &str) -> Message {
        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true);
        message.add_query(Query::query(
            Name::from_ascii(domain).unwrap(),
            RecordType::AAAA,
        ));
        message
    }

    #[test]
    fn normalize_domain_strips_single_dot() {
        assert_eq!(normalize_domain("example.com."), "example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("example.com.."), "example.com.");
        assert_eq!(normalize_domain(""), "");
    }

    #[test]
    fn parse_keeps_wire_bytes() {
        let bytes = build_query(0x1234, "example.com.").to_vec().unwrap();
        let query = DnsQuery::parse(&bytes).unwrap();

        assert_eq!(query.id(), 0x1234);
        assert_eq!(query.wire(), bytes.as_slice());
        assert_eq!(query.domain().as_deref(), Some("example.com"));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(DnsQuery::parse(&[0x12]).is_err());
    }

    #[test]
    fn domain_preserves_case() {
        let query = DnsQuery::from_message(build_query(1, "Example.COM.")).unwrap();

        assert_eq!(query.domain().as_deref(), Some("Example.COM"));
    }

    #[test]
    fn domain_is_none_without_question() {
        let mut message = Message::new();
        message.set_id(7);
        let query = DnsQuery::from_message(message).unwrap();

        assert_eq!(query.domain(), None);
    }

    #[test]
    fn negative_echoes_id_and_question() {
        let query = build_query(0xBEEF, "bad.example.");
        let reply = Reply::negative(&query, ResponseCode::NXDomain);

        assert_eq!(reply.id(), 0xBEEF);
        assert_eq!(reply.response_code(), ResponseCode::NXDomain);
        assert_eq!(reply.message().message_type(), MessageType::Response);
        assert_eq!(reply.message().queries(), query.queries());
        assert!(reply.message().answers().is_empty());
        assert!(reply.message().recursion_desired());
        assert!(!reply.is_relayed());
    }

    #[test]
    fn negative_survives_encoding() {
        let query = build_query(42, "bad.example.");
        let bytes = Reply::negative(&query, ResponseCode::ServFail)
            .into_bytes()
            .unwrap();
        let decoded = Message::from_vec(&bytes).unwrap();

        assert_eq!(decoded.id(), 42);
        assert_eq!(decoded.response_code(), ResponseCode::ServFail);
        assert_eq!(decoded.queries(), query.queries());
    }

    #[test]
    fn relayed_returns_upstream_bytes() {
        let message = build_query(9, "good.example.");
        let wire = vec![0xAA, 0xBB, 0xCC];
        let reply = Reply::relayed(message, wire.clone());

        assert!(reply.is_relayed());
        assert_eq!(reply.into_bytes().unwrap(), wire);
    }
}
