//! DNS query resolution logic.
//!
//! Handles the core query processing pipeline:
//! 1. Filter against the allow-list
//! 2. Answer NXDOMAIN locally for anything not allowed
//! 3. Forward allowed queries upstream, answering SERVFAIL if that fails
//!
//! Transports handle the actual I/O, resolver handles decisions.

use std::sync::Arc;

use hickory_proto::op::ResponseCode;
use tracing::{info, warn};

use crate::dns::{DnsQuery, Reply};
use crate::filter::Allowlist;
use crate::transport::upstream::Upstream;

/// Action to take for a DNS query.
#[derive(Debug)]
pub enum QueryAction {
    /// Query is blocked, return this response immediately.
    Blocked { reply: Reply, domain: String },
    /// Query should be forwarded to upstream.
    Forward { domain: String },
}

/// Resolver handles DNS query processing decisions.
///
/// Holds only read-only configuration, so a single instance is shared by
/// every in-flight query.
pub struct FilteringResolver {
    allowlist: Arc<Allowlist>,
    upstream: Upstream,
}

impl FilteringResolver {
    pub fn new(allowlist: Arc<Allowlist>, upstream: Upstream) -> Self {
        Self {
            allowlist,
            upstream,
        }
    }

    /// Decide what to do with a query without doing any I/O.
    ///
    /// A query without a question has an empty domain, which is never
    /// allowed.
    pub fn decide(&self, query: &DnsQuery) -> QueryAction {
        let domain = query.domain().unwrap_or_default();

        if self.allowlist.contains(&domain) {
            QueryAction::Forward { domain }
        } else {
            QueryAction::Blocked {
                reply: Reply::negative(query.message(), ResponseCode::NXDomain),
                domain,
            }
        }
    }

    /// Resolve a query to exactly one reply.
    ///
    /// Never fails: upstream errors become SERVFAIL. The reply always
    /// carries the query's transaction id and question.
    pub async fn resolve(&self, query: &DnsQuery) -> Reply {
        match self.decide(query) {
            QueryAction::Blocked { reply, domain } => {
                info!("BLOCKED: {}", domain);
                reply
            }
            QueryAction::Forward { domain } => {
                info!("ALLOWED: {}", domain);
                match self.upstream.exchange(query).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!("ERROR forwarding {}: {}", domain, e);
                        Reply::negative(query.message(), ResponseCode::ServFail)
                    }
                }
            }
        }
    }

    /// Returns the number of domains in the allow-list.
    pub fn allowed_count(&self) -> usize {
        self.allowlist.len()
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }
}
