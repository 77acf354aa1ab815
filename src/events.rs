//! Lifecycle event observation (spec section 6). The resolver core emits
//! these, in the order given by spec section 5, to every registered
//! observer; there is no event bus or async channel, just a direct fan-out
//! call, since observers are expected to be lightweight (logging, metrics).
use crate::wire::QType;

#[derive(Debug, Clone)]
pub enum Event {
    Query { name: String, qtype: QType },
    Response { server: String, bytes: usize },
    ParsedResponse { name: String, qtype: QType, ttl: u32, cached: bool },
    Error { domain: String, qtype: QType, message: String },
    Retry { attempt: u32, server: String, reason: String },
    CacheHit { name: String, qtype: QType },
    CacheMiss { name: String, qtype: QType },
    DnssecValidated { name: String, authentic_data: bool },
}

/// Implemented by anything that wants to observe resolver activity.
/// Observers must be `Send + Sync` since a resolver may be shared across
/// tokio tasks.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &Event);
}
