//! Transport-agnostic dispatch: UDP (C5) and DNS-over-HTTPS (C6).
pub mod doh;
pub mod udp;

use std::time::Duration;

use crate::config::DohMethod;
use crate::error::DNSResult;

/// What the resolver core dispatches a built query over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Udp,
    /// Accepted for parity with the source; implemented as UDP (spec
    /// section 4.7 explicitly permits this).
    Tcp,
    Doh,
}

/// Send `query` to `destination` and return the raw response bytes, or a
/// transport/timeout error. `destination` is a `host:port` pair for UDP/TCP
/// transports and a full HTTPS URL for DoH.
pub async fn dispatch(
    kind: TransportKind,
    destination: &str,
    query: &[u8],
    timeout: Duration,
    http: &reqwest::Client,
    doh_method: DohMethod,
) -> DNSResult<Vec<u8>> {
    match kind {
        TransportKind::Udp | TransportKind::Tcp => udp::send_query(destination, query, timeout).await,
        TransportKind::Doh => match doh_method {
            DohMethod::Post => doh::send_query_post(http, destination, query, timeout).await,
            DohMethod::Get => doh::send_query_get(http, destination, query, timeout).await,
        },
    }
}
