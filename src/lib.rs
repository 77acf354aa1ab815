//! A client-side DNS resolution library: wire-format codec, per-type record
//! parsing, UDP and DNS-over-HTTPS transports, a server chain with health
//! tracking, and a TTL-aware cache, composed behind a single resolver core.
//!
//! This crate does not implement a recursive resolver, a DNS server, zone
//! transfers, dynamic updates, or DNSSEC cryptographic validation — only the
//! AD bit is surfaced, as reported by the upstream resolver.
pub mod cache;
pub mod chain;
pub mod config;
pub mod error;
pub mod events;
pub mod ip;
pub mod name;
pub mod records;
pub mod resolver;
pub mod stats;
pub mod transport;
pub mod wire;

pub use config::{BackoffStrategy, DnssecConfig, QueryOptions, ResolverConfig};
pub use error::{DNSError, DNSResult, Rcode};
pub use events::{Event, Observer};
pub use records::RData;
pub use resolver::{CacheStatsSnapshot, ResolvedAnswer, Resolver, StatsSnapshot};
pub use wire::QType;
