//! Resolver configuration (spec section 4.7) — a plain struct with
//! `Default` impls matching every documented default. No file, environment
//! or CLI parsing: spec section 6 states this library has no persistent
//! state, so configuration is always constructed programmatically.
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::chain::RotationStrategy;
use crate::transport::TransportKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    Exponential,
    Linear,
    Constant,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Exponential
    }
}

impl BackoffStrategy {
    /// The delay before retry attempt `attempt` (0-based, the attempt that
    /// just failed), per spec section 4.7.
    pub fn delay(self, base: Duration, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Exponential => base.saturating_mul(1u32.wrapping_shl(attempt).max(1)),
            BackoffStrategy::Linear => base.saturating_mul(attempt + 1),
            BackoffStrategy::Constant => base,
        }
    }
}

/// Which HTTP form C6 sends a query as (spec section 4.4): POST with the
/// raw wire bytes as the body, or the alternate GET form with the query
/// base64url-encoded into a `dns` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DohMethod {
    Post,
    Get,
}

impl Default for DohMethod {
    fn default() -> Self {
        DohMethod::Post
    }
}

/// DNSSEC handling is limited to the AD-bit observation hook (spec section
/// 9) — `require_valid` and `trust_anchors` are accepted for configuration
/// parity with the source but are not consulted by any validation logic,
/// since cryptographic validation is explicitly out of scope.
#[derive(Debug, Clone, Default)]
pub struct DnssecConfig {
    pub enabled: bool,
    pub require_valid: bool,
    pub trust_anchors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub servers: Vec<String>,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub retry_backoff: BackoffStrategy,
    pub transport: TransportKind,
    /// The DoH endpoint URL, required when `transport` is `Doh`.
    pub doh_server: Option<String>,
    pub doh_method: DohMethod,
    pub cache: CacheConfig,
    pub dnssec: DnssecConfig,
    pub rotation_strategy: RotationStrategy,
    pub health_check: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            servers: vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()],
            timeout: Duration::from_millis(5000),
            retries: 2,
            retry_delay: Duration::from_millis(100),
            retry_backoff: BackoffStrategy::default(),
            transport: TransportKind::Udp,
            doh_server: None,
            doh_method: DohMethod::default(),
            cache: CacheConfig::default(),
            dnssec: DnssecConfig::default(),
            rotation_strategy: RotationStrategy::default(),
            health_check: false,
        }
    }
}

/// Per-query overrides (spec section 6 `opts`).
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub timeout: Option<Duration>,
    pub no_cache: bool,
    pub dnssec: bool,
    pub sort_srv: bool,
}
