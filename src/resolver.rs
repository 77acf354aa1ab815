//! Resolver core (component C9): the single `resolve` entry point that
//! ties the domain validator (C1), wire codec (C3), record parsers (C4),
//! transports (C5/C6), server chain (C7) and cache (C8) together, per the
//! state machine in spec section 4.7.
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::cache::Cache;
use crate::chain::ServerChain;
use crate::config::{QueryOptions, ResolverConfig};
use crate::error::{DNSError, DNSResult, Rcode};
use crate::events::{Event, Observer};
use crate::ip::{parse_ipv4, reverse_ipv4, reverse_ipv6};
use crate::name;
use crate::records::{self, RData};
use crate::stats::ResolverStats;
use crate::transport::{self, TransportKind};
use crate::wire::{self, QType};

/// The result of a single successful `resolve` call (spec section 6).
#[derive(Debug, Clone)]
pub struct ResolvedAnswer {
    pub records: Vec<RData>,
    pub ttl: u32,
    pub cached: bool,
    pub duration: Duration,
    pub resolver: String,
}

#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    pub average_duration_millis: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub hit_rate: f64,
}

/// A DNS resolver bound to a server chain, a cache and a transport. Safe to
/// share across tasks: every mutable piece of state is behind a `Mutex`, none
/// of which is held across an `.await` point (spec section 5 — concurrent
/// resolves only ever serialize on the short, synchronous state updates).
pub struct Resolver {
    config: ResolverConfig,
    chain: Mutex<ServerChain>,
    cache: Mutex<Cache>,
    stats: Mutex<ResolverStats>,
    id_counter: AtomicU16,
    http: reqwest::Client,
    observers: Mutex<Vec<Arc<dyn Observer>>>,
    destroyed: AtomicBool,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> DNSResult<Self> {
        let chain = ServerChain::new(config.servers.clone(), config.rotation_strategy)?;
        let cache = Cache::new(config.cache);
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| DNSError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Resolver {
            config,
            chain: Mutex::new(chain),
            cache: Mutex::new(cache),
            stats: Mutex::new(ResolverStats::default()),
            id_counter: AtomicU16::new(rand::random()),
            http,
            observers: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        })
    }

    pub fn register_observer(&self, observer: Arc<dyn Observer>) {
        self.observers.lock().unwrap().push(observer);
    }

    fn emit(&self, event: Event) {
        for observer in self.observers.lock().unwrap().iter() {
            observer.on_event(&event);
        }
    }

    fn next_id(&self) -> u16 {
        self.id_counter.fetch_add(1, Ordering::Relaxed)
    }

    fn destination(&self, server: &str) -> String {
        if self.config.transport == TransportKind::Doh {
            return self.config.doh_server.clone().unwrap_or_else(|| server.to_string());
        }
        // a server entry may already carry an explicit port (tests, or a
        // non-standard-port resolver); otherwise assume the standard port.
        if server.parse::<std::net::SocketAddr>().is_ok() {
            server.to_string()
        } else if server.contains(':') {
            format!("[{}]:53", server)
        } else {
            format!("{}:53", server)
        }
    }

    /// Resolve `name` for `qtype`, per the full state machine of spec
    /// section 4.7: validate, consult the cache, then dispatch over the
    /// server chain with retry/backoff until a terminal success or error.
    pub async fn resolve(&self, input_name: &str, qtype: QType, opts: QueryOptions) -> DNSResult<ResolvedAnswer> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(DNSError::Destroyed);
        }

        let normalized = name::validate(input_name)?;

        self.stats.lock().unwrap().record_start();
        let started = Instant::now();

        self.emit(Event::Query {
            name: normalized.clone(),
            qtype,
        });

        let use_cache = self.config.cache.enabled && !opts.no_cache;

        if use_cache {
            let hit = self.cache.lock().unwrap().get(&normalized, qtype);
            if let Some((mut records, ttl)) = hit {
                self.emit(Event::CacheHit {
                    name: normalized.clone(),
                    qtype,
                });
                if opts.sort_srv {
                    records::sort_srv(&mut records);
                }
                let duration = started.elapsed();
                self.stats.lock().unwrap().record_success(duration);
                return Ok(ResolvedAnswer {
                    records,
                    ttl,
                    cached: true,
                    duration,
                    resolver: "<cache>".to_string(),
                });
            }
            self.emit(Event::CacheMiss {
                name: normalized.clone(),
                qtype,
            });
        }

        let attempts = self.config.retries + 1;
        let mut last_error: Option<DNSError> = None;

        for attempt in 0..attempts {
            if self.destroyed.load(Ordering::Acquire) {
                last_error = Some(DNSError::Destroyed);
                break;
            }

            let server = self.chain.lock().unwrap().next_server();
            let destination = self.destination(&server);
            let id = self.next_id();

            match self.attempt_once(&normalized, qtype, id, &server, &destination, opts.timeout).await {
                Ok((mut parsed_records, ttl, authentic_data)) => {
                    let duration = started.elapsed();

                    if opts.sort_srv {
                        records::sort_srv(&mut parsed_records);
                    }

                    if use_cache {
                        self.cache.lock().unwrap().set(&normalized, qtype, parsed_records.clone(), ttl);
                    }

                    self.stats.lock().unwrap().record_success(duration);

                    self.emit(Event::ParsedResponse {
                        name: normalized.clone(),
                        qtype,
                        ttl,
                        cached: false,
                    });

                    if opts.dnssec {
                        self.emit(Event::DnssecValidated {
                            name: normalized.clone(),
                            authentic_data,
                        });
                    }

                    return Ok(ResolvedAnswer {
                        records: parsed_records,
                        ttl,
                        cached: false,
                        duration,
                        resolver: server,
                    });
                }
                Err(err) => {
                    self.chain.lock().unwrap().mark_failed(&server);

                    let attempts_remain = attempt + 1 < attempts;
                    if err.is_retriable() && attempts_remain {
                        self.emit(Event::Retry {
                            attempt: attempt + 1,
                            server: server.clone(),
                            reason: err.to_string(),
                        });
                        let delay = self.config.retry_backoff.delay(self.config.retry_delay, attempt);
                        tokio::time::sleep(delay).await;
                        last_error = Some(err);
                        continue;
                    }

                    last_error = Some(err);
                    break;
                }
            }
        }

        let duration = started.elapsed();
        self.stats.lock().unwrap().record_failure(duration);

        let err = last_error.unwrap_or_else(|| DNSError::parse("resolve failed with no recorded error"));
        self.emit(Event::Error {
            domain: normalized,
            qtype,
            message: err.to_string(),
        });

        Err(err)
    }

    async fn attempt_once(
        &self,
        name: &str,
        qtype: QType,
        id: u16,
        server: &str,
        destination: &str,
        per_query_timeout: Option<Duration>,
    ) -> DNSResult<(Vec<RData>, u32, bool)> {
        let timeout = per_query_timeout.unwrap_or(self.config.timeout);

        let query = wire::encode_query(id, name, qtype, true)?;
        let response_bytes = transport::dispatch(
            self.config.transport,
            destination,
            &query,
            timeout,
            &self.http,
            self.config.doh_method,
        )
        .await?;

        self.emit(Event::Response {
            server: server.to_string(),
            bytes: response_bytes.len(),
        });

        let message = wire::decode_response(&response_bytes)?;

        if message.header.id != id {
            return Err(DNSError::parse("response transaction id does not match the query"));
        }

        let rcode = message.header.flags.rcode();
        if rcode != 0 {
            return Err(DNSError::Protocol {
                domain: name.to_string(),
                rcode: Rcode::from(rcode),
            });
        }

        let mut parsed_records = Vec::new();
        for answer in message.answers.iter().filter(|r| r.rtype == qtype) {
            parsed_records.push(records::parse(&response_bytes, answer)?);
        }

        let ttl = records::min_ttl(&message);

        Ok((parsed_records, ttl, message.header.flags.is_authentic_data()))
    }

    /// Resolve the PTR name for `ip` and return its first answer, per spec
    /// section 4.7 `reverse`.
    pub async fn reverse(&self, ip: &str) -> DNSResult<String> {
        let answers = self.reverse_all(ip).await?;
        answers
            .into_iter()
            .next()
            .ok_or_else(|| DNSError::parse("PTR lookup returned no records"))
    }

    /// Resolve the PTR name for `ip` and return every answer.
    pub async fn reverse_all(&self, ip: &str) -> DNSResult<Vec<String>> {
        let ptr_name = if parse_ipv4(ip).is_ok() {
            reverse_ipv4(ip)?
        } else {
            reverse_ipv6(ip)?
        };

        let answer = self.resolve(&ptr_name, QType::PTR, QueryOptions::default()).await?;
        Ok(answer
            .records
            .into_iter()
            .filter_map(|r| match r {
                RData::Ptr(name) => Some(name),
                _ => None,
            })
            .collect())
    }

    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear_all();
    }

    pub fn clear_cache_name(&self, name: &str) {
        self.cache.lock().unwrap().clear_name(name);
    }

    pub fn clear_cache_name_type(&self, name: &str, qtype: QType) {
        self.cache.lock().unwrap().clear_name_type(name, qtype);
    }

    /// Sweep expired cache entries and return the count removed (spec's
    /// "supplemented features" cache `clean()`, not part of the core §6
    /// surface but exposed here so the sweep is actually reachable).
    pub fn clean_cache(&self) -> usize {
        self.cache.lock().unwrap().clean()
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        let cache = self.cache.lock().unwrap();
        let stats = cache.stats();
        CacheStatsSnapshot {
            hits: stats.hits,
            misses: stats.misses,
            size: cache.size(),
            hit_rate: stats.hit_rate(),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        let stats = self.stats.lock().unwrap();
        StatsSnapshot {
            total_queries: stats.total_queries,
            successful_queries: stats.successful_queries,
            failed_queries: stats.failed_queries,
            average_duration_millis: stats.average_duration_millis(),
        }
    }

    pub fn servers(&self) -> Vec<String> {
        self.chain.lock().unwrap().list()
    }

    pub fn add_server(&self, address: &str) -> DNSResult<()> {
        self.chain.lock().unwrap().add(address)
    }

    pub fn remove_server(&self, address: &str) {
        self.chain.lock().unwrap().remove(address);
    }

    /// Tear the resolver down. Idempotent: subsequent `resolve` calls return
    /// `DNSError::Destroyed`; repeated calls to `destroy` are a no-op.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::Release);
    }
}
