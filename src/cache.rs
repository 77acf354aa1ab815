//! TTL-aware, size-bounded, LRU-evicted response cache (component C8).
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::records::RData;
use crate::wire::QType;

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_size: usize,
    pub respect_ttl: bool,
    pub min_ttl: u64,
    pub max_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            max_size: 1000,
            respect_ttl: true,
            min_ttl: 60,
            max_ttl: 86400,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<RData>,
    ttl: u32,
    created_at: Instant,
    expires_at: Instant,
}

/// `(name, type)` keyed cache, bounded by `max_size` and evicted by
/// least-recently-used order (spec section 4.6). Access order is tracked
/// with an explicit list updated on both `get` hits and `set`, rather than
/// relying on map iteration order.
#[derive(Debug)]
pub struct Cache {
    config: CacheConfig,
    entries: HashMap<String, CacheEntry>,
    /// Front = least recently used, back = most recently used.
    access_order: VecDeque<String>,
    stats: CacheStats,
}

fn cache_key(name: &str, qtype: QType) -> String {
    format!("{}:{}", name.to_ascii_lowercase(), qtype)
}

impl Cache {
    pub fn new(config: CacheConfig) -> Self {
        Cache {
            config,
            entries: HashMap::new(),
            access_order: VecDeque::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        self.access_order.push_back(key.to_string());
    }

    /// Look up `(name, type)`. Returns the cached records and their
    /// originally-stored TTL iff an entry exists and has not expired;
    /// otherwise removes any expired entry and returns `None`.
    pub fn get(&mut self, name: &str, qtype: QType) -> Option<(Vec<RData>, u32)> {
        let key = cache_key(name, qtype);

        let expired = match self.entries.get(&key) {
            Some(entry) => Instant::now() >= entry.expires_at,
            None => {
                self.stats.misses += 1;
                return None;
            }
        };

        if expired {
            self.entries.remove(&key);
            if let Some(pos) = self.access_order.iter().position(|k| k == &key) {
                self.access_order.remove(pos);
            }
            self.stats.misses += 1;
            return None;
        }

        self.touch(&key);
        self.stats.hits += 1;
        let entry = self.entries.get(&key).unwrap();
        Some((entry.records.clone(), entry.ttl))
    }

    /// Upsert `(name, type) -> records` with an expiry computed from `ttl`
    /// per spec section 3: `clamp(ttl, min_ttl, max_ttl)` when `respect_ttl`
    /// is set, else always `max_ttl`. Evicts the least-recently-used entry
    /// if this insert would exceed `max_size` and the key is new.
    pub fn set(&mut self, name: &str, qtype: QType, records: Vec<RData>, ttl: u32) {
        if !self.config.enabled {
            return;
        }

        let key = cache_key(name, qtype);
        let is_new_key = !self.entries.contains_key(&key);

        if is_new_key && self.entries.len() >= self.config.max_size {
            if let Some(lru_key) = self.access_order.pop_front() {
                self.entries.remove(&lru_key);
                self.stats.evictions += 1;
            }
        }

        let stored_ttl_secs = if self.config.respect_ttl {
            (ttl as u64).clamp(self.config.min_ttl, self.config.max_ttl)
        } else {
            self.config.max_ttl
        };

        let created_at = Instant::now();
        let entry = CacheEntry {
            records,
            ttl,
            created_at,
            expires_at: created_at + Duration::from_secs(stored_ttl_secs),
        };

        self.entries.insert(key.clone(), entry);
        self.touch(&key);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.access_order.clear();
    }

    pub fn clear_name(&mut self, name: &str) {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.entries.retain(|k, _| !k.starts_with(&prefix));
        self.access_order.retain(|k| !k.starts_with(&prefix));
    }

    pub fn clear_name_type(&mut self, name: &str, qtype: QType) {
        let key = cache_key(name, qtype);
        self.entries.remove(&key);
        if let Some(pos) = self.access_order.iter().position(|k| k == &key) {
            self.access_order.remove(pos);
        }
    }

    /// Sweep and remove all currently expired entries, returning the count
    /// removed.
    pub fn clean(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| now >= entry.expires_at)
            .map(|(k, _)| k.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            if let Some(pos) = self.access_order.iter().position(|k| k == key) {
                self.access_order.remove(pos);
            }
        }

        expired_keys.len()
    }
}
