//! One bounded, TTL'd, LRU-ordered cache tier.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::lru::LruList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Zero disables the tier.
    pub max_size: usize,
    pub ttl_ms: u64,
    /// Entries not read for this long are dropped by `optimize`.
    pub max_idle_ms: u64,
}

impl TierConfig {
    pub const fn new(max_size: usize, ttl_ms: u64, max_idle_ms: u64) -> Self {
        Self {
            max_size,
            ttl_ms,
            max_idle_ms,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn max_idle(&self) -> Duration {
        Duration::from_millis(self.max_idle_ms)
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub timestamp: Duration,
    pub last_accessed: Duration,
    pub access_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub size: usize,
    pub max_size: usize,
}

impl TierStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct TierState<V> {
    entries: LruList<String, CacheEntry<V>>,
    stats: TierStats,
}

pub struct CacheTier<V> {
    name: &'static str,
    config: TierConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<TierState<V>>,
}

impl<V> std::fmt::Debug for CacheTier<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheTier")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("len", &self.state.lock().entries.len())
            .finish()
    }
}

impl<V: Clone> CacheTier<V> {
    pub fn new(name: &'static str, config: TierConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(name: &'static str, config: TierConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            config,
            clock,
            state: Mutex::new(TierState {
                entries: LruList::new(),
                stats: TierStats {
                    max_size: config.max_size,
                    ..TierStats::default()
                },
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> &TierConfig {
        &self.config
    }

    pub fn max_size(&self) -> usize {
        self.config.max_size
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let ttl = self.config.ttl();
        let mut state = self.state.lock();

        let expired = state
            .entries
            .peek(key)
            .map(|entry| now.saturating_sub(entry.timestamp) > ttl);
        match expired {
            None => {
                state.stats.misses += 1;
                return None;
            }
            Some(false) => {}
            Some(true) => {
                state.entries.remove(key);
                state.stats.expirations += 1;
                state.stats.misses += 1;
                tracing::debug!(tier = self.name, key, "cache entry expired");
                return None;
            }
        }

        let value = state.entries.get_mut(key).map(|entry| {
            entry.last_accessed = now;
            entry.access_count += 1;
            entry.value.clone()
        });
        state.stats.hits += 1;
        value
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        if self.config.max_size == 0 {
            return;
        }
        let now = self.clock.now();
        let key = key.into();
        let mut state = self.state.lock();

        if !state.entries.contains(key.as_str()) {
            while state.entries.len() >= self.config.max_size {
                match state.entries.pop_lru() {
                    Some((evicted, _)) => {
                        state.stats.evictions += 1;
                        tracing::trace!(tier = self.name, key = %evicted, "evicted lru entry");
                    }
                    None => break,
                }
            }
        }
        state.entries.insert(
            key,
            CacheEntry {
                value,
                timestamp: now,
                last_accessed: now,
                access_count: 0,
            },
        );
        state.stats.insertions += 1;
    }

    /// Presence check that honors TTL but does not count as an access.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        let state = self.state.lock();
        state
            .entries
            .peek(key)
            .is_some_and(|entry| now.saturating_sub(entry.timestamp) <= self.config.ttl())
    }

    pub fn delete(&self, key: &str) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Access count of a live entry, without touching it.
    pub fn access_count(&self, key: &str) -> Option<u64> {
        self.state
            .lock()
            .entries
            .peek(key)
            .map(|entry| entry.access_count)
    }

    /// Drops expired and idle entries. Returns how many were removed.
    pub fn optimize(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.ttl();
        let max_idle = self.config.max_idle();
        let mut state = self.state.lock();
        let removed = state.entries.retain(|_, entry| {
            now.saturating_sub(entry.timestamp) <= ttl && now.saturating_sub(entry.last_accessed) <= max_idle
        });
        state.stats.expirations += removed as u64;
        if removed > 0 {
            tracing::debug!(tier = self.name, removed, "optimized cache tier");
        }
        removed
    }

    pub fn stats(&self) -> TierStats {
        let state = self.state.lock();
        TierStats {
            size: state.entries.len(),
            ..state.stats
        }
    }
}
