//! Frequency-aware memoization of cache keys.
//!
//! Building a generation key means sorting and deduplicating the class list, normalizing the
//! options to key-sorted JSON and hashing the result. The memo table maps a 128-bit
//! fingerprint of the *raw* inputs to the finished key so repeat calls skip all of that.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;
use xxhash_rust::xxh3::{Xxh3, xxh3_64};

use crate::options::GenerationOptions;

const SEPARATOR: &[u8] = &[0x1f];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoConfig {
    #[serde(default = "MemoConfig::default_max_entries")]
    pub max_entries: usize,
    /// Share of entries dropped when the table is full.
    #[serde(default = "MemoConfig::default_evict_fraction")]
    pub evict_fraction: f64,
}

impl MemoConfig {
    fn default_max_entries() -> usize {
        1_000
    }
    fn default_evict_fraction() -> f64 {
        0.25
    }
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            max_entries: Self::default_max_entries(),
            evict_fraction: Self::default_evict_fraction(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

#[derive(Debug)]
struct MemoEntry {
    key: Arc<str>,
    hits: u64,
}

#[derive(Debug, Default)]
struct MemoState {
    entries: AHashMap<u128, MemoEntry>,
    stats: MemoStats,
}

#[derive(Debug)]
pub struct KeyMemoizer {
    config: MemoConfig,
    state: Mutex<MemoState>,
}

impl Default for KeyMemoizer {
    fn default() -> Self {
        Self::new(MemoConfig::default())
    }
}

enum KeyKind {
    Parse,
    Generation,
    Rule,
}

impl KeyKind {
    fn tag(&self) -> &'static [u8] {
        match self {
            KeyKind::Parse => b"parse",
            KeyKind::Generation => b"gen",
            KeyKind::Rule => b"rule",
        }
    }
}

impl KeyMemoizer {
    pub fn new(config: MemoConfig) -> Self {
        Self {
            config,
            state: Mutex::new(MemoState::default()),
        }
    }

    pub fn parse_key(&self, token: &str) -> Arc<str> {
        let fingerprint = fingerprint(KeyKind::Parse, [token.as_bytes()]);
        self.memoize(fingerprint, || format!("parse:{token}"))
    }

    /// Order-insensitive over `classes`; duplicates collapse.
    pub fn generation_key<S: AsRef<str>>(&self, classes: &[S], options: &GenerationOptions) -> Arc<str> {
        let options_json = canonical_json(&options_value(options));
        let fingerprint = fingerprint(
            KeyKind::Generation,
            classes
                .iter()
                .map(|c| c.as_ref().as_bytes())
                .chain(std::iter::once(options_json.as_bytes())),
        );
        self.memoize(fingerprint, || build_generation_key(classes, options))
    }

    pub fn rule_key(&self, selector: &str, media: Option<&str>, declaration_string: &str) -> Arc<str> {
        let media = media.unwrap_or("");
        let parts = [selector.as_bytes(), media.as_bytes(), declaration_string.as_bytes()];
        let fingerprint = fingerprint(KeyKind::Rule, parts);
        self.memoize(fingerprint, || {
            format!("rule:{:016x}", xxh3_64(&parts.join(SEPARATOR)))
        })
    }

    /// Drops rarely used keys: those below `total_hits / (live_keys * 10)`.
    pub fn optimize(&self) -> usize {
        let mut state = self.state.lock();
        let live = state.entries.len();
        if live == 0 {
            return 0;
        }
        let total: u64 = state.entries.values().map(|e| e.hits).sum();
        let threshold = total as f64 / (live as f64 * 10.0);
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.hits as f64 >= threshold);
        let removed = before - state.entries.len();
        if removed > 0 {
            tracing::debug!(removed, threshold, "optimized key memo");
        }
        removed
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

    pub fn stats(&self) -> MemoStats {
        let state = self.state.lock();
        MemoStats {
            size: state.entries.len(),
            ..state.stats
        }
    }

    fn memoize(&self, fingerprint: u128, build: impl FnOnce() -> String) -> Arc<str> {
        {
            let mut state = self.state.lock();
            if let Some(entry) = state.entries.get_mut(&fingerprint) {
                entry.hits += 1;
                let key = entry.key.clone();
                state.stats.hits += 1;
                return key;
            }
            state.stats.misses += 1;
        }

        // Built outside the lock.
        let key: Arc<str> = Arc::from(build());

        let mut state = self.state.lock();
        if !state.entries.contains_key(&fingerprint) && state.entries.len() >= self.config.max_entries {
            self.evict_batch(&mut state);
        }
        if self.config.max_entries > 0 {
            state.entries.entry(fingerprint).or_insert_with(|| MemoEntry {
                key: key.clone(),
                hits: 0,
            });
        }
        key
    }

    fn evict_batch(&self, state: &mut MemoState) {
        let len = state.entries.len();
        let batch = ((len as f64 * self.config.evict_fraction).ceil() as usize).clamp(1, len.max(1));
        let mut ranked: Vec<(u64, u128)> = state.entries.iter().map(|(fp, e)| (e.hits, *fp)).collect();
        ranked.sort_unstable();
        for (_, fingerprint) in ranked.into_iter().take(batch) {
            state.entries.remove(&fingerprint);
        }
        state.stats.evictions += batch.min(len) as u64;
        tracing::debug!(evicted = batch, "key memo full, evicted least-used batch");
    }
}

fn fingerprint<'a>(kind: KeyKind, parts: impl IntoIterator<Item = &'a [u8]>) -> u128 {
    let mut hasher = Xxh3::new();
    hasher.update(kind.tag());
    for part in parts {
        hasher.update(SEPARATOR);
        hasher.update(part);
    }
    hasher.digest128()
}

fn build_generation_key<S: AsRef<str>>(classes: &[S], options: &GenerationOptions) -> String {
    let mut unique: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
    unique.sort_unstable();
    unique.dedup();

    let options = canonical_json(&options_value(options));
    let mut material = unique.join("\u{1f}");
    material.push('\u{1e}');
    material.push_str(&options);
    format!("gen:{:016x}:{}", xxh3_64(material.as_bytes()), unique.len())
}

fn options_value(options: &GenerationOptions) -> serde_json::Value {
    match serde_json::to_value(options) {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, "generation options failed to serialize; keying on null");
            serde_json::Value::Null
        }
    }
}

/// Serializes with object keys sorted at every depth.
pub fn canonical_json(value: &serde_json::Value) -> String {
    fn sorted(value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::Object(map) => {
                let ordered: BTreeMap<&String, serde_json::Value> =
                    map.iter().map(|(k, v)| (k, sorted(v))).collect();
                serde_json::Value::Object(ordered.into_iter().map(|(k, v)| (k.clone(), v)).collect())
            }
            serde_json::Value::Array(items) => serde_json::Value::Array(items.iter().map(sorted).collect()),
            other => other.clone(),
        }
    }
    sorted(value).to_string()
}
