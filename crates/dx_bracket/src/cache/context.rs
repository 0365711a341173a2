use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use super::clock::{Clock, SystemClock};
use super::memo::{KeyMemoizer, MemoStats};
use super::sweeper::Sweeper;
use super::tier::{CacheTier, TierStats};
use crate::compiler::GenerationOutput;
use crate::config::CacheConfig;
use crate::error::Rejection;
use crate::rule::CssRule;
use crate::syntax::ParsedClass;

/// Cached outcome of the per-token pipeline; rejections are cached too.
pub type ParseOutcome = Result<Arc<ParsedClass>, Rejection>;

#[derive(Debug)]
pub struct CacheTiers {
    pub parse: CacheTier<ParseOutcome>,
    pub generation: CacheTier<Arc<GenerationOutput>>,
    pub rule: CacheTier<Arc<CssRule>>,
    pub keys: KeyMemoizer,
}

impl CacheTiers {
    fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            parse: CacheTier::with_clock("parse", config.parse, clock.clone()),
            generation: CacheTier::with_clock("generation", config.generation, clock.clone()),
            rule: CacheTier::with_clock("rule", config.rule, clock),
            keys: KeyMemoizer::new(config.keys),
        }
    }

    /// One maintenance pass over every tier and the memoizer.
    pub fn optimize(&self) -> usize {
        self.parse.optimize() + self.generation.optimize() + self.rule.optimize() + self.keys.optimize()
    }

    pub fn clear(&self) {
        self.parse.clear();
        self.generation.clear();
        self.rule.clear();
        self.keys.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub parse: TierStats,
    pub generation: TierStats,
    pub rule: TierStats,
    pub keys: MemoStats,
}

/// Owns the cache tiers and the optional background sweeper.
pub struct CacheContext {
    tiers: Arc<CacheTiers>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl CacheContext {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            tiers: Arc::new(CacheTiers::new(config, clock)),
            sweeper: Mutex::new(None),
        }
    }

    pub fn tiers(&self) -> &CacheTiers {
        &self.tiers
    }

    pub fn parse(&self) -> &CacheTier<ParseOutcome> {
        &self.tiers.parse
    }

    pub fn generation(&self) -> &CacheTier<Arc<GenerationOutput>> {
        &self.tiers.generation
    }

    pub fn rule(&self) -> &CacheTier<Arc<CssRule>> {
        &self.tiers.rule
    }

    pub fn keys(&self) -> &KeyMemoizer {
        &self.tiers.keys
    }

    /// Starts (or restarts) the periodic sweep.
    pub fn start_sweeper(&self, interval: Duration) -> io::Result<()> {
        let mut slot = self.sweeper.lock();
        if let Some(mut previous) = slot.take() {
            previous.stop();
        }
        let tiers = Arc::clone(&self.tiers);
        *slot = Some(Sweeper::spawn(interval, move || {
            let removed = tiers.optimize();
            if removed > 0 {
                tracing::debug!(removed, "sweeper removed stale cache entries");
            }
        })?);
        tracing::debug!(interval_ms = interval.as_millis() as u64, "started cache sweeper");
        Ok(())
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().as_ref().is_some_and(Sweeper::is_running)
    }

    pub fn optimize(&self) -> usize {
        self.tiers.optimize()
    }

    pub fn clear(&self) {
        self.tiers.clear();
    }

    /// Stops the sweeper. The tiers stay usable.
    pub fn shutdown(&self) {
        if let Some(mut sweeper) = self.sweeper.lock().take() {
            sweeper.stop();
            tracing::debug!("stopped cache sweeper");
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            parse: self.tiers.parse.stats(),
            generation: self.tiers.generation.stats(),
            rule: self.tiers.rule.stats(),
            keys: self.tiers.keys.stats(),
        }
    }
}

impl Drop for CacheContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::error::RejectionKind;

    #[test]
    fn test_sweeper_lifecycle() {
        let context = CacheContext::new(&CacheConfig::default());
        context.start_sweeper(Duration::from_millis(10)).unwrap();
        assert!(context.is_sweeping());
        context.start_sweeper(Duration::from_millis(20)).unwrap();
        assert!(context.is_sweeping());
        context.shutdown();
        assert!(!context.is_sweeping());
        context.shutdown();
    }

    #[test]
    fn test_optimize_and_clear_cover_every_tier() {
        let clock = Arc::new(ManualClock::new());
        let context = CacheContext::with_clock(&CacheConfig::default(), clock.clone());
        context
            .parse()
            .set("p-[x]", Err(Rejection::new("p-[x]", RejectionKind::InvalidCssValue, "bad")));
        context.keys().parse_key("p-[x]");
        assert_eq!(context.stats().parse.size, 1);

        clock.advance(Duration::from_secs(24 * 3600));
        assert!(context.optimize() >= 1);
        assert_eq!(context.stats().parse.size, 0);

        context.parse().set("p-[y]", Err(Rejection::new("p-[y]", RejectionKind::InvalidCssValue, "bad")));
        context.clear();
        let stats = context.stats();
        assert_eq!(stats.parse.size + stats.rule.size + stats.generation.size + stats.keys.size, 0);
    }
}
