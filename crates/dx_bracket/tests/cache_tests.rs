//! Cache behavior observed through the public API: expiry, eviction, memoization and the sweeper.

use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dx_bracket::cache::{CacheContext, CacheTier, KeyMemoizer, ManualClock, MemoConfig, TierConfig};
use dx_bracket::{CacheConfig, ClassCompiler, CompileError, CompilerConfig, GenerationOptions, Tables};
use pretty_assertions::assert_eq;

fn compiler_with_clock(clock: Arc<ManualClock>) -> ClassCompiler {
    let mut config = CompilerConfig::default();
    config.cache.sweep_interval_ms = None;
    ClassCompiler::with_parts(config, Tables::default(), clock).expect("default compiler should build")
}

#[test]
fn test_ttl_boundary() {
    let clock = Arc::new(ManualClock::new());
    let tier: CacheTier<&'static str> =
        CacheTier::with_clock("ttl", TierConfig::new(10, 1_000, 10_000), clock.clone());

    tier.set("k", "v");
    clock.advance(Duration::from_millis(999));
    assert_eq!(tier.get("k"), Some("v"));

    // A hit does not extend the lifetime.
    clock.advance(Duration::from_millis(2));
    assert_eq!(tier.get("k"), None);
    assert!(!tier.has("k"));
}

#[test]
fn test_least_recently_used_goes_first() {
    let tier: CacheTier<u32> =
        CacheTier::with_clock("lru", TierConfig::new(3, 60_000, 60_000), Arc::new(ManualClock::new()));
    for (key, value) in [("a", 1), ("b", 2), ("c", 3)] {
        tier.set(key, value);
    }
    tier.get("a");
    tier.set("d", 4);
    tier.set("e", 5);

    assert!(tier.has("a"));
    assert!(!tier.has("b"));
    assert!(!tier.has("c"));
    assert!(tier.has("d") && tier.has("e"));
    assert_eq!(tier.stats().evictions, 2);
}

#[test]
fn test_parse_results_expire_with_the_clock() {
    let clock = Arc::new(ManualClock::new());
    let compiler = compiler_with_clock(clock.clone());

    compiler.compile_class("p-[24px]").unwrap();
    compiler.compile_class("p-[24px]").unwrap();
    assert_eq!(compiler.cache_stats().parse.hits, 1);

    clock.advance(Duration::from_millis(CacheConfig::default().parse.ttl_ms + 1));
    compiler.compile_class("p-[24px]").unwrap();
    let stats = compiler.cache_stats().parse;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.expirations, 1);
}

#[test]
fn test_generation_cache_is_keyed_on_options() {
    let compiler = compiler_with_clock(Arc::new(ManualClock::new()));
    let pretty = GenerationOptions::default();
    let minified = GenerationOptions {
        minify: true,
        ..GenerationOptions::default()
    };

    let a = compiler.generate("p-[1px] m-[2px]", &pretty).unwrap();
    let b = compiler.generate("p-[1px] m-[2px]", &minified).unwrap();
    let c = compiler.generate("m-[2px] p-[1px]", &pretty).unwrap();

    assert!(!a.stats.from_cache);
    assert!(!b.stats.from_cache);
    assert!(c.stats.from_cache);
    assert_ne!(a.css, b.css);
    assert_eq!(compiler.cache_stats().generation.size, 2);
    assert!(compiler.cache_stats().rule.size >= 2);
}

#[test]
fn test_memo_batch_eviction_keeps_hot_keys() {
    let memo = KeyMemoizer::new(MemoConfig {
        max_entries: 8,
        evict_fraction: 0.25,
    });
    for _ in 0..5 {
        memo.parse_key("hot");
    }
    for idx in 0..7 {
        memo.parse_key(&format!("cold-{idx}"));
    }
    memo.parse_key("overflow");

    let stats = memo.stats();
    assert_eq!(stats.evictions, 2);
    assert_eq!(stats.size, 7);

    let hits = memo.stats().hits;
    memo.parse_key("hot");
    assert_eq!(memo.stats().hits, hits + 1);
}

#[test]
fn test_sweeper_purges_and_shuts_down() {
    let clock = Arc::new(ManualClock::new());
    let context = CacheContext::with_clock(&CacheConfig::default(), clock.clone());
    context.generation().set("gen:probe", Arc::default());

    clock.advance(Duration::from_secs(3_600));
    context.start_sweeper(Duration::from_millis(5)).unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while context.stats().generation.size > 0 && std::time::Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(context.stats().generation.size, 0);

    context.shutdown();
    assert!(!context.is_sweeping());
}

#[test]
fn test_config_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "cache": {{ "rule": {{ "max_size": 1, "ttl_ms": 50, "max_idle_ms": 50 }}, "sweep_interval_ms": null }},
             "sanitizer": {{ "max_class_length": 40 }} }}"#
    )
    .unwrap();

    let config = CompilerConfig::load(file.path()).unwrap();
    assert_eq!(config.cache.rule.max_size, 1);
    assert_eq!(config.cache.sweep_interval(), None);
    assert_eq!(config.sanitizer.max_class_length, 40);
    assert_eq!(config.sanitizer.max_value_length, 200);

    let compiler = ClassCompiler::new(config).unwrap();
    let long = format!("p-[{}px]", "1".repeat(60));
    assert!(compiler.compile_class(&long).is_err());
}

#[test]
fn test_bad_config_file_is_a_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ \"matcher\": {{ \"max_length\": 0 }} }}").unwrap();
    assert!(matches!(CompilerConfig::load(file.path()), Err(CompileError::Config { .. })));
}
