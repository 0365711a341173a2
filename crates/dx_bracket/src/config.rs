//! Compiler configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) yields a working
//! compiler. The file path can come from `DX_BRACKET_CONFIG`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{MemoConfig, TierConfig};
use crate::error::CompileError;
use crate::safety::{MatchBudget, SanitizerLimits};

pub const CONFIG_ENV_VAR: &str = "DX_BRACKET_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_parse")]
    pub parse: TierConfig,
    #[serde(default = "CacheConfig::default_generation")]
    pub generation: TierConfig,
    #[serde(default = "CacheConfig::default_rule")]
    pub rule: TierConfig,
    #[serde(default)]
    pub keys: MemoConfig,
    /// `None` disables the background sweep.
    #[serde(default = "CacheConfig::default_sweep_interval")]
    pub sweep_interval_ms: Option<u64>,
}

impl CacheConfig {
    fn default_parse() -> TierConfig {
        TierConfig::new(2_000, 300_000, 600_000)
    }
    fn default_generation() -> TierConfig {
        TierConfig::new(100, 60_000, 300_000)
    }
    fn default_rule() -> TierConfig {
        TierConfig::new(5_000, 600_000, 600_000)
    }
    fn default_sweep_interval() -> Option<u64> {
        Some(60_000)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            parse: Self::default_parse(),
            generation: Self::default_generation(),
            rule: Self::default_rule(),
            keys: MemoConfig::default(),
            sweep_interval_ms: Self::default_sweep_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherConfig {
    #[serde(default = "MatcherConfig::default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "MatcherConfig::default_max_length")]
    pub max_length: usize,
}

impl MatcherConfig {
    fn default_timeout() -> u64 {
        5
    }
    fn default_max_length() -> usize {
        500
    }

    pub fn budget(&self) -> MatchBudget {
        MatchBudget::new(Duration::from_millis(self.timeout_ms), self.max_length)
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Self::default_timeout(),
            max_length: Self::default_max_length(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub sanitizer: SanitizerLimits,
}

impl CompilerConfig {
    pub fn from_json_str(content: &str) -> Result<Self, CompileError> {
        let config: Self = serde_json::from_str(content).map_err(|e| CompileError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CompileError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Loads the file named by `DX_BRACKET_CONFIG`, or defaults when it is unset.
    pub fn from_env() -> Result<Self, CompileError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => {
                tracing::debug!(path = ?path, "loading compiler config");
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        let fraction = self.cache.keys.evict_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(CompileError::Config {
                message: format!("cache.keys.evict_fraction must be in (0, 1], got {fraction}"),
            });
        }
        if self.matcher.max_length == 0 {
            return Err(CompileError::Config {
                message: "matcher.max_length must be positive".into(),
            });
        }
        let ratio = self.sanitizer.obfuscation_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(CompileError::Config {
                message: format!("sanitizer.obfuscation_ratio must be in [0, 1], got {ratio}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(CompilerConfig::from_json_str("{}").unwrap(), CompilerConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = CompilerConfig::from_json_str(
            r#"{ "cache": { "parse": { "max_size": 10, "ttl_ms": 100, "max_idle_ms": 100 }, "sweep_interval_ms": null },
                 "matcher": { "timeout_ms": 20 } }"#,
        )
        .unwrap();
        assert_eq!(config.cache.parse.max_size, 10);
        assert_eq!(config.cache.rule, CacheConfig::default().rule);
        assert_eq!(config.cache.sweep_interval(), None);
        assert_eq!(config.matcher.timeout_ms, 20);
        assert_eq!(config.matcher.max_length, 500);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            CompilerConfig::from_json_str(r#"{ "cache": { "keys": { "evict_fraction": 0 } } }"#),
            Err(CompileError::Config { .. })
        ));
        assert!(CompilerConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = CompilerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CompileError::Io { .. }));
    }
}
