//! Character-level cleaning of class tokens and bracket values.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    ClassToken,
    Value,
}

fn default_max_class_length() -> usize {
    500
}

fn default_max_value_length() -> usize {
    200
}

fn default_obfuscation_ratio() -> f64 {
    0.5
}

fn default_obfuscation_min_length() -> usize {
    20
}

/// Length ceilings and the obfuscation heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SanitizerLimits {
    #[serde(default = "default_max_class_length")]
    pub max_class_length: usize,
    #[serde(default = "default_max_value_length")]
    pub max_value_length: usize,
    /// Share of stripped characters above which a long input counts as obfuscated.
    #[serde(default = "default_obfuscation_ratio")]
    pub obfuscation_ratio: f64,
    #[serde(default = "default_obfuscation_min_length")]
    pub obfuscation_min_length: usize,
}

impl Default for SanitizerLimits {
    fn default() -> Self {
        Self {
            max_class_length: default_max_class_length(),
            max_value_length: default_max_value_length(),
            obfuscation_ratio: default_obfuscation_ratio(),
            obfuscation_min_length: default_obfuscation_min_length(),
        }
    }
}

impl SanitizerLimits {
    pub fn max_length(&self, kind: InputKind) -> usize {
        match kind {
            InputKind::ClassToken => self.max_class_length,
            InputKind::Value => self.max_value_length,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    limits: SanitizerLimits,
}

impl Sanitizer {
    pub fn new(limits: SanitizerLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SanitizerLimits {
        &self.limits
    }

    /// Strips control and invisible characters, collapses whitespace and trims.
    ///
    /// Returns `None` for over-long input, for input that cleans down to nothing, and for long
    /// input where more than the configured share of characters had to be stripped.
    pub fn sanitize(&self, input: &str, kind: InputKind) -> Option<String> {
        let original_len = input.chars().count();
        let max = self.limits.max_length(kind);
        if original_len > max {
            debug!(len = original_len, max, ?kind, "input exceeds length ceiling");
            return None;
        }

        let mut out = String::with_capacity(input.len());
        let mut stripped = 0usize;
        let mut pending_space = false;
        for ch in input.chars() {
            if is_stripped(ch) {
                stripped += 1;
                continue;
            }
            if ch.is_whitespace() {
                pending_space = !out.is_empty();
                continue;
            }
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }

        if original_len > self.limits.obfuscation_min_length
            && stripped as f64 > original_len as f64 * self.limits.obfuscation_ratio
        {
            warn!(len = original_len, stripped, "input rejected as likely obfuscation");
            return None;
        }

        if out.is_empty() { None } else { Some(out) }
    }
}

fn is_stripped(ch: char) -> bool {
    (ch.is_control() && !matches!(ch, '\t' | '\r' | '\n'))
        || matches!(
            ch,
            '\u{00AD}'
                | '\u{200B}'..='\u{200F}'
                | '\u{202A}'..='\u{202E}'
                | '\u{2060}'..='\u{2064}'
                | '\u{2066}'..='\u{2069}'
                | '\u{FEFF}'
        )
}
