//! Named dangerous-pattern detection with risk levels.
//!
//! Input is scanned as-is and, when it carries escape markers, once more after decoding HTML
//! numeric entities, percent escapes and CSS hex escapes. Patterns that only show up after
//! decoding are reported with an `encoded_` prefix.

use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// High and critical input never reaches the grammar.
    pub fn blocks(self) -> bool {
        self >= RiskLevel::High
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// (name, description, risk, pattern)
const PATTERN_TABLE: &[(&str, &str, RiskLevel, &str)] = &[
    (
        "javascript_url",
        "javascript: URL scheme",
        RiskLevel::Critical,
        r"(?i)javascript\s*:",
    ),
    (
        "vbscript_url",
        "vbscript: URL scheme",
        RiskLevel::Critical,
        r"(?i)vbscript\s*:",
    ),
    (
        "css_expression",
        "legacy IE expression()",
        RiskLevel::Critical,
        r"(?i)expression\s*\(",
    ),
    (
        "script_tag",
        "script element",
        RiskLevel::Critical,
        r"(?i)<\s*/?\s*script",
    ),
    (
        "iframe_tag",
        "iframe element",
        RiskLevel::Critical,
        r"(?i)<\s*/?\s*iframe",
    ),
    ("data_url", "data: URL scheme", RiskLevel::High, r"(?i)\bdata\s*:"),
    (
        "behavior_property",
        "IE behavior property",
        RiskLevel::High,
        r"(?i)\bbehavior\s*:",
    ),
    (
        "binding_property",
        "XBL binding",
        RiskLevel::High,
        r"(?i)-moz-binding|\bbinding\s*:",
    ),
    ("css_import", "@import rule", RiskLevel::High, r"(?i)@import"),
    (
        "event_handler",
        "inline event handler",
        RiskLevel::High,
        r"(?i)\bon\w+\s*=",
    ),
    ("eval_call", "eval() call", RiskLevel::High, r"(?i)\beval\s*\("),
    (
        "calc_injection",
        "calc() wrapping script-like content",
        RiskLevel::High,
        r"(?i)calc\s*\([^)]*(?:javascript|expression|eval|url|script)",
    ),
    (
        "unsafe_url_scheme",
        "non-web URL scheme",
        RiskLevel::Medium,
        r"(?i)\b(?:file|ftp|about|chrome|mhtml|jar|ms-its|res)\s*:",
    ),
    ("css_comment", "CSS comment delimiter", RiskLevel::Medium, r"/\*|\*/"),
    (
        "css_escape",
        "CSS hex escape",
        RiskLevel::Medium,
        r"(?i)\\[0-9a-f]{1,6}",
    ),
    (
        "html_entity",
        "HTML numeric entity",
        RiskLevel::Medium,
        r"(?i)&#x?[0-9a-f]+;?",
    ),
    (
        "percent_encoding",
        "percent-encoded markup character",
        RiskLevel::Low,
        r"(?i)%(?:3c|3e|22|27|28|29)",
    ),
];

pub struct ThreatPattern {
    pub name: &'static str,
    pub description: &'static str,
    pub risk: RiskLevel,
    regex: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreatMatch {
    pub name: String,
    pub description: &'static str,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatReport {
    pub is_dangerous: bool,
    pub matched_patterns: Vec<ThreatMatch>,
    pub risk_level: RiskLevel,
}

impl ThreatReport {
    /// Matched pattern names, comma separated.
    pub fn summary(&self) -> String {
        self.matched_patterns
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

static SHARED: LazyLock<ThreatDetector> = LazyLock::new(ThreatDetector::new);

pub struct ThreatDetector {
    patterns: Vec<ThreatPattern>,
    blocking: RegexSet,
}

impl Default for ThreatDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreatDetector {
    pub fn new() -> Self {
        let patterns: Vec<ThreatPattern> = PATTERN_TABLE
            .iter()
            .filter_map(|&(name, description, risk, source)| match Regex::new(source) {
                Ok(regex) => Some(ThreatPattern {
                    name,
                    description,
                    risk,
                    regex,
                }),
                Err(err) => {
                    error!(name, %err, "threat pattern failed to compile");
                    None
                }
            })
            .collect();
        let blocking_sources = patterns
            .iter()
            .filter(|p| p.risk.blocks())
            .map(|p| p.regex.as_str());
        let blocking = RegexSet::new(blocking_sources).unwrap_or_else(|err| {
            error!(%err, "blocking pattern set failed to compile");
            RegexSet::empty()
        });
        Self { patterns, blocking }
    }

    /// The process-wide detector. The table is immutable, so sharing it is free.
    pub fn shared() -> &'static ThreatDetector {
        &SHARED
    }

    pub fn patterns(&self) -> impl Iterator<Item = &ThreatPattern> {
        self.patterns.iter()
    }

    pub fn detect(&self, input: &str) -> ThreatReport {
        let mut matched: Vec<ThreatMatch> = self
            .patterns
            .iter()
            .filter(|p| p.regex.is_match(input))
            .map(|p| ThreatMatch {
                name: p.name.to_string(),
                description: p.description,
                risk: p.risk,
            })
            .collect();

        if has_escape_markers(input) {
            let decoded = decode_escapes(input);
            if decoded != input {
                for pattern in &self.patterns {
                    let seen = matched.iter().any(|m| m.name == pattern.name);
                    if !seen && pattern.regex.is_match(&decoded) {
                        matched.push(ThreatMatch {
                            name: format!("encoded_{}", pattern.name),
                            description: pattern.description,
                            risk: pattern.risk,
                        });
                    }
                }
            }
        }

        let risk_level = matched.iter().map(|m| m.risk).max().unwrap_or_default();
        ThreatReport {
            is_dangerous: risk_level.blocks(),
            matched_patterns: matched,
            risk_level,
        }
    }

    /// Hot-path check over the high and critical patterns only.
    pub fn is_safe(&self, input: &str) -> bool {
        if self.blocking.is_match(input) {
            return false;
        }
        if has_escape_markers(input) {
            return !self.blocking.is_match(&decode_escapes(input));
        }
        true
    }
}

fn has_escape_markers(input: &str) -> bool {
    input.contains("&#") || input.contains('%') || input.contains('\\')
}

/// Decodes `&#NN;`, `&#xHH;`, `%HH` and CSS `\HHHHHH` escapes. Undecodable sequences are kept.
pub fn decode_escapes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '&' && chars.get(i + 1) == Some(&'#') {
            let (radix, start) = match chars.get(i + 2) {
                Some('x') | Some('X') => (16, i + 3),
                _ => (10, i + 2),
            };
            let end = scan_digits(&chars, start, radix, 8);
            if end > start {
                let digits: String = chars[start..end].iter().collect();
                if let Some(decoded) = u32::from_str_radix(&digits, radix).ok().and_then(char::from_u32) {
                    out.push(decoded);
                    i = if chars.get(end) == Some(&';') { end + 1 } else { end };
                    continue;
                }
            }
        } else if c == '%' {
            let end = scan_digits(&chars, i + 1, 16, 2);
            if end == i + 3 {
                let digits: String = chars[i + 1..end].iter().collect();
                if let Ok(byte) = u8::from_str_radix(&digits, 16) {
                    if byte.is_ascii() {
                        out.push(byte as char);
                        i = end;
                        continue;
                    }
                }
            }
        } else if c == '\\' {
            let end = scan_digits(&chars, i + 1, 16, 6);
            if end > i + 1 {
                let digits: String = chars[i + 1..end].iter().collect();
                if let Some(decoded) = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    out.push(decoded);
                    i = if chars.get(end) == Some(&' ') { end + 1 } else { end };
                    continue;
                }
            } else if let Some(&next) = chars.get(i + 1) {
                out.push(next);
                i += 2;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

fn scan_digits(chars: &[char], start: usize, radix: u32, max: usize) -> usize {
    let mut end = start;
    while end < chars.len() && end - start < max && chars[end].is_digit(radix) {
        end += 1;
    }
    end
}
