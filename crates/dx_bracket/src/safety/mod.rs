//! Input-safety layer: sanitization, threat detection and bounded regex evaluation.
//!
//! Every token passes through [`Sanitizer`] and [`ThreatDetector`] before any grammar work,
//! and every grammar regex runs through [`SafeMatcher`].

pub mod matcher;
pub mod sanitizer;
pub mod threat;

pub use matcher::{MatchBudget, MatchError, MatchOutcome, SafeMatcher, SafePattern};
pub use sanitizer::{InputKind, Sanitizer, SanitizerLimits};
pub use threat::{RiskLevel, ThreatDetector, ThreatMatch, ThreatReport};
