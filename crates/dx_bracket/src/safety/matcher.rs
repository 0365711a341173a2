//! Bounded-cost regular expression evaluation.
//!
//! Patterns compile on the linear-time `regex` engine whenever they can. Sources that need
//! look-around or back-references fall back to `fancy-regex` with a hard backtrack limit, and
//! exceeding that limit is reported as a timeout.
//!
//! The elapsed-time budget is advisory. A match running on the calling thread cannot be
//! interrupted, so a slow match is only flagged after it returns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::AHashMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, warn};

/// Backtracking steps allowed on the fallback engine before a match is abandoned.
pub const DEFAULT_BACKTRACK_LIMIT: usize = 100_000;

const MAX_CACHED_PATTERNS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("input of {len} chars exceeds the limit of {max}")]
    InputTooLong { len: usize, max: usize },
    #[error("pattern `{pattern}` is prone to catastrophic backtracking: {reason}")]
    DangerousPattern { pattern: String, reason: &'static str },
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("match failed: {message}")]
    Engine { message: String },
}

/// Limits applied to a single match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBudget {
    pub timeout: Duration,
    /// Maximum input length in chars.
    pub max_length: usize,
    /// Run patterns even when the structural scan flags them.
    pub allow_dangerous: bool,
}

impl MatchBudget {
    pub const fn new(timeout: Duration, max_length: usize) -> Self {
        Self {
            timeout,
            max_length,
            allow_dangerous: false,
        }
    }

    /// The budget used on the grammar hot path.
    pub const fn fast() -> Self {
        Self::new(Duration::from_millis(5), 500)
    }

    pub const fn allowing_dangerous(mut self) -> Self {
        self.allow_dangerous = true;
        self
    }
}

impl Default for MatchBudget {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), 10_000)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub matched: bool,
    pub timed_out: bool,
    pub error: Option<MatchError>,
    pub elapsed: Duration,
}

impl MatchOutcome {
    fn refused(error: MatchError) -> Self {
        Self {
            matched: false,
            timed_out: false,
            error: Some(error),
            elapsed: Duration::ZERO,
        }
    }

    /// True only for a clean match inside the budget.
    pub fn is_match(&self) -> bool {
        self.matched && !self.timed_out && self.error.is_none()
    }
}

enum Engine {
    Linear(regex::Regex),
    Backtracking(fancy_regex::Regex),
}

/// A compiled pattern plus the result of its structural hazard scan.
pub struct SafePattern {
    source: String,
    engine: Engine,
    hazard: Option<&'static str>,
}

impl std::fmt::Debug for SafePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafePattern")
            .field("source", &self.source)
            .field("linear", &self.is_linear())
            .field("hazard", &self.hazard)
            .finish()
    }
}

impl SafePattern {
    pub fn new(source: &str) -> Result<Self, MatchError> {
        let hazard = scan_backtracking_hazard(source);
        let engine = match regex::Regex::new(source) {
            Ok(re) => Engine::Linear(re),
            Err(linear_err) => {
                let re = fancy_regex::RegexBuilder::new(source)
                    .backtrack_limit(DEFAULT_BACKTRACK_LIMIT)
                    .build()
                    .map_err(|err| MatchError::InvalidPattern {
                        pattern: source.to_string(),
                        message: format!("{linear_err}; {err}"),
                    })?;
                debug!(pattern = source, "pattern compiled on the backtracking engine");
                Engine::Backtracking(re)
            }
        };
        Ok(Self {
            source: source.to_string(),
            engine,
            hazard,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn hazard(&self) -> Option<&'static str> {
        self.hazard
    }

    pub fn is_linear(&self) -> bool {
        matches!(self.engine, Engine::Linear(_))
    }

    fn run_is_match(&self, input: &str) -> Result<bool, EngineFailure> {
        match &self.engine {
            Engine::Linear(re) => Ok(re.is_match(input)),
            Engine::Backtracking(re) => re.is_match(input).map_err(EngineFailure::from),
        }
    }

    fn run_captures<'h>(&self, input: &'h str) -> Result<Option<Vec<Option<&'h str>>>, EngineFailure> {
        match &self.engine {
            Engine::Linear(re) => Ok(re
                .captures(input)
                .map(|caps| caps.iter().map(|m| m.map(|m| m.as_str())).collect())),
            Engine::Backtracking(re) => {
                let caps = re.captures(input).map_err(EngineFailure::from)?;
                Ok(caps.map(|caps| {
                    (0..caps.len())
                        .map(|i| caps.get(i).map(|m| m.as_str()))
                        .collect()
                }))
            }
        }
    }
}

enum EngineFailure {
    BacktrackLimit,
    Other(String),
}

impl From<fancy_regex::Error> for EngineFailure {
    fn from(err: fancy_regex::Error) -> Self {
        match err {
            fancy_regex::Error::RuntimeError(fancy_regex::RuntimeError::BacktrackLimitExceeded) => {
                EngineFailure::BacktrackLimit
            }
            other => EngineFailure::Other(other.to_string()),
        }
    }
}

/// Runs patterns under a [`MatchBudget`] and keeps compiled ad-hoc patterns around.
#[derive(Default)]
pub struct SafeMatcher {
    compiled: Mutex<AHashMap<String, Arc<SafePattern>>>,
}

impl SafeMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `pattern`, reusing an earlier compilation when one exists.
    pub fn compile(&self, pattern: &str) -> Result<Arc<SafePattern>, MatchError> {
        if let Some(found) = self.compiled.lock().get(pattern) {
            return Ok(Arc::clone(found));
        }
        let compiled = Arc::new(SafePattern::new(pattern)?);
        let mut cache = self.compiled.lock();
        if cache.len() >= MAX_CACHED_PATTERNS {
            cache.clear();
        }
        cache.insert(pattern.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn test(&self, pattern: &str, input: &str, budget: MatchBudget) -> MatchOutcome {
        match self.compile(pattern) {
            Ok(compiled) => self.test_pattern(&compiled, input, budget),
            Err(err) => MatchOutcome::refused(err),
        }
    }

    pub fn test_pattern(&self, pattern: &SafePattern, input: &str, budget: MatchBudget) -> MatchOutcome {
        if let Some(err) = precheck(pattern, input, budget) {
            return MatchOutcome::refused(err);
        }
        let start = Instant::now();
        let result = pattern.run_is_match(input);
        finish(pattern, result, start.elapsed(), budget).0
    }

    /// Like [`SafeMatcher::test_pattern`], also returning every capture group on a clean match.
    pub fn captures<'h>(
        &self,
        pattern: &SafePattern,
        input: &'h str,
        budget: MatchBudget,
    ) -> (MatchOutcome, Option<Vec<Option<&'h str>>>) {
        if let Some(err) = precheck(pattern, input, budget) {
            return (MatchOutcome::refused(err), None);
        }
        let start = Instant::now();
        let result = pattern.run_captures(input);
        let elapsed = start.elapsed();
        let (groups, result) = match result {
            Ok(groups) => (groups.clone(), Ok(groups.is_some())),
            Err(failure) => (None, Err(failure)),
        };
        let (outcome, ok) = finish(pattern, result, elapsed, budget);
        (outcome, if ok { groups } else { None })
    }

    pub fn cached_patterns(&self) -> usize {
        self.compiled.lock().len()
    }
}

fn precheck(pattern: &SafePattern, input: &str, budget: MatchBudget) -> Option<MatchError> {
    let len = input.chars().count();
    if len > budget.max_length {
        return Some(MatchError::InputTooLong {
            len,
            max: budget.max_length,
        });
    }
    match pattern.hazard {
        Some(reason) if !budget.allow_dangerous => Some(MatchError::DangerousPattern {
            pattern: pattern.source.clone(),
            reason,
        }),
        _ => None,
    }
}

fn finish(
    pattern: &SafePattern,
    result: Result<bool, EngineFailure>,
    elapsed: Duration,
    budget: MatchBudget,
) -> (MatchOutcome, bool) {
    let over_budget = elapsed > budget.timeout;
    if over_budget {
        warn!(
            pattern = pattern.source(),
            elapsed_us = elapsed.as_micros() as u64,
            "regex match exceeded its time budget"
        );
    }
    match result {
        Ok(matched) => (
            MatchOutcome {
                matched,
                timed_out: over_budget,
                error: None,
                elapsed,
            },
            !over_budget,
        ),
        Err(EngineFailure::BacktrackLimit) => {
            warn!(pattern = pattern.source(), "backtrack limit exceeded");
            (
                MatchOutcome {
                    matched: false,
                    timed_out: true,
                    error: None,
                    elapsed,
                },
                false,
            )
        }
        Err(EngineFailure::Other(message)) => (
            MatchOutcome {
                matched: false,
                timed_out: over_budget,
                error: Some(MatchError::Engine { message }),
                elapsed,
            },
            false,
        ),
    }
}

#[derive(Default, Clone, Copy)]
struct GroupFrame {
    quantified: bool,
    alternation: bool,
}

/// Flags a group holding a quantifier or an alternation that is itself repeated without bound.
pub fn scan_backtracking_hazard(source: &str) -> Option<&'static str> {
    let chars: Vec<char> = source.chars().collect();
    let mut stack: SmallVec<[GroupFrame; 8]> = SmallVec::new();
    let mut in_class = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 2;
            continue;
        }
        if in_class {
            if c == ']' {
                in_class = false;
            }
            i += 1;
            continue;
        }
        match c {
            '[' => in_class = true,
            '(' => {
                stack.push(GroupFrame::default());
                // `(?:`, `(?=` and friends: the `?` is a group modifier.
                if chars.get(i + 1) == Some(&'?') {
                    i += 1;
                }
            }
            ')' => {
                let repeated = unbounded_quantifier_at(&chars, i + 1);
                if let Some(frame) = stack.pop() {
                    if repeated && frame.quantified {
                        return Some("nested quantifier inside a repeated group");
                    }
                    if repeated && frame.alternation {
                        return Some("alternation inside a repeated group");
                    }
                    if let Some(parent) = stack.last_mut() {
                        parent.quantified |= frame.quantified || repeated;
                    }
                }
            }
            '|' => {
                if let Some(frame) = stack.last_mut() {
                    frame.alternation = true;
                }
            }
            '*' | '+' | '{' => {
                if unbounded_quantifier_at(&chars, i) {
                    if let Some(frame) = stack.last_mut() {
                        frame.quantified = true;
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn unbounded_quantifier_at(chars: &[char], at: usize) -> bool {
    match chars.get(at) {
        Some('*') | Some('+') => true,
        Some('{') => {
            let rest: String = chars[at + 1..].iter().take_while(|c| **c != '}').collect();
            match rest.split_once(',') {
                Some((_, upper)) => {
                    let upper = upper.trim();
                    upper.is_empty() || upper.parse::<u32>().map(|n| n > 1).unwrap_or(false)
                }
                None => false,
            }
        }
        _ => false,
    }
}
