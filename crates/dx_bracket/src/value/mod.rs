//! Value splitting and type-directed validation.
//!
//! [`ValueParser`] turns the raw bracket content into normalized components, and
//! [`ValueValidator`] checks them against the property's [`PropertySpec`]. Each [`ValueKind`]
//! has its own module; dispatch is an exhaustive `match`, so adding a kind is a compile error
//! until every site handles it.

pub mod color;
pub mod complex;
pub mod function;
pub mod length;
pub mod number;
pub mod parser;
pub mod validator;

use serde::Serialize;
use thiserror::Error;

pub use complex::ComplexGrammar;
pub use parser::{ParsedValue, SeparatorPolicy, ValueParseError, ValueParser};
pub use validator::ValueValidator;

/// Constraints for length-typed properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRules {
    pub allow_negative: bool,
    pub allow_percentage: bool,
    /// Bare numbers other than `0` are accepted (line-height).
    pub allow_unitless: bool,
    pub keywords: &'static [&'static str],
    /// 1 for plain properties, 2 or 4 for shorthands.
    pub max_components: usize,
}

impl LengthRules {
    pub const fn new() -> Self {
        Self {
            allow_negative: false,
            allow_percentage: true,
            allow_unitless: false,
            keywords: &[],
            max_components: 1,
        }
    }

    pub const fn negative(mut self) -> Self {
        self.allow_negative = true;
        self
    }

    pub const fn unitless(mut self) -> Self {
        self.allow_unitless = true;
        self
    }

    pub const fn keywords(mut self, keywords: &'static [&'static str]) -> Self {
        self.keywords = keywords;
        self
    }

    pub const fn components(mut self, max: usize) -> Self {
        self.max_components = max;
        self
    }
}

impl Default for LengthRules {
    fn default() -> Self {
        Self::new()
    }
}

/// Constraints for number-typed properties. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRules {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub allow_negative: bool,
    pub allow_percentage: bool,
    pub integer: bool,
    pub keywords: &'static [&'static str],
}

impl NumberRules {
    pub const fn new() -> Self {
        Self {
            min: None,
            max: None,
            allow_negative: false,
            allow_percentage: false,
            integer: false,
            keywords: &[],
        }
    }

    pub const fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub const fn negative(mut self) -> Self {
        self.allow_negative = true;
        self
    }

    pub const fn percentage(mut self) -> Self {
        self.allow_percentage = true;
        self
    }

    pub const fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    pub const fn keywords(mut self, keywords: &'static [&'static str]) -> Self {
        self.keywords = keywords;
        self
    }
}

impl Default for NumberRules {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    Length(LengthRules),
    Color,
    Number(NumberRules),
    Keyword(&'static [&'static str]),
    Complex(ComplexGrammar),
}

/// What a property accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertySpec {
    pub kind: ValueKind,
}

impl PropertySpec {
    pub const fn new(kind: ValueKind) -> Self {
        Self { kind }
    }

    /// How the value parser should treat separators for this property.
    pub fn separator(&self) -> SeparatorPolicy {
        match self.kind {
            ValueKind::Length(rules) if rules.max_components > 1 => SeparatorPolicy::SpaceJoin,
            ValueKind::Length(_) | ValueKind::Color | ValueKind::Number(_) | ValueKind::Keyword(_) => {
                SeparatorPolicy::Single
            }
            ValueKind::Complex(grammar) => grammar.separator(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueType {
    Length,
    Color,
    Number,
    Keyword,
    Function,
    Complex,
    CustomProperty,
    GlobalKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedValue {
    pub value: String,
    pub value_type: ValueType,
    pub components: Vec<String>,
    /// Top, right, bottom, left for four-sided shorthands.
    pub sides: Option<[String; 4]>,
}

impl ValidatedValue {
    pub fn single(value: impl Into<String>, value_type: ValueType) -> Self {
        let value = value.into();
        Self {
            components: vec![value.clone()],
            value,
            value_type,
            sides: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ValueRejection {
    pub reason: String,
    pub suggestions: Vec<String>,
}

impl ValueRejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn suggest_all(mut self, suggestions: impl IntoIterator<Item = String>) -> Self {
        self.suggestions.extend(suggestions);
        self
    }
}

pub type ValidationOutcome = Result<ValidatedValue, ValueRejection>;

/// Candidates within Levenshtein distance 2 of `input`, closest first.
pub(crate) fn closest_matches<'a>(
    input: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    limit: usize,
) -> Vec<String> {
    let needle = input.to_ascii_lowercase();
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|c| (strsim::levenshtein(&needle, c), c))
        .filter(|(distance, _)| *distance <= 2)
        .collect();
    scored.sort();
    scored.into_iter().take(limit).map(|(_, c)| c.to_string()).collect()
}
