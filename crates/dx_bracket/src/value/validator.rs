use std::sync::Arc;

use super::parser::single_function;
use super::{
    PropertySpec, ValidatedValue, ValidationOutcome, ValueKind, ValueRejection, ValueType,
    closest_matches, color, complex, function, length, number,
};
use crate::tables::PropertyTable;

/// Values every property accepts.
pub const GLOBAL_KEYWORDS: &[&str] = &["inherit", "initial", "unset", "revert", "revert-layer"];

/// Checks values against the property table's specs.
#[derive(Clone)]
pub struct ValueValidator {
    properties: Arc<dyn PropertyTable>,
}

impl ValueValidator {
    pub fn new(properties: Arc<dyn PropertyTable>) -> Self {
        Self { properties }
    }

    pub fn validate(&self, value: &str, property: &str) -> ValidationOutcome {
        match self.properties.spec(property) {
            Some(spec) => validate_with_spec(value, &spec),
            None => complex::validate_free(value.trim()),
        }
    }
}

pub fn validate_with_spec(value: &str, spec: &PropertySpec) -> ValidationOutcome {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValueRejection::new("value is empty"));
    }

    let lower = value.to_ascii_lowercase();
    if GLOBAL_KEYWORDS.contains(&lower.as_str()) {
        return Ok(ValidatedValue::single(lower, ValueType::GlobalKeyword));
    }
    if let Some((name, args)) = single_function(value) {
        if name.eq_ignore_ascii_case("var") {
            return function::validate_var(args.trim())
                .map(|normalized| ValidatedValue::single(normalized, ValueType::CustomProperty));
        }
    }

    match spec.kind {
        ValueKind::Length(rules) => length::validate(value, &rules),
        ValueKind::Color => color::validate(value),
        ValueKind::Number(rules) => number::validate(value, &rules),
        ValueKind::Keyword(keywords) => validate_keyword(value, keywords),
        ValueKind::Complex(grammar) => complex::validate(value, grammar),
    }
}

fn validate_keyword(value: &str, keywords: &[&str]) -> ValidationOutcome {
    let lower = value.to_ascii_lowercase();
    if keywords.contains(&lower.as_str()) {
        return Ok(ValidatedValue::single(lower, ValueType::Keyword));
    }
    Err(
        ValueRejection::new(format!("`{value}` is not an accepted keyword"))
            .suggest_all(closest_matches(&lower, keywords.iter().copied(), 3)),
    )
}
