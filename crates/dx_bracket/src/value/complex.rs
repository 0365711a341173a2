//! Grammars for multi-token and function-heavy properties.

use super::color;
use super::function::{
    self, EASING_FUNCTIONS, FILTER_FUNCTIONS, IMAGE_FUNCTIONS, TRANSFORM_FUNCTIONS,
};
use super::length::{ANGLE_UNITS, TIME_UNITS, parse_dimension, parse_number, validate_single};
use super::parser::{SeparatorPolicy, single_function, split_components, split_top_level};
use super::{LengthRules, ValidatedValue, ValidationOutcome, ValueRejection, ValueType, closest_matches};
use crate::safety::ThreatDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplexGrammar {
    Transform,
    Filter,
    Shadow,
    Transition,
    Time,
    Easing,
    Angle,
    GridTracks,
    FontFamily,
    Image,
    Ratio,
    /// Conservative fallback for properties without a dedicated grammar.
    Free,
}

impl ComplexGrammar {
    pub fn separator(self) -> SeparatorPolicy {
        match self {
            ComplexGrammar::Shadow
            | ComplexGrammar::Transition
            | ComplexGrammar::FontFamily
            | ComplexGrammar::Image => SeparatorPolicy::CommaList,
            ComplexGrammar::Transform
            | ComplexGrammar::Filter
            | ComplexGrammar::GridTracks
            | ComplexGrammar::Ratio
            | ComplexGrammar::Free => SeparatorPolicy::SpaceJoin,
            ComplexGrammar::Time | ComplexGrammar::Easing | ComplexGrammar::Angle => {
                SeparatorPolicy::Single
            }
        }
    }
}

const EASING_KEYWORDS: &[&str] = &[
    "linear",
    "ease",
    "ease-in",
    "ease-out",
    "ease-in-out",
    "step-start",
    "step-end",
];

const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
    "ui-serif",
    "ui-sans-serif",
    "ui-monospace",
    "ui-rounded",
    "emoji",
    "math",
    "fangsong",
];

pub fn validate(value: &str, grammar: ComplexGrammar) -> ValidationOutcome {
    let value = value.trim();
    match grammar {
        ComplexGrammar::Transform => function_sequence(value, TRANSFORM_FUNCTIONS, "transform"),
        ComplexGrammar::Filter => function_sequence(value, FILTER_FUNCTIONS, "filter"),
        ComplexGrammar::Shadow => validate_shadow(value),
        ComplexGrammar::Transition => validate_transition(value),
        ComplexGrammar::Time => validate_time(value, true).map(|t| tagged(t, ValueType::Complex)),
        ComplexGrammar::Easing => validate_easing(value),
        ComplexGrammar::Angle => validate_angle(value).map(|a| tagged(a, ValueType::Complex)),
        ComplexGrammar::GridTracks => validate_grid_tracks(value),
        ComplexGrammar::FontFamily => validate_font_family(value),
        ComplexGrammar::Image => validate_image(value),
        ComplexGrammar::Ratio => validate_ratio(value),
        ComplexGrammar::Free => validate_free(value),
    }
}

fn tagged(value: String, value_type: ValueType) -> ValidatedValue {
    ValidatedValue::single(value, value_type)
}

fn list(items: Vec<String>, separator: &str) -> ValidatedValue {
    let value_type = if items.len() == 1 && single_function(&items[0]).is_some() {
        ValueType::Function
    } else {
        ValueType::Complex
    };
    ValidatedValue {
        value: items.join(separator),
        value_type,
        components: items,
        sides: None,
    }
}

fn function_sequence(value: &str, allowed: &[&str], property: &str) -> ValidationOutcome {
    if value.eq_ignore_ascii_case("none") {
        return Ok(tagged("none".into(), ValueType::Keyword));
    }
    let tokens = split_components(value);
    if tokens.is_empty() {
        return Err(ValueRejection::new(format!("{property} value is empty")));
    }
    let mut items = Vec::with_capacity(tokens.len());
    for token in tokens {
        if single_function(token).is_none() {
            return Err(ValueRejection::new(format!(
                "`{token}` is not a {property} function"
            ))
            .suggest_all(closest_matches(token, allowed.iter().copied(), 3).into_iter().map(|f| format!("{f}()"))));
        }
        items.push(function::validate_function(token, allowed)?);
    }
    Ok(list(items, " "))
}

fn validate_shadow(value: &str) -> ValidationOutcome {
    if value.eq_ignore_ascii_case("none") {
        return Ok(tagged("none".into(), ValueType::Keyword));
    }
    let mut items = Vec::new();
    for shadow in split_top_level(value, ',') {
        let mut lengths = 0;
        let mut colors = 0;
        let mut inset = false;
        let mut parts = Vec::new();
        for token in split_components(shadow) {
            if token.eq_ignore_ascii_case("inset") && !inset {
                inset = true;
                parts.push("inset".to_string());
                continue;
            }
            let rules = if lengths < 2 {
                LengthRules::new().negative()
            } else if lengths == 2 {
                LengthRules::new()
            } else {
                LengthRules::new().negative()
            };
            if let Ok((length, _)) = validate_single(token, &rules) {
                if length.ends_with('%') {
                    return Err(ValueRejection::new("shadow offsets cannot be percentages"));
                }
                lengths += 1;
                parts.push(length);
            } else if let Ok(color) = color::normalize_color(token) {
                colors += 1;
                parts.push(color);
            } else {
                return Err(ValueRejection::new(format!("`{token}` is not valid in a shadow")));
            }
        }
        if !(2..=4).contains(&lengths) || colors > 1 {
            return Err(ValueRejection::new(format!(
                "`{shadow}` needs 2-4 lengths, an optional color and optional inset"
            )));
        }
        items.push(parts.join(" "));
    }
    Ok(list(items, ", "))
}

fn validate_time(token: &str, allow_negative: bool) -> Result<String, ValueRejection> {
    if let Some((name, _)) = single_function(token) {
        if matches!(name.to_ascii_lowercase().as_str(), "calc" | "var") {
            return function::validate_function(token, &["calc", "var"]);
        }
    }
    let dim = parse_dimension(token)
        .ok_or_else(|| ValueRejection::new(format!("`{token}` is not a time")))?;
    let unit = dim.unit.to_ascii_lowercase();
    if !TIME_UNITS.contains(&unit.as_str()) {
        return Err(ValueRejection::new(format!("`{token}` needs a time unit"))
            .suggest(format!("{}ms", dim.number_text))
            .suggest(format!("{}s", dim.number_text)));
    }
    if dim.number < 0.0 && !allow_negative {
        return Err(ValueRejection::new(format!("negative duration `{token}`")));
    }
    Ok(format!("{}{unit}", dim.number_text.trim_start_matches('+')))
}

fn easing_token(token: &str) -> Option<Result<String, ValueRejection>> {
    let lower = token.to_ascii_lowercase();
    if EASING_KEYWORDS.contains(&lower.as_str()) {
        return Some(Ok(lower));
    }
    single_function(token).map(|_| function::validate_function(token, EASING_FUNCTIONS))
}

fn validate_easing(value: &str) -> ValidationOutcome {
    match easing_token(value) {
        Some(Ok(easing)) => {
            let value_type = if single_function(&easing).is_some() {
                ValueType::Function
            } else {
                ValueType::Keyword
            };
            Ok(tagged(easing, value_type))
        }
        Some(Err(rejection)) => Err(rejection),
        None => Err(ValueRejection::new(format!("`{value}` is not a timing function"))
            .suggest_all(closest_matches(value, EASING_KEYWORDS.iter().copied(), 3))),
    }
}

fn validate_transition(value: &str) -> ValidationOutcome {
    let lower = value.to_ascii_lowercase();
    if lower == "none" || lower == "all" {
        return Ok(tagged(lower, ValueType::Keyword));
    }
    let mut items = Vec::new();
    for item in split_top_level(value, ',') {
        let mut times = 0;
        let mut has_property = false;
        let mut has_easing = false;
        let mut parts = Vec::new();
        for token in split_components(item) {
            if let Ok(time) = validate_time(token, times == 1) {
                times += 1;
                parts.push(time);
                continue;
            }
            if let Some(easing) = easing_token(token) {
                if has_easing {
                    return Err(ValueRejection::new("transition has more than one timing function"));
                }
                has_easing = true;
                parts.push(easing?);
                continue;
            }
            let is_ident = token.starts_with(|c: char| c.is_ascii_alphabetic() || c == '-')
                && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
            if is_ident && !has_property {
                has_property = true;
                parts.push(token.to_ascii_lowercase());
                continue;
            }
            return Err(ValueRejection::new(format!("`{token}` is not valid in a transition")));
        }
        if times > 2 {
            return Err(ValueRejection::new("transition takes at most a duration and a delay"));
        }
        if parts.is_empty() {
            return Err(ValueRejection::new("transition item is empty"));
        }
        items.push(parts.join(" "));
    }
    Ok(list(items, ", "))
}

fn validate_angle(token: &str) -> Result<String, ValueRejection> {
    if let Some((name, _)) = single_function(token) {
        if matches!(name.to_ascii_lowercase().as_str(), "calc" | "var") {
            return function::validate_function(token, &["calc", "var"]);
        }
    }
    let dim = parse_dimension(token)
        .ok_or_else(|| ValueRejection::new(format!("`{token}` is not an angle")))?;
    let unit = dim.unit.to_ascii_lowercase();
    if unit.is_empty() && dim.number == 0.0 {
        return Ok("0".into());
    }
    if !ANGLE_UNITS.contains(&unit.as_str()) {
        return Err(ValueRejection::new(format!("`{token}` needs an angle unit"))
            .suggest(format!("{}deg", dim.number_text)));
    }
    Ok(format!("{}{unit}", dim.number_text.trim_start_matches('+')))
}

fn validate_grid_tracks(value: &str) -> ValidationOutcome {
    let lower = value.to_ascii_lowercase();
    if matches!(lower.as_str(), "none" | "subgrid" | "masonry") {
        return Ok(tagged(lower, ValueType::Keyword));
    }
    let tracks = split_components(value)
        .into_iter()
        .map(|track| function::check_track_size(track, true))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(list(tracks, " "))
}

fn validate_font_family(value: &str) -> ValidationOutcome {
    let mut families = Vec::new();
    for family in split_top_level(value, ',') {
        if family.is_empty() {
            return Err(ValueRejection::new("font family list has an empty entry"));
        }
        if let Some(q) = family.chars().next().filter(|c| matches!(c, '"' | '\'')) {
            let inner = family
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
                .ok_or_else(|| ValueRejection::new(format!("`{family}` has mismatched quotes")))?;
            if inner.trim().is_empty() || inner.contains(['"', '\'', '\\']) {
                return Err(ValueRejection::new(format!("`{family}` is not a valid family name")));
            }
            families.push(format!("{q}{inner}{q}"));
            continue;
        }
        let words = split_components(family);
        let valid = words.iter().all(|word| {
            word.starts_with(|c: char| c.is_ascii_alphabetic())
                && word.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
        if !valid {
            return Err(ValueRejection::new(format!(
                "`{family}` must be quoted or a plain identifier"
            ))
            .suggest(format!("'{family}'")));
        }
        let joined = words.join(" ");
        let lower = joined.to_ascii_lowercase();
        families.push(if GENERIC_FAMILIES.contains(&lower.as_str()) { lower } else { joined });
    }
    Ok(ValidatedValue {
        value: families.join(", "),
        value_type: ValueType::Complex,
        components: families,
        sides: None,
    })
}

fn validate_image(value: &str) -> ValidationOutcome {
    if value.eq_ignore_ascii_case("none") {
        return Ok(tagged("none".into(), ValueType::Keyword));
    }
    let mut layers = Vec::new();
    for layer in split_top_level(value, ',') {
        if single_function(layer).is_none() {
            return Err(ValueRejection::new(format!(
                "`{layer}` is not an image; use url() or a gradient"
            )));
        }
        layers.push(function::validate_function(layer, IMAGE_FUNCTIONS)?);
    }
    Ok(list(layers, ", "))
}

fn validate_ratio(value: &str) -> ValidationOutcome {
    if value.eq_ignore_ascii_case("auto") {
        return Ok(tagged("auto".into(), ValueType::Keyword));
    }
    let (left, right) = match value.split_once('/') {
        Some((left, right)) => (left.trim(), Some(right.trim())),
        None => (value.trim(), None),
    };
    let positive = |text: &str| parse_number(text).filter(|n| *n > 0.0).map(|_| text.trim_start_matches('+').to_string());
    let Some(width) = positive(left) else {
        return Err(ValueRejection::new(format!("`{value}` is not a valid ratio")).suggest("16/9"));
    };
    match right {
        None => Ok(tagged(width, ValueType::Number)),
        Some(right) => {
            let Some(height) = positive(right) else {
                return Err(ValueRejection::new(format!("`{value}` is not a valid ratio")).suggest("16/9"));
            };
            Ok(ValidatedValue {
                value: format!("{width} / {height}"),
                value_type: ValueType::Complex,
                components: vec![width, height],
                sides: None,
            })
        }
    }
}

/// Accepts anything the threat detector passes that stays inside a conservative character set.
pub fn validate_free(value: &str) -> ValidationOutcome {
    if value.is_empty() {
        return Err(ValueRejection::new("value is empty"));
    }
    if let Some(bad) = value.chars().find(|c| {
        !(c.is_ascii_alphanumeric() || c.is_whitespace() || "#%.,()-+*/'\"!:".contains(*c))
    }) {
        return Err(ValueRejection::new(format!("`{bad}` is not allowed in a value")));
    }
    if !ThreatDetector::shared().is_safe(value) {
        return Err(ValueRejection::new("value contains disallowed content"));
    }
    let components = split_components(value).into_iter().map(str::to_string).collect();
    Ok(ValidatedValue {
        value: value.to_string(),
        value_type: ValueType::Complex,
        components,
        sides: None,
    })
}
