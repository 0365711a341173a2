use super::length::parse_number;
use super::{NumberRules, ValidatedValue, ValidationOutcome, ValueRejection, ValueType, closest_matches};

pub fn validate(value: &str, rules: &NumberRules) -> ValidationOutcome {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    if rules.keywords.contains(&lower.as_str()) {
        return Ok(ValidatedValue::single(lower, ValueType::Keyword));
    }

    let (number_text, is_percent) = match value.strip_suffix('%') {
        Some(number) if rules.allow_percentage => (number, true),
        Some(_) => return Err(ValueRejection::new("percentages are not allowed here")),
        None => (value, false),
    };

    let Some(number) = parse_number(number_text) else {
        let mut rejection = ValueRejection::new(format!("`{value}` is not a number"));
        if !rules.keywords.is_empty() {
            rejection = rejection.suggest_all(closest_matches(value, rules.keywords.iter().copied(), 3));
        }
        return Err(rejection);
    };

    if rules.integer && number_text.contains('.') {
        return Err(ValueRejection::new(format!("`{value}` must be an integer")));
    }
    if number < 0.0 && !rules.allow_negative {
        return Err(ValueRejection::new(format!(
            "negative value `{value}` is not allowed here"
        )));
    }

    let compared = if is_percent { number / 100.0 } else { number };
    let below = rules.min.is_some_and(|min| compared < min);
    let above = rules.max.is_some_and(|max| compared > max);
    if below || above {
        let range = match (rules.min, rules.max) {
            (Some(min), Some(max)) => format!("[{min}, {max}]"),
            (Some(min), None) => format!(">= {min}"),
            (None, Some(max)) => format!("<= {max}"),
            (None, None) => String::new(),
        };
        return Err(ValueRejection::new(format!("`{value}` is out of range {range}")));
    }

    let mut normalized = number_text.trim_start_matches('+').to_string();
    if is_percent {
        normalized.push('%');
    }
    Ok(ValidatedValue::single(normalized, ValueType::Number))
}
