//! Lengths, dimensions and four-sided shorthand expansion.

use super::function;
use super::parser::{single_function, split_components};
use super::{LengthRules, ValidatedValue, ValidationOutcome, ValueRejection, ValueType, closest_matches};

pub const LENGTH_UNITS: &[&str] = &[
    // absolute
    "px", "cm", "mm", "q", "in", "pt", "pc",
    // font-relative
    "em", "rem", "ex", "rex", "ch", "rch", "cap", "rcap", "ic", "ric", "lh", "rlh",
    // viewport
    "vw", "vh", "vi", "vb", "vmin", "vmax",
    "svw", "svh", "svi", "svb", "svmin", "svmax",
    "lvw", "lvh", "lvi", "lvb", "lvmin", "lvmax",
    "dvw", "dvh", "dvi", "dvb", "dvmin", "dvmax",
    // container
    "cqw", "cqh", "cqi", "cqb", "cqmin", "cqmax",
    // flexible
    "fr",
];

pub const ANGLE_UNITS: &[&str] = &["deg", "rad", "grad", "turn"];

pub const TIME_UNITS: &[&str] = &["ms", "s"];

const MATH_FUNCTIONS: &[&str] = &["calc", "min", "max", "clamp", "var"];

/// A number with an optional unit, as written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension<'a> {
    pub number: f64,
    pub number_text: &'a str,
    pub unit: &'a str,
}

/// Strict CSS number: optional sign, digits with an optional fraction, or a bare fraction.
pub fn parse_number(text: &str) -> Option<f64> {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (int, frac) = match body.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (body, None),
    };
    let int_ok = int.chars().all(|c| c.is_ascii_digit());
    let frac_ok = frac.is_none_or(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()));
    if !int_ok || !frac_ok || (int.is_empty() && frac.is_none()) {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn parse_dimension(text: &str) -> Option<Dimension<'_>> {
    let split = text
        .char_indices()
        .find(|(idx, c)| {
            !(c.is_ascii_digit() || *c == '.' || ((*c == '+' || *c == '-') && *idx == 0))
        })
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let (number_text, unit) = text.split_at(split);
    let number = parse_number(number_text)?;
    if !(unit.is_empty() || unit == "%" || unit.chars().all(|c| c.is_ascii_alphabetic())) {
        return None;
    }
    Some(Dimension {
        number,
        number_text,
        unit,
    })
}

pub fn is_length_unit(unit: &str) -> bool {
    LENGTH_UNITS.iter().any(|u| u.eq_ignore_ascii_case(unit))
}

/// A number with a length unit or no unit at all.
pub fn has_length_shape(value: &str) -> bool {
    match parse_dimension(value.trim()) {
        Some(dim) => dim.unit.is_empty() || dim.unit == "%" || is_length_unit(dim.unit),
        None => false,
    }
}

pub fn validate(value: &str, rules: &LengthRules) -> ValidationOutcome {
    let parts = split_components(value);
    if parts.is_empty() {
        return Err(ValueRejection::new("value is empty"));
    }
    if parts.len() > rules.max_components {
        let reason = if rules.max_components == 1 {
            format!("expected a single length but found {} values", parts.len())
        } else {
            format!(
                "expected at most {} values but found {}",
                rules.max_components,
                parts.len()
            )
        };
        return Err(ValueRejection::new(reason));
    }

    let mut components = Vec::with_capacity(parts.len());
    let mut value_type = ValueType::Length;
    for part in &parts {
        let (normalized, part_type) = validate_single(part, rules)?;
        if parts.len() == 1 {
            value_type = part_type;
        }
        components.push(normalized);
    }

    let sides = (rules.max_components == 4).then(|| expand_sides(&components));
    Ok(ValidatedValue {
        value: components.join(" "),
        value_type,
        components,
        sides,
    })
}

/// Validates one length token and returns its normalized text.
pub fn validate_single(token: &str, rules: &LengthRules) -> Result<(String, ValueType), ValueRejection> {
    let lower = token.to_ascii_lowercase();
    if rules.keywords.contains(&lower.as_str()) {
        return Ok((lower, ValueType::Keyword));
    }

    if let Some((name, _)) = single_function(token) {
        let name = name.to_ascii_lowercase();
        if MATH_FUNCTIONS.contains(&name.as_str()) {
            let normalized = function::validate_function(token, MATH_FUNCTIONS)?;
            return Ok((normalized, ValueType::Function));
        }
        return Err(ValueRejection::new(format!("`{name}()` is not valid in a length"))
            .suggest_all(MATH_FUNCTIONS.iter().map(|f| format!("{f}()"))));
    }

    let Some(dim) = parse_dimension(token) else {
        let mut rejection = ValueRejection::new(format!("`{token}` is not a valid length"));
        if !rules.keywords.is_empty() {
            rejection = rejection.suggest_all(closest_matches(token, rules.keywords.iter().copied(), 3));
        }
        return Err(rejection);
    };

    if dim.number < 0.0 && !rules.allow_negative {
        return Err(ValueRejection::new(format!(
            "negative value `{token}` is not allowed here"
        )));
    }

    if dim.unit.is_empty() {
        if dim.number == 0.0 {
            return Ok(("0".to_string(), ValueType::Length));
        }
        if rules.allow_unitless {
            return Ok((dim.number_text.trim_start_matches('+').to_string(), ValueType::Number));
        }
        return Err(ValueRejection::new(format!("`{token}` needs a unit"))
            .suggest(format!("{token}px"))
            .suggest(format!("{token}rem")));
    }

    if dim.unit == "%" {
        if !rules.allow_percentage {
            return Err(ValueRejection::new("percentages are not allowed here"));
        }
    } else if !is_length_unit(dim.unit) {
        return Err(ValueRejection::new(format!("unknown length unit `{}`", dim.unit))
            .suggest_all(
                closest_matches(dim.unit, LENGTH_UNITS.iter().copied(), 3)
                    .into_iter()
                    .map(|unit| format!("{}{unit}", dim.number_text)),
            ));
    }

    Ok((
        format!(
            "{}{}",
            dim.number_text.trim_start_matches('+'),
            dim.unit.to_ascii_lowercase()
        ),
        ValueType::Length,
    ))
}

/// Box-model expansion: 1 → all, 2 → vertical/horizontal, 3 → top/horizontal/bottom, 4 → explicit.
pub fn expand_sides(parts: &[String]) -> [String; 4] {
    match parts {
        [all] => [all.clone(), all.clone(), all.clone(), all.clone()],
        [vertical, horizontal] => [
            vertical.clone(),
            horizontal.clone(),
            vertical.clone(),
            horizontal.clone(),
        ],
        [top, horizontal, bottom] => [
            top.clone(),
            horizontal.clone(),
            bottom.clone(),
            horizontal.clone(),
        ],
        [top, right, bottom, left, ..] => [top.clone(), right.clone(), bottom.clone(), left.clone()],
        [] => Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SIZE: LengthRules = LengthRules::new().keywords(&["auto", "min-content"]);

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("24"), Some(24.0));
        assert_eq!(parse_number("-1.5"), Some(-1.5));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("+2"), Some(2.0));
        assert_eq!(parse_number("1."), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("1e3"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_parse_dimension() {
        let dim = parse_dimension("24px").unwrap();
        assert_eq!(dim.number, 24.0);
        assert_eq!(dim.unit, "px");
        assert_eq!(parse_dimension("50%").unwrap().unit, "%");
        assert!(parse_dimension("px").is_none());
        assert!(parse_dimension("1p-x").is_none());
    }

    #[test]
    fn test_single_lengths() {
        let ok = validate("24px", &SIZE).unwrap();
        assert_eq!(ok.value, "24px");
        assert_eq!(ok.value_type, ValueType::Length);
        assert_eq!(validate("1.5REM", &SIZE).unwrap().value, "1.5rem");
        assert_eq!(validate("0", &SIZE).unwrap().value, "0");
        assert_eq!(validate("100dvh", &SIZE).unwrap().value, "100dvh");
        assert_eq!(validate("Auto", &SIZE).unwrap().value_type, ValueType::Keyword);
    }

    #[test]
    fn test_rejections() {
        let err = validate("24", &SIZE).unwrap_err();
        assert!(err.reason.contains("needs a unit"));
        assert!(err.suggestions.contains(&"24px".to_string()));

        let err = validate("-4px", &SIZE).unwrap_err();
        assert!(err.reason.contains("negative"));

        let err = validate("10pz", &SIZE).unwrap_err();
        assert!(err.reason.contains("unknown length unit"));
        assert!(err.suggestions.contains(&"10px".to_string()));

        let err = validate("atuo", &SIZE).unwrap_err();
        assert_eq!(err.suggestions, vec!["auto".to_string()]);

        assert!(validate("10px 20px", &SIZE).is_err());
    }

    #[test]
    fn test_negative_and_unitless_rules() {
        let margin = LengthRules::new().negative();
        assert_eq!(validate("-4px", &margin).unwrap().value, "-4px");
        let leading = LengthRules::new().unitless();
        let ok = validate("1.5", &leading).unwrap();
        assert_eq!(ok.value, "1.5");
        assert_eq!(ok.value_type, ValueType::Number);
    }

    #[test]
    fn test_shorthand_expansion() {
        let padding = LengthRules::new().components(4);
        let ok = validate("10px 20px", &padding).unwrap();
        assert_eq!(
            ok.sides,
            Some(["10px".into(), "20px".into(), "10px".into(), "20px".into()])
        );
        let ok = validate("1px 2px 3px", &padding).unwrap();
        assert_eq!(
            ok.sides,
            Some(["1px".into(), "2px".into(), "3px".into(), "2px".into()])
        );
        assert!(validate("1px 2px 3px 4px 5px", &padding).is_err());
    }

    #[test]
    fn test_math_functions() {
        let ok = validate("calc(100% - 2rem)", &SIZE).unwrap();
        assert_eq!(ok.value_type, ValueType::Function);
        assert!(validate("clamp(1rem, 2vw, 3rem)", &SIZE).is_ok());
        assert!(validate("rgb(1,2,3)", &SIZE).is_err());
    }

    #[test]
    fn test_length_shape() {
        assert!(has_length_shape("16px"));
        assert!(has_length_shape("1.25"));
        assert!(has_length_shape("2rem"));
        assert!(!has_length_shape("red"));
        assert!(!has_length_shape("#fff"));
        assert!(!has_length_shape("45deg"));
    }
}
