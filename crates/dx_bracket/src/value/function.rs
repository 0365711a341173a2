//! Allow-listed CSS functions with arity and per-argument type checks.

use super::color;
use super::length::{ANGLE_UNITS, TIME_UNITS, is_length_unit, parse_dimension, parse_number};
use super::parser::{single_function, split_components, split_top_level};
use super::{ValueRejection, closest_matches};
use crate::safety::ThreatDetector;

pub const TRANSFORM_FUNCTIONS: &[&str] = &[
    "matrix",
    "rotate",
    "rotatex",
    "rotatey",
    "rotatez",
    "scale",
    "scale3d",
    "scalex",
    "scaley",
    "skew",
    "skewx",
    "skewy",
    "translate",
    "translate3d",
    "translatex",
    "translatey",
    "var",
];

pub const FILTER_FUNCTIONS: &[&str] = &[
    "blur",
    "brightness",
    "contrast",
    "drop-shadow",
    "grayscale",
    "hue-rotate",
    "invert",
    "opacity",
    "saturate",
    "sepia",
    "url",
    "var",
];

pub const IMAGE_FUNCTIONS: &[&str] = &[
    "conic-gradient",
    "linear-gradient",
    "radial-gradient",
    "repeating-conic-gradient",
    "repeating-linear-gradient",
    "repeating-radial-gradient",
    "url",
    "var",
];

pub const TRACK_FUNCTIONS: &[&str] = &["fit-content", "minmax", "repeat", "var"];

pub const EASING_FUNCTIONS: &[&str] = &["cubic-bezier", "steps", "var"];

const CALC_FUNCTIONS: &[&str] = &["calc", "min", "max", "clamp", "var"];

const STEP_POSITIONS: &[&str] = &[
    "jump-start",
    "jump-end",
    "jump-none",
    "jump-both",
    "start",
    "end",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arg {
    LengthPercentage { allow_negative: bool },
    Length { allow_negative: bool },
    Angle,
    Number { allow_negative: bool },
    NumberOrPercentage,
}

/// Validates `value` as one call to a function in `allowed`, returning its canonical text.
pub fn validate_function(value: &str, allowed: &[&str]) -> Result<String, ValueRejection> {
    let Some((name, args)) = single_function(value) else {
        return Err(ValueRejection::new(format!("`{value}` is not a function call")));
    };
    let name = name.to_ascii_lowercase();
    if !allowed.contains(&name.as_str()) {
        return Err(
            ValueRejection::new(format!("`{name}()` is not allowed here")).suggest_all(
                closest_matches(&name, allowed.iter().copied(), 3)
                    .into_iter()
                    .map(|f| format!("{f}()")),
            ),
        );
    }
    let args = args.trim();

    match name.as_str() {
        "calc" => validate_calc(args).map(|expr| format!("calc({expr})")),
        "min" | "max" => {
            let parts = comma_args(&name, args, 1, None)?;
            let checked = parts
                .iter()
                .map(|part| check_math_operand(part))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("{name}({})", checked.join(", ")))
        }
        "clamp" => {
            let parts = comma_args(&name, args, 3, Some(3))?;
            let checked = parts
                .iter()
                .map(|part| check_math_operand(part))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("clamp({})", checked.join(", ")))
        }
        "var" => validate_var(args),
        "rgb" | "rgba" | "hsl" | "hsla" | "oklch" => color::validate_color_function(&name, args),
        "rotate" | "rotatex" | "rotatey" | "rotatez" | "skewx" | "skewy" | "hue-rotate" => {
            typed_call(&name, args, 1, 1, Arg::Angle)
        }
        "skew" => typed_call(&name, args, 1, 2, Arg::Angle),
        "translate" => typed_call(&name, args, 1, 2, Arg::LengthPercentage { allow_negative: true }),
        "translatex" | "translatey" => {
            typed_call(&name, args, 1, 1, Arg::LengthPercentage { allow_negative: true })
        }
        "translate3d" => {
            let parts = comma_args(&name, args, 3, Some(3))?;
            let mut checked = Vec::with_capacity(3);
            for (idx, part) in parts.iter().enumerate() {
                let arg = if idx == 2 {
                    Arg::Length { allow_negative: true }
                } else {
                    Arg::LengthPercentage { allow_negative: true }
                };
                checked.push(check_arg(&name, part, arg)?);
            }
            Ok(format!("{name}({})", checked.join(", ")))
        }
        "scale" => typed_call(&name, args, 1, 2, Arg::Number { allow_negative: true }),
        "scalex" | "scaley" => typed_call(&name, args, 1, 1, Arg::Number { allow_negative: true }),
        "scale3d" => typed_call(&name, args, 3, 3, Arg::Number { allow_negative: true }),
        "matrix" => typed_call(&name, args, 6, 6, Arg::Number { allow_negative: true }),
        "blur" => typed_call(&name, args, 1, 1, Arg::Length { allow_negative: false }),
        "brightness" | "contrast" | "grayscale" | "invert" | "opacity" | "saturate" | "sepia" => {
            typed_call(&name, args, 1, 1, Arg::NumberOrPercentage)
        }
        "drop-shadow" => validate_drop_shadow(args),
        "url" => validate_url(args),
        "linear-gradient"
        | "radial-gradient"
        | "conic-gradient"
        | "repeating-linear-gradient"
        | "repeating-radial-gradient"
        | "repeating-conic-gradient" => validate_gradient(&name, args),
        "repeat" => validate_repeat(args),
        "minmax" => {
            let parts = comma_args(&name, args, 2, Some(2))?;
            let checked = parts
                .iter()
                .map(|part| check_track_size(part, false))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("minmax({})", checked.join(", ")))
        }
        "fit-content" => typed_call(&name, args, 1, 1, Arg::LengthPercentage { allow_negative: false }),
        "cubic-bezier" => validate_cubic_bezier(args),
        "steps" => validate_steps(args),
        _ => Err(ValueRejection::new(format!("`{name}()` is not supported"))),
    }
}

fn comma_args<'a>(
    name: &str,
    args: &'a str,
    min: usize,
    max: Option<usize>,
) -> Result<Vec<&'a str>, ValueRejection> {
    let parts = if args.is_empty() { Vec::new() } else { split_top_level(args, ',') };
    if parts.iter().any(|part| part.is_empty()) {
        return Err(ValueRejection::new(format!("`{name}()` has an empty argument")));
    }
    let count = parts.len();
    if count < min || max.is_some_and(|max| count > max) {
        let expected = match max {
            Some(max) if max == min => format!("{min}"),
            Some(max) => format!("{min}-{max}"),
            None => format!("at least {min}"),
        };
        return Err(ValueRejection::new(format!(
            "`{name}()` expects {expected} arguments, found {count}"
        )));
    }
    Ok(parts)
}

fn typed_call(name: &str, args: &str, min: usize, max: usize, arg: Arg) -> Result<String, ValueRejection> {
    let parts = comma_args(name, args, min, Some(max))?;
    let checked = parts
        .iter()
        .map(|part| check_arg(name, part, arg))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{name}({})", checked.join(", ")))
}

fn check_arg(function: &str, text: &str, arg: Arg) -> Result<String, ValueRejection> {
    if let Some((inner, _)) = single_function(text) {
        if CALC_FUNCTIONS.contains(&inner.to_ascii_lowercase().as_str()) {
            return validate_function(text, CALC_FUNCTIONS);
        }
    }
    let invalid = || ValueRejection::new(format!("`{text}` is not a valid argument to `{function}()`"));
    let dim = parse_dimension(text).ok_or_else(invalid)?;
    let unit = dim.unit.to_ascii_lowercase();
    let negative = dim.number < 0.0;
    let ok = match arg {
        Arg::LengthPercentage { allow_negative } => {
            (allow_negative || !negative)
                && (unit == "%" || is_length_unit(&unit) || (unit.is_empty() && dim.number == 0.0))
        }
        Arg::Length { allow_negative } => {
            (allow_negative || !negative) && (is_length_unit(&unit) || (unit.is_empty() && dim.number == 0.0))
        }
        Arg::Angle => ANGLE_UNITS.contains(&unit.as_str()) || (unit.is_empty() && dim.number == 0.0),
        Arg::Number { allow_negative } => unit.is_empty() && (allow_negative || !negative),
        Arg::NumberOrPercentage => (unit.is_empty() || unit == "%") && !negative,
    };
    if !ok {
        return Err(invalid());
    }
    Ok(format!("{}{unit}", dim.number_text.trim_start_matches('+')))
}

/// A `min()`/`max()`/`clamp()` operand: a dimension, a number, or a nested math expression.
fn check_math_operand(text: &str) -> Result<String, ValueRejection> {
    if single_function(text).is_some() {
        return validate_function(text, CALC_FUNCTIONS);
    }
    validate_calc(text)
}

/// Syntactic check of a calc expression: restricted characters, known identifiers, balanced
/// parentheses and no division by a literal zero.
pub fn validate_calc(expr: &str) -> Result<String, ValueRejection> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(ValueRejection::new("calc() is empty"));
    }
    if let Some(bad) = expr.chars().find(|c| {
        !(c.is_ascii_alphanumeric() || c.is_whitespace() || "+-*/().%,".contains(*c))
    }) {
        return Err(ValueRejection::new(format!(
            "`{bad}` is not allowed inside calc()"
        )));
    }

    let chars: Vec<char> = expr.chars().collect();
    let mut depth: i32 = 0;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ValueRejection::new("unbalanced parentheses in calc()"));
                }
            }
            '/' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let literal: String = chars[j..]
                    .iter()
                    .take_while(|c| c.is_ascii_digit() || **c == '.')
                    .collect();
                if !literal.is_empty() && parse_number(&literal) == Some(0.0) {
                    return Err(ValueRejection::new("division by zero in calc()"));
                }
            }
            c if c.is_ascii_alphabetic() || (c == '-' && chars.get(i + 1) == Some(&'-')) => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '-') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect::<String>().to_ascii_lowercase();
                let after_number = start > 0 && (chars[start - 1].is_ascii_digit() || chars[start - 1] == '.');
                let is_call = chars.get(i) == Some(&'(');
                let known = if after_number {
                    is_length_unit(&word) || ANGLE_UNITS.contains(&word.as_str()) || TIME_UNITS.contains(&word.as_str())
                } else if is_call {
                    CALC_FUNCTIONS.contains(&word.as_str())
                } else {
                    word.starts_with("--") || matches!(word.as_str(), "pi" | "e" | "infinity")
                };
                if !known {
                    return Err(ValueRejection::new(format!(
                        "unexpected `{word}` inside calc()"
                    )));
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    if depth != 0 {
        return Err(ValueRejection::new("unbalanced parentheses in calc()"));
    }
    Ok(expr.to_string())
}

/// `var(--name)` or `var(--name, fallback)`.
pub fn validate_var(args: &str) -> Result<String, ValueRejection> {
    let (name, fallback) = match args.split_once(',') {
        Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
        None => (args.trim(), None),
    };
    let valid_name = name.len() > 2
        && name.starts_with("--")
        && name[2..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_name {
        return Err(ValueRejection::new(format!(
            "`{name}` is not a custom property name"
        ))
        .suggest("var(--name)"));
    }
    match fallback {
        None => Ok(format!("var({name})")),
        Some("") => Err(ValueRejection::new("var() fallback is empty")),
        Some(fallback) => {
            if fallback.contains(['{', '}', '<', '>']) || !ThreatDetector::shared().is_safe(fallback) {
                return Err(ValueRejection::new("var() fallback contains disallowed content"));
            }
            Ok(format!("var({name}, {fallback})"))
        }
    }
}

fn validate_url(args: &str) -> Result<String, ValueRejection> {
    let inner = match args.chars().next() {
        Some(q @ ('"' | '\'')) => args
            .strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
            .ok_or_else(|| ValueRejection::new("url() has mismatched quotes"))?,
        _ => {
            if args.contains(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')')) {
                return Err(ValueRejection::new("unquoted url() contains invalid characters"));
            }
            args
        }
    };
    if inner.is_empty() {
        return Err(ValueRejection::new("url() is empty"));
    }
    let report = ThreatDetector::shared().detect(inner);
    if report.risk_level >= crate::safety::RiskLevel::Medium {
        return Err(ValueRejection::new(format!(
            "url() target flagged as unsafe: {}",
            report.summary()
        )));
    }
    if let Some((scheme, _)) = inner.split_once(':') {
        let is_scheme = !scheme.contains('/') && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if is_scheme && !matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https") {
            return Err(ValueRejection::new(format!(
                "url() scheme `{scheme}` is not allowed"
            ))
            .suggest("use a relative path or an http(s) URL"));
        }
    }
    Ok(format!("url({args})"))
}

fn validate_drop_shadow(args: &str) -> Result<String, ValueRejection> {
    let tokens = split_components(args);
    let mut lengths = 0;
    let mut colors = 0;
    let mut normalized = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Ok(len) = check_arg("drop-shadow", token, Arg::Length { allow_negative: lengths < 2 }) {
            lengths += 1;
            normalized.push(len);
        } else if let Ok(color) = color::normalize_color(token) {
            colors += 1;
            normalized.push(color);
        } else {
            return Err(ValueRejection::new(format!(
                "`{token}` is not valid in drop-shadow()"
            )));
        }
    }
    if !(2..=3).contains(&lengths) || colors > 1 {
        return Err(ValueRejection::new(
            "drop-shadow() expects 2-3 lengths and an optional color",
        ));
    }
    Ok(format!("drop-shadow({})", normalized.join(" ")))
}

const GRADIENT_SIDES: &[&str] = &["top", "bottom", "left", "right"];
const RADIAL_SHAPES: &[&str] = &[
    "circle",
    "ellipse",
    "closest-side",
    "closest-corner",
    "farthest-side",
    "farthest-corner",
];
const POSITION_KEYWORDS: &[&str] = &["top", "bottom", "left", "right", "center"];

fn validate_gradient(name: &str, args: &str) -> Result<String, ValueRejection> {
    let parts = comma_args(name, args, 2, None)?;
    let mut normalized = Vec::with_capacity(parts.len());
    let mut stops = 0;

    for (idx, part) in parts.iter().enumerate() {
        if idx == 0 {
            if let Some(lead) = gradient_lead(name, part) {
                normalized.push(lead?);
                continue;
            }
        }
        let tokens = split_components(part);
        let is_last = idx + 1 == parts.len();
        match tokens.as_slice() {
            [hint] if idx > 0 && !is_last && color::normalize_color(hint).is_err() => {
                normalized.push(check_arg(name, hint, Arg::LengthPercentage { allow_negative: true })?);
            }
            [first, positions @ ..] if positions.len() <= 2 => {
                let mut stop = vec![color::normalize_color(first)?];
                for position in positions {
                    stop.push(check_arg(name, position, Arg::LengthPercentage { allow_negative: true })?);
                }
                stops += 1;
                normalized.push(stop.join(" "));
            }
            _ => {
                return Err(ValueRejection::new(format!(
                    "`{part}` is not a valid color stop"
                )));
            }
        }
    }
    if stops < 2 {
        return Err(ValueRejection::new(format!(
            "`{name}()` needs at least two color stops"
        )));
    }
    Ok(format!("{name}({})", normalized.join(", ")))
}

/// The optional first argument: direction or angle, radial shape, or conic origin.
fn gradient_lead(name: &str, part: &str) -> Option<Result<String, ValueRejection>> {
    let tokens = split_components(part);
    let first = tokens.first()?.to_ascii_lowercase();
    let lowered: Vec<String> = tokens.iter().map(|t| t.to_ascii_lowercase()).collect();

    if name.contains("linear") {
        if first == "to" {
            let sides = &lowered[1..];
            let ok = (1..=2).contains(&sides.len()) && sides.iter().all(|s| GRADIENT_SIDES.contains(&s.as_str()));
            return Some(if ok {
                Ok(lowered.join(" "))
            } else {
                Err(ValueRejection::new(format!("`{part}` is not a valid gradient direction")))
            });
        }
        if tokens.len() == 1 && color::normalize_color(tokens[0]).is_err() {
            return Some(check_arg(name, tokens[0], Arg::Angle));
        }
        return None;
    }

    let is_position_token =
        |t: &String| POSITION_KEYWORDS.contains(&t.as_str()) || check_arg(name, t, Arg::LengthPercentage { allow_negative: true }).is_ok();
    if name.contains("radial") {
        let at = lowered.iter().position(|t| t == "at").unwrap_or(lowered.len());
        let (shape, position) = lowered.split_at(at);
        let shape_ok = shape
            .iter()
            .all(|t| RADIAL_SHAPES.contains(&t.as_str()) || check_arg(name, t, Arg::Length { allow_negative: false }).is_ok());
        let looks_like_lead = RADIAL_SHAPES.contains(&first.as_str()) || first == "at";
        if !looks_like_lead {
            return None;
        }
        let position_ok = position.is_empty() || (position.len() > 1 && position[1..].iter().all(is_position_token));
        return Some(if shape_ok && position_ok {
            Ok(lowered.join(" "))
        } else {
            Err(ValueRejection::new(format!("`{part}` is not a valid radial gradient shape")))
        });
    }

    // conic
    if first == "from" || first == "at" {
        let mut rest = lowered.iter().skip(1);
        let ok = if first == "from" {
            let angle_ok = rest.next().is_some_and(|a| check_arg(name, a, Arg::Angle).is_ok());
            let remaining: Vec<&String> = rest.collect();
            angle_ok
                && (remaining.is_empty()
                    || (remaining[0] == "at" && remaining.len() > 1 && remaining[1..].iter().all(|t| is_position_token(t))))
        } else {
            let remaining: Vec<&String> = rest.collect();
            !remaining.is_empty() && remaining.iter().all(|t| is_position_token(t))
        };
        return Some(if ok {
            Ok(lowered.join(" "))
        } else {
            Err(ValueRejection::new(format!("`{part}` is not a valid conic gradient origin")))
        });
    }
    None
}

fn validate_repeat(args: &str) -> Result<String, ValueRejection> {
    let Some((count, tracks)) = args.split_once(',') else {
        return Err(ValueRejection::new("repeat() expects a count and a track list"));
    };
    let count = count.trim().to_ascii_lowercase();
    let count_ok = matches!(count.as_str(), "auto-fill" | "auto-fit")
        || (count.chars().all(|c| c.is_ascii_digit()) && count.parse::<u32>().is_ok_and(|n| n > 0));
    if !count_ok {
        return Err(ValueRejection::new(format!(
            "`{count}` is not a valid repeat() count"
        ))
        .suggest("a positive integer, auto-fill or auto-fit"));
    }
    let tracks = split_components(tracks);
    if tracks.is_empty() {
        return Err(ValueRejection::new("repeat() track list is empty"));
    }
    let checked = tracks
        .iter()
        .map(|track| check_track_size(track, true))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("repeat({count}, {})", checked.join(" ")))
}

/// One grid track size: length-percentage, `fr`, sizing keyword, or a track function.
pub fn check_track_size(token: &str, allow_functions: bool) -> Result<String, ValueRejection> {
    let lower = token.to_ascii_lowercase();
    if matches!(lower.as_str(), "auto" | "min-content" | "max-content") {
        return Ok(lower);
    }
    if single_function(token).is_some() {
        if !allow_functions {
            let allowed: &[&str] = &["fit-content", "calc", "min", "max", "clamp", "var"];
            return validate_function(token, allowed);
        }
        let mut allowed = TRACK_FUNCTIONS.to_vec();
        allowed.extend(["calc", "min", "max", "clamp"]);
        return validate_function(token, &allowed);
    }
    check_arg("grid track", token, Arg::LengthPercentage { allow_negative: false })
}

fn validate_cubic_bezier(args: &str) -> Result<String, ValueRejection> {
    let parts = comma_args("cubic-bezier", args, 4, Some(4))?;
    let mut checked = Vec::with_capacity(4);
    for (idx, part) in parts.iter().enumerate() {
        let number = parse_number(part).ok_or_else(|| {
            ValueRejection::new(format!("`{part}` is not a number in cubic-bezier()"))
        })?;
        if idx % 2 == 0 && !(0.0..=1.0).contains(&number) {
            return Err(ValueRejection::new(format!(
                "cubic-bezier() x values must be in [0, 1], found `{part}`"
            )));
        }
        checked.push(part.trim_start_matches('+').to_string());
    }
    Ok(format!("cubic-bezier({})", checked.join(", ")))
}

fn validate_steps(args: &str) -> Result<String, ValueRejection> {
    let parts = comma_args("steps", args, 1, Some(2))?;
    let count_ok = parts[0].chars().all(|c| c.is_ascii_digit()) && parts[0].parse::<u32>().is_ok_and(|n| n > 0);
    if !count_ok {
        return Err(ValueRejection::new(format!(
            "steps() count must be a positive integer, found `{}`",
            parts[0]
        )));
    }
    match parts.get(1) {
        None => Ok(format!("steps({})", parts[0])),
        Some(position) => {
            let position = position.to_ascii_lowercase();
            if !STEP_POSITIONS.contains(&position.as_str()) {
                return Err(ValueRejection::new(format!(
                    "`{position}` is not a steps() position"
                ))
                .suggest_all(closest_matches(&position, STEP_POSITIONS.iter().copied(), 2)));
            }
            Ok(format!("steps({}, {position})", parts[0]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check(value: &str, allowed: &[&str]) -> Result<String, ValueRejection> {
        validate_function(value, allowed)
    }

    #[test]
    fn test_calc() {
        assert_eq!(check("calc(100% - 2rem)", CALC_FUNCTIONS).unwrap(), "calc(100% - 2rem)");
        assert!(check("calc((1px + 2px) * 3)", CALC_FUNCTIONS).is_ok());
        assert!(check("calc(var(--gap) * 2)", CALC_FUNCTIONS).is_ok());
        assert!(check("calc(10px / 0)", CALC_FUNCTIONS).is_err());
        assert!(check("calc(10px / 0.0)", CALC_FUNCTIONS).is_err());
        assert!(check("calc(10px / 2)", CALC_FUNCTIONS).is_ok());
        assert!(check("calc()", CALC_FUNCTIONS).is_err());
        assert!(check("calc(1px + foo)", CALC_FUNCTIONS).is_err());
        assert!(check("calc(1px + alert(1))", CALC_FUNCTIONS).is_err());
        assert!(check("calc(1px + 'x')", CALC_FUNCTIONS).is_err());
    }

    #[test]
    fn test_min_max_clamp() {
        assert_eq!(
            check("clamp(1rem,2vw,3rem)", CALC_FUNCTIONS).unwrap(),
            "clamp(1rem, 2vw, 3rem)"
        );
        assert!(check("clamp(1rem, 2vw)", CALC_FUNCTIONS).is_err());
        assert!(check("min(10px, 5vw)", CALC_FUNCTIONS).is_ok());
        assert!(check("max(calc(1px + 2px), 3px)", CALC_FUNCTIONS).is_ok());
    }

    #[test]
    fn test_var() {
        assert_eq!(validate_var("--brand").unwrap(), "var(--brand)");
        assert_eq!(validate_var("--gap, 4px").unwrap(), "var(--gap, 4px)");
        assert!(validate_var("brand").is_err());
        assert!(validate_var("--").is_err());
        assert!(validate_var("--x,").is_err());
        assert!(validate_var("--x, expression(1)").is_err());
    }

    #[test]
    fn test_transform_functions() {
        assert_eq!(check("rotate(45DEG)", TRANSFORM_FUNCTIONS).unwrap(), "rotate(45deg)");
        assert!(check("rotate(45px)", TRANSFORM_FUNCTIONS).is_err());
        assert_eq!(
            check("translate(10px,-50%)", TRANSFORM_FUNCTIONS).unwrap(),
            "translate(10px, -50%)"
        );
        assert!(check("scale(1.5)", TRANSFORM_FUNCTIONS).is_ok());
        assert!(check("matrix(1,0,0,1,0)", TRANSFORM_FUNCTIONS).is_err());
        assert!(check("blur(2px)", TRANSFORM_FUNCTIONS).is_err());
    }

    #[test]
    fn test_filter_functions() {
        assert!(check("blur(4px)", FILTER_FUNCTIONS).is_ok());
        assert!(check("blur(-4px)", FILTER_FUNCTIONS).is_err());
        assert!(check("brightness(120%)", FILTER_FUNCTIONS).is_ok());
        assert!(check("grayscale(1)", FILTER_FUNCTIONS).is_ok());
        assert!(check("hue-rotate(90deg)", FILTER_FUNCTIONS).is_ok());
        assert_eq!(
            check("drop-shadow(0 2px 4px #000)", FILTER_FUNCTIONS).unwrap(),
            "drop-shadow(0 2px 4px #000000)"
        );
    }

    #[test]
    fn test_url() {
        assert!(check("url(/img/bg.png)", IMAGE_FUNCTIONS).is_ok());
        assert!(check("url('https://example.com/a.png')", IMAGE_FUNCTIONS).is_ok());
        assert!(check("url(file:///etc/passwd)", IMAGE_FUNCTIONS).is_err());
        assert!(check("url(ftp://x/y)", IMAGE_FUNCTIONS).is_err());
        assert!(check("url(a b)", IMAGE_FUNCTIONS).is_err());
    }

    #[test]
    fn test_gradients() {
        assert_eq!(
            check("linear-gradient(to right, #FFF, red 50%)", IMAGE_FUNCTIONS).unwrap(),
            "linear-gradient(to right, #ffffff, red 50%)"
        );
        assert!(check("linear-gradient(45deg, red, blue)", IMAGE_FUNCTIONS).is_ok());
        assert!(check("linear-gradient(red, 30%, blue)", IMAGE_FUNCTIONS).is_ok());
        assert!(check("radial-gradient(circle at center, red, blue)", IMAGE_FUNCTIONS).is_ok());
        assert!(check("conic-gradient(from 90deg, red, blue)", IMAGE_FUNCTIONS).is_ok());
        assert!(check("linear-gradient(red)", IMAGE_FUNCTIONS).is_err());
        assert!(check("linear-gradient(to middle, red, blue)", IMAGE_FUNCTIONS).is_err());
        assert!(check("linear-gradient(red, notacolor)", IMAGE_FUNCTIONS).is_err());
    }

    #[test]
    fn test_grid_functions() {
        assert_eq!(
            check_track_size("repeat(3,minmax(0,1fr))", true).unwrap(),
            "repeat(3, minmax(0, 1fr))"
        );
        assert!(check_track_size("repeat(auto-fill, 200px)", true).is_ok());
        assert!(check_track_size("repeat(0, 1fr)", true).is_err());
        assert!(check_track_size("fit-content(200px)", true).is_ok());
        assert!(check_track_size("-1fr", true).is_err());
    }

    #[test]
    fn test_easing_functions() {
        assert!(check("cubic-bezier(0.4, 0, 0.2, 1)", EASING_FUNCTIONS).is_ok());
        assert!(check("cubic-bezier(1.4, 0, 0.2, 1)", EASING_FUNCTIONS).is_err());
        assert!(check("cubic-bezier(0.4, -2, 0.2, 3)", EASING_FUNCTIONS).is_ok());
        assert_eq!(check("steps(4, JUMP-END)", EASING_FUNCTIONS).unwrap(), "steps(4, jump-end)");
        assert!(check("steps(0)", EASING_FUNCTIONS).is_err());
        assert!(check("steps(4, middle)", EASING_FUNCTIONS).is_err());
    }

    #[test]
    fn test_disallowed_function_suggests() {
        let err = check("rotat(45deg)", TRANSFORM_FUNCTIONS).unwrap_err();
        assert!(err.suggestions.contains(&"rotate()".to_string()));
    }
}
