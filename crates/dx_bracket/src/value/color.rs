//! Color values: hex, rgb/hsl in legacy and modern syntax, oklch and named colors.
//!
//! Out-of-range channels are rejected rather than clamped, so a typo never silently turns
//! into a different color.

use super::length::parse_dimension;
use super::parser::{single_function, split_components, split_top_level};
use super::{ValidatedValue, ValidationOutcome, ValueRejection, ValueType, closest_matches};

// Sorted for binary_search
const CSS_COLOR_KEYWORDS: &[&str] = &[
    "aliceblue",
    "antiquewhite",
    "aqua",
    "aquamarine",
    "azure",
    "beige",
    "bisque",
    "black",
    "blanchedalmond",
    "blue",
    "blueviolet",
    "brown",
    "burlywood",
    "cadetblue",
    "chartreuse",
    "chocolate",
    "coral",
    "cornflowerblue",
    "cornsilk",
    "crimson",
    "cyan",
    "darkblue",
    "darkcyan",
    "darkgoldenrod",
    "darkgray",
    "darkgreen",
    "darkgrey",
    "darkkhaki",
    "darkmagenta",
    "darkolivegreen",
    "darkorange",
    "darkorchid",
    "darkred",
    "darksalmon",
    "darkseagreen",
    "darkslateblue",
    "darkslategray",
    "darkslategrey",
    "darkturquoise",
    "darkviolet",
    "deeppink",
    "deepskyblue",
    "dimgray",
    "dimgrey",
    "dodgerblue",
    "firebrick",
    "floralwhite",
    "forestgreen",
    "fuchsia",
    "gainsboro",
    "ghostwhite",
    "gold",
    "goldenrod",
    "gray",
    "green",
    "greenyellow",
    "grey",
    "honeydew",
    "hotpink",
    "indianred",
    "indigo",
    "ivory",
    "khaki",
    "lavender",
    "lavenderblush",
    "lawngreen",
    "lemonchiffon",
    "lightblue",
    "lightcoral",
    "lightcyan",
    "lightgoldenrodyellow",
    "lightgray",
    "lightgreen",
    "lightgrey",
    "lightpink",
    "lightsalmon",
    "lightseagreen",
    "lightskyblue",
    "lightslategray",
    "lightslategrey",
    "lightsteelblue",
    "lightyellow",
    "lime",
    "limegreen",
    "linen",
    "magenta",
    "maroon",
    "mediumaquamarine",
    "mediumblue",
    "mediumorchid",
    "mediumpurple",
    "mediumseagreen",
    "mediumslateblue",
    "mediumspringgreen",
    "mediumturquoise",
    "mediumvioletred",
    "midnightblue",
    "mintcream",
    "mistyrose",
    "moccasin",
    "navajowhite",
    "navy",
    "oldlace",
    "olive",
    "olivedrab",
    "orange",
    "orangered",
    "orchid",
    "palegoldenrod",
    "palegreen",
    "paleturquoise",
    "palevioletred",
    "papayawhip",
    "peachpuff",
    "peru",
    "pink",
    "plum",
    "powderblue",
    "purple",
    "rebeccapurple",
    "red",
    "rosybrown",
    "royalblue",
    "saddlebrown",
    "salmon",
    "sandybrown",
    "seagreen",
    "seashell",
    "sienna",
    "silver",
    "skyblue",
    "slateblue",
    "slategray",
    "slategrey",
    "snow",
    "springgreen",
    "steelblue",
    "tan",
    "teal",
    "thistle",
    "tomato",
    "turquoise",
    "violet",
    "wheat",
    "white",
    "whitesmoke",
    "yellow",
    "yellowgreen",
];

const SPECIAL_COLOR_KEYWORDS: &[&str] = &["transparent", "currentcolor"];

pub const COLOR_FUNCTIONS: &[&str] = &["rgb", "rgba", "hsl", "hsla", "oklch"];

pub fn is_named_color(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    CSS_COLOR_KEYWORDS.binary_search(&lower.as_str()).is_ok()
        || SPECIAL_COLOR_KEYWORDS.contains(&lower.as_str())
}

pub fn validate(value: &str) -> ValidationOutcome {
    normalize_color(value.trim()).map(|normalized| ValidatedValue::single(normalized, ValueType::Color))
}

pub fn is_color(value: &str) -> bool {
    normalize_color(value.trim()).is_ok()
}

/// Canonical text for any accepted color.
pub fn normalize_color(value: &str) -> Result<String, ValueRejection> {
    if value.starts_with('#') {
        return normalize_hex(value).ok_or_else(|| {
            ValueRejection::new(format!("`{value}` is not a valid hex color"))
                .suggest("use 3, 6 or 8 hex digits, e.g. #fff or #ffffff")
        });
    }

    if let Some((name, args)) = single_function(value) {
        return validate_color_function(name, args);
    }

    let lower = value.to_ascii_lowercase();
    if is_named_color(&lower) {
        return Ok(lower);
    }

    let mut rejection = ValueRejection::new(format!("`{value}` is not a valid color"));
    if matches!(lower.len(), 3 | 6 | 8) && lower.chars().all(|c| c.is_ascii_hexdigit()) {
        rejection = rejection.suggest(format!("#{lower}"));
    }
    let candidates = CSS_COLOR_KEYWORDS
        .iter()
        .chain(SPECIAL_COLOR_KEYWORDS)
        .copied();
    Err(rejection.suggest_all(closest_matches(&lower, candidates, 3)))
}

/// Lowercases and expands 3-digit hex. Idempotent on its own output.
pub fn normalize_hex(value: &str) -> Option<String> {
    let digits = value.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let lower = digits.to_ascii_lowercase();
    match lower.len() {
        3 => {
            let mut out = String::with_capacity(7);
            out.push('#');
            for c in lower.chars() {
                out.push(c);
                out.push(c);
            }
            Some(out)
        }
        6 | 8 => Some(format!("#{lower}")),
        _ => None,
    }
}

enum Channel {
    /// 0..=255, or 0..=100 as a percentage.
    Rgb,
    /// Unitless or `deg`, 0..=360.
    Hue,
    /// Percentage 0..=100.
    Percent,
    /// 0..=1, or 0..=100 as a percentage.
    Alpha,
    /// oklch lightness: 0..=1, or 0..=100 as a percentage.
    Lightness,
    /// oklch chroma: non-negative.
    Chroma,
    /// oklch hue: any finite angle.
    FreeHue,
}

pub fn validate_color_function(name: &str, args: &str) -> Result<String, ValueRejection> {
    let name = name.to_ascii_lowercase();
    let channels: [Channel; 3] = match name.as_str() {
        "rgb" | "rgba" => [Channel::Rgb, Channel::Rgb, Channel::Rgb],
        "hsl" | "hsla" => [Channel::Hue, Channel::Percent, Channel::Percent],
        "oklch" => [Channel::Lightness, Channel::Chroma, Channel::FreeHue],
        _ => {
            return Err(ValueRejection::new(format!("`{name}()` is not a supported color function"))
                .suggest_all(closest_matches(&name, COLOR_FUNCTIONS.iter().copied(), 2)));
        }
    };

    let legacy = args.contains(',');
    if legacy && name == "oklch" {
        return Err(ValueRejection::new("oklch() takes space-separated channels"));
    }

    let (parts, alpha): (Vec<&str>, Option<&str>) = if legacy {
        let mut parts = split_top_level(args, ',');
        let alpha = if parts.len() == 4 { parts.pop() } else { None };
        (parts, alpha)
    } else {
        let mut halves = split_top_level(args, '/');
        if halves.len() > 2 {
            return Err(ValueRejection::new(format!("`{name}()` has more than one `/`")));
        }
        let alpha = if halves.len() == 2 { halves.pop() } else { None };
        (split_components(halves[0]), alpha)
    };

    if parts.len() != 3 {
        return Err(ValueRejection::new(format!(
            "`{name}()` expects 3 channels plus optional alpha, found {}",
            parts.len() + usize::from(alpha.is_some())
        )));
    }

    let mut normalized: Vec<String> = Vec::with_capacity(4);
    for (part, channel) in parts.iter().zip(channels.iter()) {
        normalized.push(check_channel(&name, part, channel)?);
    }
    let alpha = match alpha {
        Some(alpha) => Some(check_channel(&name, alpha, &Channel::Alpha)?),
        None => None,
    };

    Ok(if legacy {
        let mut all = normalized;
        all.extend(alpha);
        format!("{name}({})", all.join(", "))
    } else {
        match alpha {
            Some(alpha) => format!("{name}({} / {alpha})", normalized.join(" ")),
            None => format!("{name}({})", normalized.join(" ")),
        }
    })
}

fn check_channel(function: &str, text: &str, channel: &Channel) -> Result<String, ValueRejection> {
    let text = text.trim();
    let Some(dim) = parse_dimension(text) else {
        return Err(ValueRejection::new(format!(
            "`{text}` is not a valid channel in `{function}()`"
        )));
    };
    let unit = dim.unit.to_ascii_lowercase();
    let n = dim.number;
    let (ok, range) = match (channel, unit.as_str()) {
        (Channel::Rgb, "") => ((0.0..=255.0).contains(&n), "0-255"),
        (Channel::Rgb | Channel::Percent | Channel::Alpha | Channel::Lightness, "%") => {
            ((0.0..=100.0).contains(&n), "0%-100%")
        }
        (Channel::Hue, "" | "deg") => ((0.0..=360.0).contains(&n), "0-360"),
        (Channel::Percent, "") => ((0.0..=100.0).contains(&n), "0-100"),
        (Channel::Alpha | Channel::Lightness, "") => ((0.0..=1.0).contains(&n), "0-1"),
        (Channel::Chroma, "" | "%") => (n >= 0.0, ">= 0"),
        (Channel::FreeHue, "" | "deg" | "rad" | "grad" | "turn") => (true, "any angle"),
        _ => {
            return Err(ValueRejection::new(format!(
                "unit `{}` is not allowed for this channel of `{function}()`",
                dim.unit
            )));
        }
    };
    if !ok {
        return Err(ValueRejection::new(format!(
            "`{text}` is out of range ({range}) in `{function}()`"
        )));
    }
    Ok(format!("{}{unit}", dim.number_text.trim_start_matches('+')))
}
