//! Static lookup data behind small traits: prefixes, property value specs, breakpoints and
//! pseudo-class variants.
//!
//! The defaults cover the common utility vocabulary. Callers with their own design system
//! implement the traits and hand them to the compiler.

use std::sync::Arc;

use ahash::AHashMap;

use crate::value::{ComplexGrammar, LengthRules, NumberRules, PropertySpec, ValueKind};

/// Shape test that moves an overloaded prefix to its alternate property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// A number with a length unit, or a unitless number.
    Length,
    /// `url(...)` or a gradient function.
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overload {
    pub shape: ValueShape,
    pub property: String,
}

/// What a prefix maps to before the value is looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule {
    pub property: String,
    pub overload: Option<Overload>,
}

pub trait PropertyTable: Send + Sync {
    fn lookup(&self, prefix: &str) -> Option<PrefixRule>;

    fn spec(&self, property: &str) -> Option<PropertySpec>;

    fn prefixes(&self) -> Vec<String>;
}

pub trait BreakpointTable: Send + Sync {
    /// Minimum viewport width in pixels.
    fn min_width(&self, name: &str) -> Option<u32>;

    fn names(&self) -> Vec<String>;
}

pub trait VariantTable: Send + Sync {
    /// Selector suffix such as `:hover` or `::placeholder`.
    fn pseudo(&self, name: &str) -> Option<String>;

    fn names(&self) -> Vec<String>;
}

const SIZE_KEYWORDS: &[&str] = &["auto", "min-content", "max-content", "fit-content"];
const MAX_SIZE_KEYWORDS: &[&str] = &["none", "min-content", "max-content", "fit-content"];
const BASIS_KEYWORDS: &[&str] = &["auto", "content", "min-content", "max-content", "fit-content"];
const AUTO: &[&str] = &["auto"];
const NORMAL: &[&str] = &["normal"];
const BORDER_WIDTH_KEYWORDS: &[&str] = &["thin", "medium", "thick"];
const FONT_SIZE_KEYWORDS: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "xxx-large",
    "smaller", "larger",
];
const FONT_WEIGHT_KEYWORDS: &[&str] = &["normal", "bold", "bolder", "lighter"];

const SPACING: LengthRules = LengthRules::new();
const SPACING_4: LengthRules = LengthRules::new().components(4);
const SPACING_2: LengthRules = LengthRules::new().components(2);
const MARGIN: LengthRules = LengthRules::new().negative().keywords(AUTO);
const MARGIN_4: LengthRules = MARGIN.components(4);
const MARGIN_2: LengthRules = MARGIN.components(2);
const SIZE: LengthRules = LengthRules::new().keywords(SIZE_KEYWORDS);
const MAX_SIZE: LengthRules = LengthRules::new().keywords(MAX_SIZE_KEYWORDS);

// (property, spec)
const PROPERTY_SPECS: &[(&str, PropertySpec)] = &[
    ("padding", PropertySpec::new(ValueKind::Length(SPACING_4))),
    ("padding-inline", PropertySpec::new(ValueKind::Length(SPACING_2))),
    ("padding-block", PropertySpec::new(ValueKind::Length(SPACING_2))),
    ("padding-top", PropertySpec::new(ValueKind::Length(SPACING))),
    ("padding-right", PropertySpec::new(ValueKind::Length(SPACING))),
    ("padding-bottom", PropertySpec::new(ValueKind::Length(SPACING))),
    ("padding-left", PropertySpec::new(ValueKind::Length(SPACING))),
    ("padding-inline-start", PropertySpec::new(ValueKind::Length(SPACING))),
    ("padding-inline-end", PropertySpec::new(ValueKind::Length(SPACING))),
    ("margin", PropertySpec::new(ValueKind::Length(MARGIN_4))),
    ("margin-inline", PropertySpec::new(ValueKind::Length(MARGIN_2))),
    ("margin-block", PropertySpec::new(ValueKind::Length(MARGIN_2))),
    ("margin-top", PropertySpec::new(ValueKind::Length(MARGIN))),
    ("margin-right", PropertySpec::new(ValueKind::Length(MARGIN))),
    ("margin-bottom", PropertySpec::new(ValueKind::Length(MARGIN))),
    ("margin-left", PropertySpec::new(ValueKind::Length(MARGIN))),
    ("margin-inline-start", PropertySpec::new(ValueKind::Length(MARGIN))),
    ("margin-inline-end", PropertySpec::new(ValueKind::Length(MARGIN))),
    ("width", PropertySpec::new(ValueKind::Length(SIZE))),
    ("height", PropertySpec::new(ValueKind::Length(SIZE))),
    ("min-width", PropertySpec::new(ValueKind::Length(SIZE))),
    ("min-height", PropertySpec::new(ValueKind::Length(SIZE))),
    ("max-width", PropertySpec::new(ValueKind::Length(MAX_SIZE))),
    ("max-height", PropertySpec::new(ValueKind::Length(MAX_SIZE))),
    ("gap", PropertySpec::new(ValueKind::Length(SPACING_2.keywords(NORMAL)))),
    ("column-gap", PropertySpec::new(ValueKind::Length(SPACING.keywords(NORMAL)))),
    ("row-gap", PropertySpec::new(ValueKind::Length(SPACING.keywords(NORMAL)))),
    ("inset", PropertySpec::new(ValueKind::Length(MARGIN_4))),
    ("top", PropertySpec::new(ValueKind::Length(MARGIN))),
    ("right", PropertySpec::new(ValueKind::Length(MARGIN))),
    ("bottom", PropertySpec::new(ValueKind::Length(MARGIN))),
    ("left", PropertySpec::new(ValueKind::Length(MARGIN))),
    ("color", PropertySpec::new(ValueKind::Color)),
    ("background-color", PropertySpec::new(ValueKind::Color)),
    ("border-color", PropertySpec::new(ValueKind::Color)),
    ("outline-color", PropertySpec::new(ValueKind::Color)),
    ("fill", PropertySpec::new(ValueKind::Color)),
    ("stroke", PropertySpec::new(ValueKind::Color)),
    ("caret-color", PropertySpec::new(ValueKind::Color)),
    ("accent-color", PropertySpec::new(ValueKind::Color)),
    ("text-decoration-color", PropertySpec::new(ValueKind::Color)),
    ("background-image", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Image))),
    (
        "font-size",
        PropertySpec::new(ValueKind::Length(LengthRules::new().keywords(FONT_SIZE_KEYWORDS))),
    ),
    (
        "font-weight",
        PropertySpec::new(ValueKind::Number(
            NumberRules::new().range(1.0, 1000.0).keywords(FONT_WEIGHT_KEYWORDS),
        )),
    ),
    ("font-family", PropertySpec::new(ValueKind::Complex(ComplexGrammar::FontFamily))),
    (
        "line-height",
        PropertySpec::new(ValueKind::Length(LengthRules::new().unitless().keywords(NORMAL))),
    ),
    (
        "letter-spacing",
        PropertySpec::new(ValueKind::Length(LengthRules::new().negative().keywords(NORMAL))),
    ),
    ("text-indent", PropertySpec::new(ValueKind::Length(LengthRules::new().negative()))),
    (
        "border-width",
        PropertySpec::new(ValueKind::Length(
            LengthRules::new().keywords(BORDER_WIDTH_KEYWORDS).components(4),
        )),
    ),
    ("border-radius", PropertySpec::new(ValueKind::Length(SPACING_4))),
    ("outline-width", PropertySpec::new(ValueKind::Length(LengthRules::new().keywords(BORDER_WIDTH_KEYWORDS)))),
    ("outline-offset", PropertySpec::new(ValueKind::Length(LengthRules::new().negative()))),
    (
        "opacity",
        PropertySpec::new(ValueKind::Number(NumberRules::new().range(0.0, 1.0).percentage())),
    ),
    (
        "z-index",
        PropertySpec::new(ValueKind::Number(NumberRules::new().negative().integer().keywords(AUTO))),
    ),
    ("order", PropertySpec::new(ValueKind::Number(NumberRules::new().negative().integer()))),
    ("flex-grow", PropertySpec::new(ValueKind::Number(NumberRules::new()))),
    ("flex-shrink", PropertySpec::new(ValueKind::Number(NumberRules::new()))),
    ("flex-basis", PropertySpec::new(ValueKind::Length(LengthRules::new().keywords(BASIS_KEYWORDS)))),
    ("flex", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Free))),
    (
        "grid-template-columns",
        PropertySpec::new(ValueKind::Complex(ComplexGrammar::GridTracks)),
    ),
    (
        "grid-template-rows",
        PropertySpec::new(ValueKind::Complex(ComplexGrammar::GridTracks)),
    ),
    ("box-shadow", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Shadow))),
    ("transition", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Transition))),
    ("transition-duration", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Time))),
    ("transition-delay", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Time))),
    (
        "transition-timing-function",
        PropertySpec::new(ValueKind::Complex(ComplexGrammar::Easing)),
    ),
    ("rotate", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Angle))),
    ("transform", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Transform))),
    ("filter", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Filter))),
    ("backdrop-filter", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Filter))),
    ("aspect-ratio", PropertySpec::new(ValueKind::Complex(ComplexGrammar::Ratio))),
    (
        "display",
        PropertySpec::new(ValueKind::Keyword(&[
            "block",
            "inline",
            "inline-block",
            "flex",
            "inline-flex",
            "grid",
            "inline-grid",
            "contents",
            "flow-root",
            "table",
            "table-row",
            "table-cell",
            "list-item",
            "none",
        ])),
    ),
    (
        "cursor",
        PropertySpec::new(ValueKind::Keyword(&[
            "auto",
            "default",
            "pointer",
            "wait",
            "text",
            "move",
            "help",
            "not-allowed",
            "none",
            "context-menu",
            "progress",
            "cell",
            "crosshair",
            "vertical-text",
            "alias",
            "copy",
            "no-drop",
            "grab",
            "grabbing",
            "all-scroll",
            "col-resize",
            "row-resize",
            "zoom-in",
            "zoom-out",
        ])),
    ),
    (
        "overflow",
        PropertySpec::new(ValueKind::Keyword(&["auto", "hidden", "clip", "visible", "scroll"])),
    ),
    (
        "position",
        PropertySpec::new(ValueKind::Keyword(&["static", "fixed", "absolute", "relative", "sticky"])),
    ),
    (
        "object-fit",
        PropertySpec::new(ValueKind::Keyword(&["contain", "cover", "fill", "none", "scale-down"])),
    ),
    (
        "white-space",
        PropertySpec::new(ValueKind::Keyword(&[
            "normal",
            "nowrap",
            "pre",
            "pre-line",
            "pre-wrap",
            "break-spaces",
        ])),
    ),
    (
        "align-items",
        PropertySpec::new(ValueKind::Keyword(&[
            "normal",
            "flex-start",
            "flex-end",
            "start",
            "end",
            "center",
            "baseline",
            "stretch",
        ])),
    ),
    (
        "align-self",
        PropertySpec::new(ValueKind::Keyword(&[
            "auto",
            "flex-start",
            "flex-end",
            "start",
            "end",
            "center",
            "baseline",
            "stretch",
        ])),
    ),
    (
        "justify-content",
        PropertySpec::new(ValueKind::Keyword(&[
            "normal",
            "flex-start",
            "flex-end",
            "start",
            "end",
            "center",
            "left",
            "right",
            "space-between",
            "space-around",
            "space-evenly",
            "stretch",
        ])),
    ),
    (
        "visibility",
        PropertySpec::new(ValueKind::Keyword(&["visible", "hidden", "collapse"])),
    ),
];

// (prefix, property)
const PREFIXES: &[(&str, &str)] = &[
    ("p", "padding"),
    ("px", "padding-inline"),
    ("py", "padding-block"),
    ("pt", "padding-top"),
    ("pr", "padding-right"),
    ("pb", "padding-bottom"),
    ("pl", "padding-left"),
    ("ps", "padding-inline-start"),
    ("pe", "padding-inline-end"),
    ("m", "margin"),
    ("mx", "margin-inline"),
    ("my", "margin-block"),
    ("mt", "margin-top"),
    ("mr", "margin-right"),
    ("mb", "margin-bottom"),
    ("ml", "margin-left"),
    ("ms", "margin-inline-start"),
    ("me", "margin-inline-end"),
    ("w", "width"),
    ("h", "height"),
    ("min-w", "min-width"),
    ("min-h", "min-height"),
    ("max-w", "max-width"),
    ("max-h", "max-height"),
    ("gap", "gap"),
    ("gap-x", "column-gap"),
    ("gap-y", "row-gap"),
    ("inset", "inset"),
    ("top", "top"),
    ("right", "right"),
    ("bottom", "bottom"),
    ("left", "left"),
    ("text", "color"),
    ("bg", "background-color"),
    ("border-color", "border-color"),
    ("outline-color", "outline-color"),
    ("fill", "fill"),
    ("stroke", "stroke"),
    ("caret", "caret-color"),
    ("accent", "accent-color"),
    ("decoration", "text-decoration-color"),
    ("font", "font-weight"),
    ("font-family", "font-family"),
    ("leading", "line-height"),
    ("tracking", "letter-spacing"),
    ("indent", "text-indent"),
    ("border", "border-width"),
    ("rounded", "border-radius"),
    ("outline", "outline-width"),
    ("outline-offset", "outline-offset"),
    ("opacity", "opacity"),
    ("z", "z-index"),
    ("order", "order"),
    ("grow", "flex-grow"),
    ("shrink", "flex-shrink"),
    ("basis", "flex-basis"),
    ("flex", "flex"),
    ("grid-cols", "grid-template-columns"),
    ("grid-rows", "grid-template-rows"),
    ("shadow", "box-shadow"),
    ("transition", "transition"),
    ("duration", "transition-duration"),
    ("delay", "transition-delay"),
    ("ease", "transition-timing-function"),
    ("rotate", "rotate"),
    ("transform", "transform"),
    ("filter", "filter"),
    ("backdrop", "backdrop-filter"),
    ("aspect", "aspect-ratio"),
    ("display", "display"),
    ("cursor", "cursor"),
    ("overflow", "overflow"),
    ("position", "position"),
    ("object", "object-fit"),
    ("whitespace", "white-space"),
    ("items", "align-items"),
    ("self", "align-self"),
    ("justify", "justify-content"),
    ("visibility", "visibility"),
];

/// The bundled prefix and property vocabulary.
pub struct DefaultPropertyTable {
    prefixes: AHashMap<&'static str, &'static str>,
    specs: AHashMap<&'static str, PropertySpec>,
}

impl Default for DefaultPropertyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultPropertyTable {
    pub fn new() -> Self {
        Self {
            prefixes: PREFIXES.iter().copied().collect(),
            specs: PROPERTY_SPECS.iter().copied().collect(),
        }
    }
}

impl PropertyTable for DefaultPropertyTable {
    fn lookup(&self, prefix: &str) -> Option<PrefixRule> {
        let property = *self.prefixes.get(prefix)?;
        let overload = match prefix {
            "text" => Some(Overload {
                shape: ValueShape::Length,
                property: "font-size".to_string(),
            }),
            "bg" => Some(Overload {
                shape: ValueShape::Image,
                property: "background-image".to_string(),
            }),
            _ => None,
        };
        Some(PrefixRule {
            property: property.to_string(),
            overload,
        })
    }

    fn spec(&self, property: &str) -> Option<PropertySpec> {
        self.specs.get(property).copied()
    }

    fn prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.prefixes.keys().map(|p| p.to_string()).collect();
        prefixes.sort_unstable();
        prefixes
    }
}

const BREAKPOINTS: &[(&str, u32)] = &[
    ("sm", 640),
    ("md", 768),
    ("lg", 1024),
    ("xl", 1280),
    ("2xl", 1536),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBreakpoints;

impl BreakpointTable for DefaultBreakpoints {
    fn min_width(&self, name: &str) -> Option<u32> {
        BREAKPOINTS
            .iter()
            .find(|(bp, _)| *bp == name)
            .map(|(_, width)| *width)
    }

    fn names(&self) -> Vec<String> {
        BREAKPOINTS.iter().map(|(name, _)| name.to_string()).collect()
    }
}

const VARIANTS: &[(&str, &str)] = &[
    ("hover", ":hover"),
    ("focus", ":focus"),
    ("focus-within", ":focus-within"),
    ("focus-visible", ":focus-visible"),
    ("active", ":active"),
    ("visited", ":visited"),
    ("disabled", ":disabled"),
    ("checked", ":checked"),
    ("required", ":required"),
    ("invalid", ":invalid"),
    ("first", ":first-child"),
    ("last", ":last-child"),
    ("only", ":only-child"),
    ("odd", ":nth-child(odd)"),
    ("even", ":nth-child(even)"),
    ("empty", ":empty"),
    ("placeholder", "::placeholder"),
    ("before", "::before"),
    ("after", "::after"),
    ("selection", "::selection"),
    ("marker", "::marker"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVariants;

impl VariantTable for DefaultVariants {
    fn pseudo(&self, name: &str) -> Option<String> {
        VARIANTS
            .iter()
            .find(|(variant, _)| *variant == name)
            .map(|(_, pseudo)| pseudo.to_string())
    }

    fn names(&self) -> Vec<String> {
        VARIANTS.iter().map(|(name, _)| name.to_string()).collect()
    }
}

/// The three lookup tables a compiler needs, bundled for injection.
#[derive(Clone)]
pub struct Tables {
    pub properties: Arc<dyn PropertyTable>,
    pub breakpoints: Arc<dyn BreakpointTable>,
    pub variants: Arc<dyn VariantTable>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            properties: Arc::new(DefaultPropertyTable::new()),
            breakpoints: Arc::new(DefaultBreakpoints),
            variants: Arc::new(DefaultVariants),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_prefix_has_a_spec() {
        let table = DefaultPropertyTable::new();
        for prefix in table.prefixes() {
            let rule = table.lookup(&prefix).unwrap();
            assert!(table.spec(&rule.property).is_some(), "{prefix} -> {}", rule.property);
            if let Some(overload) = rule.overload {
                assert!(table.spec(&overload.property).is_some());
            }
        }
    }

    #[test]
    fn test_overloaded_prefixes() {
        let table = DefaultPropertyTable::new();
        let text = table.lookup("text").unwrap();
        assert_eq!(text.property, "color");
        assert_eq!(text.overload.unwrap().shape, ValueShape::Length);
        let bg = table.lookup("bg").unwrap();
        assert_eq!(bg.overload.unwrap().property, "background-image");
        assert!(table.lookup("p").unwrap().overload.is_none());
        assert!(table.lookup("nope").is_none());
    }

    #[test]
    fn test_breakpoints_ascending() {
        let widths: Vec<u32> = DefaultBreakpoints
            .names()
            .iter()
            .filter_map(|name| DefaultBreakpoints.min_width(name))
            .collect();
        assert_eq!(widths, vec![640, 768, 1024, 1280, 1536]);
        assert_eq!(DefaultBreakpoints.min_width("3xl"), None);
    }

    #[test]
    fn test_variants() {
        assert_eq!(DefaultVariants.pseudo("hover").as_deref(), Some(":hover"));
        assert_eq!(DefaultVariants.pseudo("odd").as_deref(), Some(":nth-child(odd)"));
        assert_eq!(DefaultVariants.pseudo("placeholder").as_deref(), Some("::placeholder"));
        assert_eq!(DefaultVariants.pseudo("md"), None);
    }
}
