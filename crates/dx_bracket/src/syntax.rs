//! The bracket grammar: `(variant ":")* prefix "-" "[" value "]"`.
//!
//! Splitting, variant resolution, prefix lookup and the per-prefix disambiguation rules live
//! here. Value validation happens later, in [`crate::value`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Rejection, RejectionKind};
use crate::safety::{MatchBudget, MatchError, SafeMatcher, SafePattern};
use crate::tables::{BreakpointTable, PropertyTable, ValueShape, VariantTable};
use crate::value::length::has_length_shape;
use crate::value::parser::single_function;
use crate::value::ValueType;

pub const BRACKET_PATTERN: &str = r"^([a-zA-Z][a-zA-Z0-9-]*)-\[([^\]]+)\]$";

const MAX_PREFIX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyntaxKind {
    Bracket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Variant {
    Pseudo { name: String, selector: String },
    Breakpoint { name: String, min_width: u32 },
}

impl Variant {
    pub fn name(&self) -> &str {
        match self {
            Variant::Pseudo { name, .. } | Variant::Breakpoint { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMetadata {
    pub variants: Vec<Variant>,
    pub value_type: ValueType,
    /// The prefix's alternate property was chosen from the value's shape.
    pub disambiguated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sides: Option<[String; 4]>,
}

impl ClassMetadata {
    pub fn breakpoint(&self) -> Option<(&str, u32)> {
        self.variants.iter().find_map(|variant| match variant {
            Variant::Breakpoint { name, min_width } => Some((name.as_str(), *min_width)),
            Variant::Pseudo { .. } => None,
        })
    }

    pub fn pseudo_selectors(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().filter_map(|variant| match variant {
            Variant::Pseudo { selector, .. } => Some(selector.as_str()),
            Variant::Breakpoint { .. } => None,
        })
    }
}

/// A token that passed every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedClass {
    pub class_name: String,
    pub prefix: String,
    pub property: String,
    pub value: String,
    pub raw_value: String,
    pub values: Vec<String>,
    pub syntax_kind: SyntaxKind,
    /// The escaped class selector, without variants or scope.
    pub selector: String,
    pub is_function: bool,
    pub metadata: ClassMetadata,
}

/// A token split into its grammar parts, before the value is looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSyntax<'a> {
    pub variants: Vec<Variant>,
    pub base: &'a str,
    pub prefix: &'a str,
    pub raw_value: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProperty {
    pub property: String,
    pub disambiguated: bool,
}

pub struct ClassSyntaxParser {
    matcher: SafeMatcher,
    pattern: Arc<SafePattern>,
    budget: MatchBudget,
    properties: Arc<dyn PropertyTable>,
    breakpoints: Arc<dyn BreakpointTable>,
    variants: Arc<dyn VariantTable>,
}

impl ClassSyntaxParser {
    pub fn new(
        properties: Arc<dyn PropertyTable>,
        breakpoints: Arc<dyn BreakpointTable>,
        variants: Arc<dyn VariantTable>,
        budget: MatchBudget,
    ) -> Result<Self, MatchError> {
        let matcher = SafeMatcher::new();
        let pattern = matcher.compile(BRACKET_PATTERN)?;
        Ok(Self {
            matcher,
            pattern,
            budget,
            properties,
            breakpoints,
            variants,
        })
    }

    /// Splits `token` into variants, prefix and raw value.
    pub fn split<'a>(&self, token: &'a str) -> Result<ClassSyntax<'a>, Rejection> {
        let (variant_names, base) = split_variants(token);

        let mut variants = Vec::with_capacity(variant_names.len());
        for name in variant_names {
            variants.push(self.resolve_variant(token, name)?);
        }
        let breakpoints = variants
            .iter()
            .filter(|v| matches!(v, Variant::Breakpoint { .. }))
            .count();
        if breakpoints > 1 {
            return Err(Rejection::new(
                token,
                RejectionKind::InvalidSyntax,
                "at most one breakpoint variant is allowed",
            ));
        }

        let (outcome, groups) = self.matcher.captures(&self.pattern, base, self.budget);
        if outcome.timed_out {
            warn!(token, "grammar match exceeded its budget");
        }
        let captured = groups.and_then(|groups| Some((groups.get(1).copied()??, groups.get(2).copied()??)));
        let Some((prefix, raw_value)) = captured.filter(|_| outcome.is_match()) else {
            let reason = match outcome.error {
                Some(err) => format!("token does not match `prefix-[value]`: {err}"),
                None => "token does not match `prefix-[value]`".to_string(),
            };
            return Err(Rejection::new(token, RejectionKind::InvalidSyntax, reason)
                .with_suggestions(syntax_suggestions(base)));
        };

        Ok(ClassSyntax {
            variants,
            base,
            prefix,
            raw_value,
        })
    }

    fn resolve_variant(&self, token: &str, name: &str) -> Result<Variant, Rejection> {
        if let Some(min_width) = self.breakpoints.min_width(name) {
            return Ok(Variant::Breakpoint {
                name: name.to_string(),
                min_width,
            });
        }
        if let Some(selector) = self.variants.pseudo(name) {
            return Ok(Variant::Pseudo {
                name: name.to_string(),
                selector,
            });
        }
        let candidates: Vec<String> = self
            .breakpoints
            .names()
            .into_iter()
            .chain(self.variants.names())
            .collect();
        let suggestions = crate::value::closest_matches(name, candidates.iter().map(String::as_str), 3);
        debug!(token, variant = name, "unknown variant");
        Err(Rejection::new(
            token,
            RejectionKind::InvalidSyntax,
            format!("unknown variant `{name}:`"),
        )
        .with_suggestions(suggestions))
    }

    /// Maps a prefix to its property, applying the prefix's disambiguation rule.
    pub fn resolve_property(
        &self,
        token: &str,
        prefix: &str,
        raw_value: &str,
    ) -> Result<ResolvedProperty, Rejection> {
        let Some(rule) = self.properties.lookup(prefix) else {
            return Err(Rejection::new(
                token,
                RejectionKind::PropertyNotSupported,
                format!("unknown prefix `{prefix}`"),
            )
            .with_suggestions(self.prefix_suggestions(prefix)));
        };
        if let Some(overload) = rule.overload {
            if shape_matches(overload.shape, raw_value) {
                return Ok(ResolvedProperty {
                    property: overload.property,
                    disambiguated: true,
                });
            }
        }
        Ok(ResolvedProperty {
            property: rule.property,
            disambiguated: false,
        })
    }

    /// Known prefixes sharing the first letter, closest length first, then edit distance.
    pub fn prefix_suggestions(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.to_ascii_lowercase();
        let Some(first) = prefix.chars().next() else {
            return Vec::new();
        };
        let mut candidates: Vec<(usize, usize, String)> = self
            .properties
            .prefixes()
            .into_iter()
            .filter(|candidate| {
                candidate
                    .chars()
                    .next()
                    .is_some_and(|c| c.to_ascii_lowercase() == first)
            })
            .map(|candidate| {
                let length_diff = candidate.len().abs_diff(prefix.len());
                let distance = strsim::levenshtein(&prefix, &candidate);
                (length_diff, distance, candidate)
            })
            .collect();
        candidates.sort();
        candidates
            .into_iter()
            .take(MAX_PREFIX_SUGGESTIONS)
            .map(|(_, _, candidate)| candidate)
            .collect()
    }
}

fn shape_matches(shape: ValueShape, raw_value: &str) -> bool {
    match shape {
        ValueShape::Length => has_length_shape(raw_value),
        ValueShape::Image => single_function(raw_value.trim()).is_some_and(|(name, _)| {
            let name = name.to_ascii_lowercase();
            name == "url" || name.ends_with("-gradient")
        }),
    }
}

/// Splits `name:` variants off the front. Colons inside brackets belong to the value.
pub fn split_variants(token: &str) -> (Vec<&str>, &str) {
    let mut variants = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in token.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                variants.push(&token[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    (variants, &token[start..])
}

/// Targeted hints for a token that failed the grammar.
pub fn syntax_suggestions(base: &str) -> Vec<String> {
    let mut suggestions = Vec::new();
    let opens = base.matches('[').count();
    let closes = base.matches(']').count();

    if opens != closes {
        suggestions.push("brackets are unbalanced; use exactly one `[` and one `]`".to_string());
    }
    if base.starts_with(|c: char| c.is_ascii_digit()) {
        suggestions.push("class names must start with a letter".to_string());
    }
    let outside: String = match (base.find('['), base.rfind(']')) {
        (Some(open), Some(close)) if open < close => format!("{}{}", &base[..open], &base[close + 1..]),
        _ => base.to_string(),
    };
    if outside.contains(char::is_whitespace) {
        suggestions.push("whitespace is only allowed inside the brackets".to_string());
    }
    if base.contains("[]") {
        suggestions.push("brackets must contain a value, e.g. `p-[24px]`".to_string());
    }
    if let Some(open) = base.find('[') {
        if open > 0 && !base[..open].ends_with('-') {
            let fixed = format!("{}-{}", &base[..open], &base[open..]);
            suggestions.push(format!("add `-` before the bracket: `{fixed}`"));
        }
    }
    if opens == 0 {
        if let Some((prefix, value)) = shorthand_split(base) {
            suggestions.push(format!(
                "shorthand values are not supported; use `{prefix}-[{value}]`"
            ));
        }
    }
    if suggestions.is_empty() {
        suggestions.push("use the form `prefix-[value]`, e.g. `p-[24px]`".to_string());
    }
    suggestions
}

/// `p-24px` → `("p", "24px")`: the last `-` followed by something that looks like a value.
fn shorthand_split(base: &str) -> Option<(&str, &str)> {
    let (prefix, value) = base.rsplit_once('-')?;
    let looks_like_value = value.starts_with(|c: char| c.is_ascii_digit() || c == '#' || c == '.');
    (looks_like_value && !prefix.is_empty() && prefix.starts_with(|c: char| c.is_ascii_alphabetic()))
        .then_some((prefix, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{DefaultBreakpoints, DefaultPropertyTable, DefaultVariants};
    use pretty_assertions::assert_eq;

    fn parser() -> ClassSyntaxParser {
        ClassSyntaxParser::new(
            Arc::new(DefaultPropertyTable::new()),
            Arc::new(DefaultBreakpoints),
            Arc::new(DefaultVariants),
            MatchBudget::fast(),
        )
        .unwrap()
    }

    #[test]
    fn test_split_simple() {
        let syntax = parser().split("p-[24px]").unwrap();
        assert_eq!(syntax.prefix, "p");
        assert_eq!(syntax.raw_value, "24px");
        assert!(syntax.variants.is_empty());
    }

    #[test]
    fn test_split_with_variants() {
        let syntax = parser().split("md:hover:text-[16px]").unwrap();
        assert_eq!(syntax.prefix, "text");
        assert_eq!(
            syntax.variants,
            vec![
                Variant::Breakpoint {
                    name: "md".into(),
                    min_width: 768
                },
                Variant::Pseudo {
                    name: "hover".into(),
                    selector: ":hover".into()
                },
            ]
        );
    }

    #[test]
    fn test_colon_inside_brackets_is_value() {
        let (variants, base) = split_variants("hover:bg-[url(a:b)]");
        assert_eq!(variants, vec!["hover"]);
        assert_eq!(base, "bg-[url(a:b)]");
    }

    #[test]
    fn test_two_breakpoints_rejected() {
        let err = parser().split("sm:md:p-[1px]").unwrap_err();
        assert_eq!(err.kind, RejectionKind::InvalidSyntax);
    }

    #[test]
    fn test_unknown_variant_suggests() {
        let err = parser().split("hovr:p-[1px]").unwrap_err();
        assert_eq!(err.kind, RejectionKind::InvalidSyntax);
        assert!(err.suggestions.contains(&"hover".to_string()));
    }

    #[test]
    fn test_syntax_errors() {
        let p = parser();
        let err = p.split("p-24px").unwrap_err();
        assert_eq!(err.kind, RejectionKind::InvalidSyntax);
        assert!(err.suggestions.iter().any(|s| s.contains("p-[24px]")));

        let err = p.split("p[24px]").unwrap_err();
        assert!(err.suggestions.iter().any(|s| s.contains("p-[24px]")));

        let err = p.split("p-[24px").unwrap_err();
        assert!(err.suggestions.iter().any(|s| s.contains("unbalanced")));

        let err = p.split("1p-[24px]").unwrap_err();
        assert!(err.suggestions.iter().any(|s| s.contains("start with a letter")));

        let err = p.split("p-[]").unwrap_err();
        assert!(err.suggestions.iter().any(|s| s.contains("must contain a value")));

        let err = p.split("p -[1px]").unwrap_err();
        assert!(err.suggestions.iter().any(|s| s.contains("whitespace")));
    }

    #[test]
    fn test_resolve_property_and_disambiguation() {
        let p = parser();
        let color = p.resolve_property("text-[red]", "text", "red").unwrap();
        assert_eq!(color.property, "color");
        assert!(!color.disambiguated);

        let size = p.resolve_property("text-[16px]", "text", "16px").unwrap();
        assert_eq!(size.property, "font-size");
        assert!(size.disambiguated);

        let image = p.resolve_property("bg-[url(a.png)]", "bg", "url(a.png)").unwrap();
        assert_eq!(image.property, "background-image");
        let gradient = p
            .resolve_property("x", "bg", "linear-gradient(red, blue)")
            .unwrap();
        assert_eq!(gradient.property, "background-image");
        let color = p.resolve_property("x", "bg", "#fff").unwrap();
        assert_eq!(color.property, "background-color");
    }

    #[test]
    fn test_unknown_prefix_suggestions() {
        let err = parser().resolve_property("pading-[1px]", "pading", "1px").unwrap_err();
        assert_eq!(err.kind, RejectionKind::PropertyNotSupported);
        assert!(!err.suggestions.is_empty());
        assert!(err.suggestions.len() <= MAX_PREFIX_SUGGESTIONS);
        assert!(err.suggestions.iter().all(|s| s.starts_with('p')));
    }

    #[test]
    fn test_uppercase_prefix_gets_lowercase_suggestion() {
        let err = parser().resolve_property("P-[1px]", "P", "1px").unwrap_err();
        assert_eq!(err.kind, RejectionKind::PropertyNotSupported);
        assert_eq!(err.suggestions.first().map(String::as_str), Some("p"));
    }
}
