//! Turns a [`ParsedClass`] into a [`CssRule`]: escaped selector, variant wrapping, priority.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::{Rejection, RejectionKind};
use crate::options::GenerationOptions;
use crate::syntax::ParsedClass;

const BASE_PRIORITY: u32 = 10;
const PSEUDO_PRIORITY: u32 = 10;
const MEDIA_PRIORITY: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn to_css(&self, minify: bool) -> String {
        let important = if self.important {
            if minify { "!important" } else { " !important" }
        } else {
            ""
        };
        if minify {
            format!("{}:{}{important}", self.property, self.value)
        } else {
            format!("{}: {}{important}", self.property, self.value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
    pub class_name: String,
    pub property: String,
    pub value: String,
    pub priority: u32,
    /// Canonical sorted serialization of the declarations; the grouping key.
    pub declaration_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(skip)]
    pub min_width: Option<u32>,
}

impl CssRule {
    /// Single-rule text, e.g. `.p-\[24px\] { padding: 24px; }`.
    pub fn to_css(&self, minify: bool) -> String {
        let body = declarations_css(&self.declarations, minify);
        let rule = if minify {
            format!("{}{{{body}}}", self.selector)
        } else {
            format!("{} {{ {body} }}", self.selector)
        };
        match &self.media {
            Some(media) if minify => format!("{media}{{{rule}}}"),
            Some(media) => format!("{media} {{ {rule} }}"),
            None => rule,
        }
    }
}

pub(crate) fn declarations_css(declarations: &[Declaration], minify: bool) -> String {
    let parts: Vec<String> = declarations.iter().map(|d| d.to_css(minify)).collect();
    if minify {
        parts.join(";")
    } else {
        let mut out = parts.join("; ");
        out.push(';');
        out
    }
}

/// Sorted `property: value;` pairs joined by spaces.
pub fn declaration_string(declarations: &[Declaration]) -> String {
    let mut sorted: Vec<&Declaration> = declarations.iter().collect();
    sorted.sort_by(|a, b| a.property.cmp(&b.property).then_with(|| a.value.cmp(&b.value)));
    sorted
        .iter()
        .map(|d| format!("{};", d.to_css(false)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes a class name for use after `.` in a selector.
pub fn escape_class_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    for (idx, ch) in name.chars().enumerate() {
        if idx == 0 && ch.is_ascii_digit() {
            let _ = write!(out, "\\{:x} ", ch as u32);
            continue;
        }
        if needs_escape(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn needs_escape(ch: char) -> bool {
    matches!(
        ch,
        '[' | ']'
            | ':'
            | ','
            | '('
            | ')'
            | '.'
            | '#'
            | ' '
            | '+'
            | '>'
            | '~'
            | '%'
            | '/'
            | '!'
            | '\''
            | '"'
            | '*'
            | '@'
            | '='
            | '?'
            | '&'
            | '^'
            | '$'
            | '{'
            | '}'
            | '<'
            | '|'
            | ';'
            | '\\'
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBuilder;

impl RuleBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, parsed: &ParsedClass, options: &GenerationOptions) -> Result<CssRule, Rejection> {
        let declarations = self.declarations_for(parsed, options)?;
        let (media, min_width) = match self.media_for(parsed) {
            Some((media, width)) => (Some(media), Some(width)),
            None => (None, None),
        };
        Ok(CssRule {
            selector: self.selector_for(parsed, options),
            declaration_string: declaration_string(&declarations),
            declarations,
            class_name: parsed.class_name.clone(),
            property: parsed.property.clone(),
            value: parsed.value.clone(),
            priority: self.priority_for(parsed),
            media,
            min_width,
        })
    }

    pub fn selector_for(&self, parsed: &ParsedClass, options: &GenerationOptions) -> String {
        let mut selector = String::new();
        if let Some(scope) = options.scope.as_deref() {
            selector.push_str(scope.trim());
            selector.push(' ');
        }
        selector.push_str(&parsed.selector);
        for pseudo in parsed.metadata.pseudo_selectors() {
            selector.push_str(pseudo);
        }
        selector
    }

    pub fn declarations_for(
        &self,
        parsed: &ParsedClass,
        options: &GenerationOptions,
    ) -> Result<Vec<Declaration>, Rejection> {
        if parsed.property.trim().is_empty() || parsed.value.trim().is_empty() {
            return Err(Rejection::new(
                &parsed.class_name,
                RejectionKind::GenerationFailed,
                "empty property or value",
            ));
        }
        Ok(vec![Declaration {
            property: parsed.property.clone(),
            value: parsed.value.clone(),
            important: options.important,
        }])
    }

    pub fn media_for(&self, parsed: &ParsedClass) -> Option<(String, u32)> {
        parsed
            .metadata
            .breakpoint()
            .map(|(_, width)| (format!("@media (min-width: {width}px)"), width))
    }

    pub fn priority_for(&self, parsed: &ParsedClass) -> u32 {
        let pseudos = parsed.metadata.pseudo_selectors().count() as u32;
        let media = if parsed.metadata.breakpoint().is_some() { MEDIA_PRIORITY } else { 0 };
        BASE_PRIORITY + PSEUDO_PRIORITY * pseudos + media
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{ClassMetadata, SyntaxKind, Variant};
    use crate::value::ValueType;
    use pretty_assertions::assert_eq;

    fn parsed(class_name: &str, property: &str, value: &str, variants: Vec<Variant>) -> ParsedClass {
        ParsedClass {
            class_name: class_name.to_string(),
            prefix: "p".to_string(),
            property: property.to_string(),
            value: value.to_string(),
            raw_value: value.to_string(),
            values: vec![value.to_string()],
            syntax_kind: SyntaxKind::Bracket,
            selector: format!(".{}", escape_class_name(class_name)),
            is_function: false,
            metadata: ClassMetadata {
                variants,
                value_type: ValueType::Length,
                disambiguated: false,
                sides: None,
            },
        }
    }

    #[test]
    fn test_escape_class_name() {
        assert_eq!(escape_class_name("p-[24px]"), r"p-\[24px\]");
        assert_eq!(escape_class_name("w-[50%]"), r"w-\[50\%\]");
        assert_eq!(escape_class_name("md:hover:p-[1px]"), r"md\:hover\:p-\[1px\]");
        assert_eq!(escape_class_name("w-[calc(1px+2px)]"), r"w-\[calc\(1px\+2px\)\]");
        assert_eq!(escape_class_name("2xl:p-[1px]"), r"\32 xl\:p-\[1px\]");
        assert_eq!(escape_class_name("bg-[#fff]"), r"bg-\[\#fff\]");
        assert_eq!(escape_class_name("aspect-[16/9]"), r"aspect-\[16\/9\]");
    }

    #[test]
    fn test_build_plain_rule() {
        let rule = RuleBuilder::new()
            .build(&parsed("p-[24px]", "padding", "24px", vec![]), &GenerationOptions::default())
            .unwrap();
        assert_eq!(rule.to_css(false), r".p-\[24px\] { padding: 24px; }");
        assert_eq!(rule.to_css(true), r".p-\[24px\]{padding:24px}");
        assert_eq!(rule.priority, 10);
        assert_eq!(rule.declaration_string, "padding: 24px;");
        assert_eq!(rule.media, None);
    }

    #[test]
    fn test_variants_and_priority() {
        let variants = vec![
            Variant::Breakpoint {
                name: "md".into(),
                min_width: 768,
            },
            Variant::Pseudo {
                name: "hover".into(),
                selector: ":hover".into(),
            },
        ];
        let rule = RuleBuilder::new()
            .build(
                &parsed("md:hover:p-[1px]", "padding", "1px", variants),
                &GenerationOptions::default(),
            )
            .unwrap();
        assert_eq!(rule.selector, r".md\:hover\:p-\[1px\]:hover");
        assert_eq!(rule.media.as_deref(), Some("@media (min-width: 768px)"));
        assert_eq!(rule.min_width, Some(768));
        assert_eq!(rule.priority, 21);
    }

    #[test]
    fn test_scope_and_important() {
        let options = GenerationOptions {
            scope: Some(".app".into()),
            important: true,
            ..GenerationOptions::default()
        };
        let rule = RuleBuilder::new()
            .build(&parsed("p-[24px]", "padding", "24px", vec![]), &options)
            .unwrap();
        assert_eq!(rule.selector, r".app .p-\[24px\]");
        assert_eq!(rule.to_css(false), r".app .p-\[24px\] { padding: 24px !important; }");
        assert_eq!(rule.declaration_string, "padding: 24px !important;");
    }

    #[test]
    fn test_empty_value_fails() {
        let err = RuleBuilder::new()
            .build(&parsed("p-[x]", "padding", " ", vec![]), &GenerationOptions::default())
            .unwrap_err();
        assert_eq!(err.kind, RejectionKind::GenerationFailed);
    }
}
