//! Splits bracket content into components without looking inside parentheses or quotes.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorPolicy {
    /// Exactly one component.
    Single,
    /// Space-separated components; commas are folded into spaces.
    SpaceJoin,
    /// Comma-separated list whose items may contain spaces.
    CommaList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedValue {
    pub normalized: String,
    pub components: Vec<String>,
    pub is_single_function: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueParseError {
    #[error("value is empty")]
    Empty,
    #[error("unbalanced parentheses in `{0}`")]
    UnbalancedParens(String),
    #[error("unterminated string in `{0}`")]
    UnterminatedQuote(String),
    #[error("`{0}` is not a valid separator")]
    InvalidSeparator(char),
    #[error("empty component in `{0}`")]
    EmptyComponent(String),
    #[error("expected a single value but found {0} space-separated components")]
    TooManyComponents(usize),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueParser;

impl ValueParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &str, policy: SeparatorPolicy) -> Result<ParsedValue, ValueParseError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(ValueParseError::Empty);
        }
        check_structure(value)?;

        if single_function(value).is_some() {
            return Ok(ParsedValue {
                normalized: value.to_string(),
                components: vec![value.to_string()],
                is_single_function: true,
            });
        }

        let items = split_top_level(value, ',');
        if items.len() > 1 && items.iter().any(|item| item.is_empty()) {
            return Err(ValueParseError::EmptyComponent(value.to_string()));
        }
        let groups: Vec<Vec<&str>> = items.iter().map(|item| split_components(item)).collect();

        if policy == SeparatorPolicy::Single {
            if let Some(group) = groups.iter().find(|group| group.len() > 1) {
                return Err(ValueParseError::TooManyComponents(group.len()));
            }
        }

        let parsed = match policy {
            SeparatorPolicy::Single | SeparatorPolicy::SpaceJoin => {
                let components: Vec<String> = groups.into_iter().flatten().map(str::to_string).collect();
                ParsedValue {
                    normalized: components.join(" "),
                    components,
                    is_single_function: false,
                }
            }
            SeparatorPolicy::CommaList => {
                let components: Vec<String> = groups.iter().map(|group| group.join(" ")).collect();
                ParsedValue {
                    normalized: components.join(", "),
                    components,
                    is_single_function: false,
                }
            }
        };
        Ok(parsed)
    }
}

/// Rejects `;` and `|` anywhere, top-level `_`, unbalanced parentheses and open quotes.
fn check_structure(value: &str) -> Result<(), ValueParseError> {
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in value.chars() {
        if matches!(ch, ';' | '|') {
            return Err(ValueParseError::InvalidSeparator(ch));
        }
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ValueParseError::UnbalancedParens(value.to_string()));
                }
            }
            '_' if depth == 0 => return Err(ValueParseError::InvalidSeparator('_')),
            _ => {}
        }
    }
    if quote.is_some() {
        return Err(ValueParseError::UnterminatedQuote(value.to_string()));
    }
    if depth != 0 {
        return Err(ValueParseError::UnbalancedParens(value.to_string()));
    }
    Ok(())
}

/// Splits on `separator` outside parentheses and quotes. Parts are trimmed; empty parts are kept.
pub fn split_top_level(value: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, ch) in value.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(value[start..idx].trim());
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());
    parts
}

/// Space-separated components outside parentheses and quotes, empties dropped.
pub fn split_components(value: &str) -> Vec<&str> {
    split_top_level(value, ' ')
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect()
}

/// `(name, arguments)` when the whole value is one `name(...)` call.
pub fn single_function(value: &str) -> Option<(&str, &str)> {
    let open = value.find('(')?;
    let name = &value[..open];
    if name.is_empty()
        || !name.starts_with(|c: char| c.is_ascii_alphabetic())
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return None;
    }
    let mut depth = 0;
    let mut quote: Option<char> = None;
    for (idx, ch) in value[open..].char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let close = open + idx;
                    return (close == value.len() - 1).then(|| (name, &value[open + 1..close]));
                }
            }
            _ => {}
        }
    }
    None
}
