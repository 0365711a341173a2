use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// Caller-supplied knobs for one `generate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct GenerationOptions {
    pub minify: bool,
    #[serde(alias = "group_selectors")]
    pub group_selectors: bool,
    #[serde(alias = "include_comments")]
    pub include_comments: bool,
    pub important: bool,
    /// Selector prepended to every rule, e.g. `.app`.
    pub scope: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            minify: false,
            group_selectors: true,
            include_comments: false,
            important: false,
            scope: None,
        }
    }
}

impl GenerationOptions {
    /// Deserializes a JSON options object; `null` means defaults.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CompileError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        if !value.is_object() {
            return Err(CompileError::InvalidOptions {
                message: "options must be a JSON object".into(),
            });
        }
        let options: Self = serde_json::from_value(value.clone())?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        let Some(scope) = self.scope.as_deref() else {
            return Ok(());
        };
        let scope = scope.trim();
        if scope.is_empty() {
            return Err(CompileError::InvalidOptions {
                message: "scope must not be empty".into(),
            });
        }
        if scope.contains(['{', '}', ';', '<', '>', '\\']) || scope.chars().any(char::is_control) {
            return Err(CompileError::InvalidOptions {
                message: format!("scope `{scope}` contains characters not allowed in a selector prefix"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_defaults_for_missing_fields() {
        let options = GenerationOptions::from_json(&json!({ "minify": true })).unwrap();
        assert_eq!(
            options,
            GenerationOptions {
                minify: true,
                ..GenerationOptions::default()
            }
        );
        assert!(GenerationOptions::from_json(&serde_json::Value::Null).unwrap().group_selectors);
    }

    #[test]
    fn test_accepts_both_field_spellings() {
        let camel = GenerationOptions::from_json(&json!({ "groupSelectors": false })).unwrap();
        let snake = GenerationOptions::from_json(&json!({ "group_selectors": false })).unwrap();
        assert_eq!(camel, snake);
        assert!(!camel.group_selectors);
    }

    #[test]
    fn test_rejects_unknown_and_malformed() {
        assert!(matches!(
            GenerationOptions::from_json(&json!({ "minfy": true })),
            Err(CompileError::InvalidOptions { .. })
        ));
        assert!(GenerationOptions::from_json(&json!({ "minify": "yes" })).is_err());
        assert!(GenerationOptions::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_scope_validation() {
        assert!(GenerationOptions::from_json(&json!({ "scope": ".app" })).is_ok());
        assert!(GenerationOptions::from_json(&json!({ "scope": "  " })).is_err());
        assert!(GenerationOptions::from_json(&json!({ "scope": ".a{}" })).is_err());
    }
}
