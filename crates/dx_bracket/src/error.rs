//! Rejection taxonomy for single tokens and fatal errors for whole calls.
//!
//! A token that fails any pipeline stage produces a [`Rejection`]; rejections are collected
//! into the batch's invalid list and never abort the batch. [`CompileError`] is reserved for
//! failures that make the whole call meaningless (bad options, bad input shape, cancellation).

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::safety::RiskLevel;

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RejectionKind {
    /// Wrong type or shape, or removed by the sanitizer.
    InvalidInput,
    /// The threat detector flagged the token at high or critical risk.
    DangerousInput,
    /// The token does not follow the `prefix-[value]` grammar.
    InvalidSyntax,
    /// The prefix is not in the property table.
    PropertyNotSupported,
    /// The value failed type-directed validation.
    #[serde(rename = "InvalidCSSValue")]
    InvalidCssValue,
    /// The value could not be split into components.
    ParsingFailed,
    /// The rule builder could not produce a usable declaration.
    GenerationFailed,
}

impl RejectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionKind::InvalidInput => "InvalidInput",
            RejectionKind::DangerousInput => "DangerousInput",
            RejectionKind::InvalidSyntax => "InvalidSyntax",
            RejectionKind::PropertyNotSupported => "PropertyNotSupported",
            RejectionKind::InvalidCssValue => "InvalidCSSValue",
            RejectionKind::ParsingFailed => "ParsingFailed",
            RejectionKind::GenerationFailed => "GenerationFailed",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured, human-readable reason for rejecting one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{kind} for `{class_name}`: {reason}")]
pub struct Rejection {
    pub class_name: String,
    pub kind: RejectionKind,
    pub reason: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
}

impl Rejection {
    pub fn new(class_name: impl Into<String>, kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            kind,
            reason: reason.into(),
            suggestions: Vec::new(),
            risk: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = Some(risk);
        self
    }
}

/// Errors that fail a whole compile or generate call.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The generation options object could not be deserialized or is inconsistent.
    #[error("Invalid generation options: {message}")]
    InvalidOptions { message: String },
    /// The batch value is neither a token array nor a whitespace-delimited string.
    #[error("Invalid batch input: {message}")]
    InvalidBatch { message: String },
    /// A cooperative cancellation flag was raised between tokens.
    #[error("Batch cancelled after {processed} tokens")]
    Cancelled { processed: usize },
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
    /// Failed to read a configuration file
    #[error("Failed to read configuration file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for CompileError {
    fn from(err: serde_json::Error) -> Self {
        CompileError::InvalidOptions {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_display_mentions_kind_and_class() {
        let rejection = Rejection::new("p-[abc]", RejectionKind::InvalidCssValue, "not a length");
        let display = rejection.to_string();
        assert!(display.contains("InvalidCSSValue"));
        assert!(display.contains("p-[abc]"));
        assert!(display.contains("not a length"));
    }

    #[test]
    fn test_rejection_serializes_without_empty_fields() {
        let rejection = Rejection::new("x", RejectionKind::InvalidSyntax, "bad");
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["className"], "x");
        assert_eq!(json["kind"], "InvalidSyntax");
        assert!(json.get("suggestions").is_none());
        assert!(json.get("risk").is_none());
    }

    #[test]
    fn test_dangerous_rejection_carries_risk() {
        let rejection = Rejection::new("x", RejectionKind::DangerousInput, "script")
            .with_risk(RiskLevel::Critical)
            .with_suggestions(vec!["remove it".into()]);
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["risk"], "critical");
        assert_eq!(json["suggestions"][0], "remove it");
    }

    #[test]
    fn test_compile_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let compile: CompileError = err.into();
        assert!(matches!(compile, CompileError::InvalidOptions { .. }));
    }
}
