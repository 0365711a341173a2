//! The compile pipeline and its batch and generation entry points.
//!
//! One token flows through sanitization, threat detection, the grammar, prefix resolution,
//! value splitting and type-directed validation. The result (success or rejection) is cached in
//! the parse tier. Generation resolves a whole batch, builds and groups rules and assembles the
//! stylesheet, cached as a unit in the generation tier.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use ahash::AHashSet;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheContext, CacheStats, Clock, ParseOutcome, SystemClock};
use crate::config::CompilerConfig;
use crate::dedup::{Deduplicator, GroupedRule};
use crate::error::{CompileError, Rejection, RejectionKind};
use crate::options::GenerationOptions;
use crate::rule::{CssRule, RuleBuilder, declaration_string, escape_class_name};
use crate::safety::{InputKind, Sanitizer, ThreatDetector};
use crate::stylesheet;
use crate::syntax::{ClassMetadata, ClassSyntaxParser, ParsedClass, SyntaxKind};
use crate::tables::{PropertyTable, Tables};
use crate::value::{SeparatorPolicy, ValueParser, ValueValidator};

/// A batch of tokens: an explicit list, or markup-style text split on whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInput {
    Tokens(Vec<String>),
    Text(String),
}

impl BatchInput {
    /// Accepts a JSON array or string. Non-string array members come back as rejections.
    pub fn from_json(value: &serde_json::Value) -> Result<(Self, Vec<Rejection>), CompileError> {
        match value {
            serde_json::Value::String(text) => Ok((BatchInput::Text(text.clone()), Vec::new())),
            serde_json::Value::Array(items) => {
                let mut tokens = Vec::with_capacity(items.len());
                let mut rejected = Vec::new();
                for item in items {
                    match item {
                        serde_json::Value::String(token) => tokens.push(token.clone()),
                        other => rejected.push(Rejection::new(
                            other.to_string(),
                            RejectionKind::InvalidInput,
                            "class names must be strings",
                        )),
                    }
                }
                Ok((BatchInput::Tokens(tokens), rejected))
            }
            other => Err(CompileError::InvalidBatch {
                message: format!("expected an array of class names or a string, got {}", json_kind(other)),
            }),
        }
    }

    pub fn tokens(&self) -> Vec<&str> {
        match self {
            BatchInput::Tokens(tokens) => tokens.iter().map(String::as_str).collect(),
            BatchInput::Text(text) => split_text(text),
        }
    }
}

impl From<Vec<String>> for BatchInput {
    fn from(tokens: Vec<String>) -> Self {
        BatchInput::Tokens(tokens)
    }
}

impl From<&[&str]> for BatchInput {
    fn from(tokens: &[&str]) -> Self {
        BatchInput::Tokens(tokens.iter().map(|t| t.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for BatchInput {
    fn from(tokens: [&str; N]) -> Self {
        BatchInput::Tokens(tokens.iter().map(|t| t.to_string()).collect())
    }
}

impl From<&str> for BatchInput {
    fn from(text: &str) -> Self {
        BatchInput::Text(text.to_string())
    }
}

impl From<String> for BatchInput {
    fn from(text: String) -> Self {
        BatchInput::Text(text)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Splits on whitespace that is not inside a bracket value.
fn split_text(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() && depth == 0 {
            if let Some(begin) = start.take() {
                tokens.push(&text[begin..idx]);
            }
            continue;
        }
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        start.get_or_insert(idx);
    }
    if let Some(begin) = start {
        tokens.push(&text[begin..]);
    }
    tokens
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub classes: Vec<Arc<ParsedClass>>,
    pub invalid: Vec<Rejection>,
    pub total_input: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub total_input: usize,
    pub valid_classes: usize,
    pub invalid_classes: usize,
    pub generated_rules: usize,
    pub grouped_rules: usize,
    /// Grouped rules over generated rules; 1.0 when nothing was generated.
    pub compression_ratio: f64,
    /// Milliseconds.
    pub processing_time: f64,
    pub from_cache: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    pub css: String,
    pub rules: Vec<GroupedRule>,
    pub classes: Vec<Arc<ParsedClass>>,
    pub invalid: Vec<Rejection>,
    pub stats: GenerationStats,
}

pub struct ClassCompiler {
    config: CompilerConfig,
    sanitizer: Sanitizer,
    threats: &'static ThreatDetector,
    parser: ClassSyntaxParser,
    properties: Arc<dyn PropertyTable>,
    value_parser: ValueParser,
    validator: ValueValidator,
    rules: RuleBuilder,
    dedup: Deduplicator,
    cache: CacheContext,
}

impl ClassCompiler {
    /// A compiler over the bundled tables, starting the sweeper if the config asks for one.
    pub fn new(config: CompilerConfig) -> Result<Self, CompileError> {
        Self::with_parts(config, Tables::default(), Arc::new(SystemClock::new()))
    }

    pub fn with_parts(config: CompilerConfig, tables: Tables, clock: Arc<dyn Clock>) -> Result<Self, CompileError> {
        config.validate()?;
        let parser = ClassSyntaxParser::new(
            tables.properties.clone(),
            tables.breakpoints,
            tables.variants,
            config.matcher.budget(),
        )
        .map_err(|err| CompileError::Config {
            message: format!("grammar pattern rejected: {err}"),
        })?;

        let cache = CacheContext::with_clock(&config.cache, clock);
        if let Some(interval) = config.cache.sweep_interval() {
            cache.start_sweeper(interval).map_err(|err| CompileError::Config {
                message: format!("failed to start cache sweeper: {err}"),
            })?;
        }

        Ok(Self {
            sanitizer: Sanitizer::new(config.sanitizer),
            threats: ThreatDetector::shared(),
            parser,
            validator: ValueValidator::new(tables.properties.clone()),
            properties: tables.properties,
            value_parser: ValueParser::new(),
            rules: RuleBuilder::new(),
            dedup: Deduplicator::new(),
            cache,
            config,
        })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheContext {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Stops the background sweeper. The compiler stays usable.
    pub fn shutdown(&self) {
        self.cache.shutdown();
    }

    pub fn compile_class(&self, token: &str) -> ParseOutcome {
        let key = self.cache.keys().parse_key(token);
        if let Some(cached) = self.cache.parse().get(&key) {
            debug!(token, "parse cache hit");
            return cached;
        }
        debug!(token, "parse cache miss");
        let outcome = self.run_pipeline(token).map(Arc::new);
        if let Err(rejection) = &outcome {
            debug!(token, kind = %rejection.kind, reason = %rejection.reason, "token rejected");
        }
        self.cache.parse().set(key.to_string(), outcome.clone());
        outcome
    }

    fn run_pipeline(&self, token: &str) -> Result<ParsedClass, Rejection> {
        let Some(class_name) = self.sanitizer.sanitize(token, InputKind::ClassToken) else {
            return Err(Rejection::new(
                token,
                RejectionKind::InvalidInput,
                "token is empty, too long or obfuscated",
            ));
        };

        let report = self.threats.detect(&class_name);
        if report.is_dangerous {
            warn!(token, risk = %report.risk_level, patterns = %report.summary(), "dangerous token rejected");
            return Err(
                Rejection::new(token, RejectionKind::DangerousInput, report.summary()).with_risk(report.risk_level)
            );
        }

        let syntax = self.parser.split(&class_name)?;
        let resolved = self.parser.resolve_property(&class_name, syntax.prefix, syntax.raw_value)?;

        let Some(raw_value) = self.sanitizer.sanitize(syntax.raw_value, InputKind::Value) else {
            return Err(Rejection::new(
                token,
                RejectionKind::InvalidInput,
                "value is empty, too long or obfuscated",
            ));
        };

        let policy = self
            .properties
            .spec(&resolved.property)
            .map(|spec| spec.separator())
            .unwrap_or(SeparatorPolicy::SpaceJoin);
        let parsed_value = self
            .value_parser
            .parse(&raw_value, policy)
            .map_err(|err| Rejection::new(token, RejectionKind::ParsingFailed, err.to_string()))?;

        let validated = self
            .validator
            .validate(&parsed_value.normalized, &resolved.property)
            .map_err(|rejection| {
                Rejection::new(token, RejectionKind::InvalidCssValue, rejection.reason)
                    .with_suggestions(rejection.suggestions)
            })?;

        let variants = syntax.variants;
        let prefix = syntax.prefix.to_string();
        Ok(ParsedClass {
            selector: format!(".{}", escape_class_name(&class_name)),
            prefix,
            property: resolved.property,
            value: validated.value,
            raw_value,
            values: validated.components,
            syntax_kind: SyntaxKind::Bracket,
            is_function: parsed_value.is_single_function,
            metadata: ClassMetadata {
                variants,
                value_type: validated.value_type,
                disambiguated: resolved.disambiguated,
                sides: validated.sides,
            },
            class_name,
        })
    }

    /// Resolves every token; bad tokens land in `invalid` and never abort the batch.
    pub fn compile_batch(&self, input: impl Into<BatchInput>) -> BatchResult {
        let input = input.into();
        let tokens = input.tokens();
        // Without a cancellation flag the batch cannot fail.
        self.resolve_tokens(&tokens, None).unwrap_or_default()
    }

    /// Like [`ClassCompiler::compile_batch`], checking `cancel` before every token.
    pub fn compile_batch_cancellable(
        &self,
        input: impl Into<BatchInput>,
        cancel: &AtomicBool,
    ) -> Result<BatchResult, CompileError> {
        let input = input.into();
        let tokens = input.tokens();
        self.resolve_tokens(&tokens, Some(cancel))
    }

    #[tracing::instrument(skip_all, fields(tokens = tokens.len()))]
    fn resolve_tokens(&self, tokens: &[&str], cancel: Option<&AtomicBool>) -> Result<BatchResult, CompileError> {
        let mut seen_tokens: AHashSet<&str> = AHashSet::with_capacity(tokens.len());
        let mut seen_classes: AHashSet<String> = AHashSet::new();
        let mut result = BatchResult {
            total_input: tokens.len(),
            ..BatchResult::default()
        };

        for (processed, token) in tokens.iter().copied().enumerate() {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                info!(processed, "batch cancelled");
                return Err(CompileError::Cancelled { processed });
            }
            if !seen_tokens.insert(token) {
                continue;
            }
            match self.compile_class(token) {
                Ok(parsed) => {
                    if seen_classes.insert(parsed.class_name.clone()) {
                        result.classes.push(parsed);
                    }
                }
                Err(rejection) => result.invalid.push(rejection),
            }
        }

        debug!(
            valid = result.classes.len(),
            invalid = result.invalid.len(),
            "batch resolved"
        );
        Ok(result)
    }

    pub fn generate(
        &self,
        input: impl Into<BatchInput>,
        options: &GenerationOptions,
    ) -> Result<GenerationOutput, CompileError> {
        let input = input.into();
        self.generate_tokens(&input.tokens(), Vec::new(), options)
    }

    /// JSON entry point: `classes` is an array of strings or a whitespace-delimited string.
    pub fn generate_json(
        &self,
        classes: &serde_json::Value,
        options: &serde_json::Value,
    ) -> Result<GenerationOutput, CompileError> {
        let options = GenerationOptions::from_json(options)?;
        let (input, rejected) = BatchInput::from_json(classes)?;
        self.generate_tokens(&input.tokens(), rejected, &options)
    }

    #[tracing::instrument(skip_all, fields(tokens = tokens.len(), minify = options.minify))]
    fn generate_tokens(
        &self,
        tokens: &[&str],
        rejected: Vec<Rejection>,
        options: &GenerationOptions,
    ) -> Result<GenerationOutput, CompileError> {
        options.validate()?;
        let started = Instant::now();
        let key = self.cache.keys().generation_key(tokens, options);

        let (mut output, from_cache) = match self.cache.generation().get(&key) {
            Some(cached) => {
                debug!(key = %key, "generation cache hit");
                (GenerationOutput::clone(&cached), true)
            }
            None => {
                let output = self.build_output(tokens, options)?;
                self.cache.generation().set(key.to_string(), Arc::new(output.clone()));
                (output, false)
            }
        };

        output.stats.total_input = tokens.len() + rejected.len();
        output.invalid.extend(rejected);
        output.stats.invalid_classes = output.invalid.len();
        output.stats.from_cache = from_cache;
        output.stats.processing_time = started.elapsed().as_secs_f64() * 1000.0;

        info!(
            valid = output.stats.valid_classes,
            invalid = output.stats.invalid_classes,
            rules = output.stats.grouped_rules,
            from_cache,
            "generation complete"
        );
        Ok(output)
    }

    fn build_output(&self, tokens: &[&str], options: &GenerationOptions) -> Result<GenerationOutput, CompileError> {
        let batch = self.resolve_tokens(tokens, None)?;
        let mut invalid = batch.invalid;
        let mut classes = Vec::with_capacity(batch.classes.len());
        let mut rules: Vec<Arc<CssRule>> = Vec::with_capacity(batch.classes.len());

        for parsed in batch.classes {
            match self.rule_for(&parsed, options) {
                Ok(rule) => {
                    rules.push(rule);
                    classes.push(parsed);
                }
                Err(rejection) => invalid.push(rejection),
            }
        }

        let groups = if options.group_selectors {
            self.dedup.group(rules.iter().map(Arc::as_ref))
        } else {
            self.dedup.singletons(rules.iter().map(Arc::as_ref))
        };
        let css = stylesheet::assemble(&groups, options);

        let compression_ratio = if rules.is_empty() {
            1.0
        } else {
            groups.len() as f64 / rules.len() as f64
        };
        let stats = GenerationStats {
            total_input: tokens.len(),
            valid_classes: classes.len(),
            invalid_classes: invalid.len(),
            generated_rules: rules.len(),
            grouped_rules: groups.len(),
            compression_ratio,
            processing_time: 0.0,
            from_cache: false,
        };

        Ok(GenerationOutput {
            css,
            rules: groups,
            classes,
            invalid,
            stats,
        })
    }

    fn rule_for(&self, parsed: &ParsedClass, options: &GenerationOptions) -> Result<Arc<CssRule>, Rejection> {
        let selector = self.rules.selector_for(parsed, options);
        let declarations = self.rules.declarations_for(parsed, options)?;
        let media = self.rules.media_for(parsed);
        let key = self.cache.keys().rule_key(
            &selector,
            media.as_ref().map(|(query, _)| query.as_str()),
            &declaration_string(&declarations),
        );
        if let Some(rule) = self.cache.rule().get(&key) {
            return Ok(rule);
        }
        let rule = Arc::new(self.rules.build(parsed, options)?);
        self.cache.rule().set(key.to_string(), Arc::clone(&rule));
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::safety::RiskLevel;
    use crate::value::ValueType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config() -> CompilerConfig {
        let mut config = CompilerConfig::default();
        config.cache.sweep_interval_ms = None;
        config
    }

    fn compiler() -> ClassCompiler {
        ClassCompiler::with_parts(config(), Tables::default(), Arc::new(ManualClock::new())).unwrap()
    }

    #[test]
    fn test_split_text_respects_brackets() {
        assert_eq!(
            split_text("  p-[24px]\tm-[10px 20px]\nmd:hover:w-[50%] "),
            vec!["p-[24px]", "m-[10px 20px]", "md:hover:w-[50%]"]
        );
        assert!(split_text("   ").is_empty());
    }

    #[test]
    fn test_compile_class_pipeline() {
        let compiler = compiler();
        let parsed = compiler.compile_class("p-[24px]").unwrap();
        assert_eq!(parsed.property, "padding");
        assert_eq!(parsed.value, "24px");
        assert_eq!(parsed.selector, r".p-\[24px\]");
        assert_eq!(parsed.metadata.value_type, ValueType::Length);

        let text = compiler.compile_class("text-[16px]").unwrap();
        assert_eq!(text.property, "font-size");
        assert!(text.metadata.disambiguated);

        let sides = compiler.compile_class("m-[10px 20px]").unwrap();
        assert_eq!(
            sides.metadata.sides,
            Some(["10px".to_string(), "20px".to_string(), "10px".to_string(), "20px".to_string()])
        );
    }

    #[test]
    fn test_rejection_kinds() {
        let compiler = compiler();
        let kind = |token: &str| compiler.compile_class(token).unwrap_err().kind;
        assert_eq!(kind(""), RejectionKind::InvalidInput);
        assert_eq!(kind("p-24px"), RejectionKind::InvalidSyntax);
        assert_eq!(kind("zz-[1px]"), RejectionKind::PropertyNotSupported);
        assert_eq!(kind("p-[abc]"), RejectionKind::InvalidCssValue);
        assert_eq!(kind("w-[calc(1px]"), RejectionKind::ParsingFailed);

        let dangerous = compiler.compile_class("w-[expression(alert(1))]").unwrap_err();
        assert_eq!(dangerous.kind, RejectionKind::DangerousInput);
        assert_eq!(dangerous.risk, Some(RiskLevel::Critical));
    }

    #[test]
    fn test_rejections_are_cached() {
        let compiler = compiler();
        let first = compiler.compile_class("p-[abc]").unwrap_err();
        let second = compiler.compile_class("p-[abc]").unwrap_err();
        assert_eq!(first, second);
        assert_eq!(compiler.cache_stats().parse.hits, 1);
    }

    #[test]
    fn test_batch_dedupes_tokens() {
        let result = compiler().compile_batch(["p-[24px]", "p-[24px]", "bad"]);
        assert_eq!(result.total_input, 3);
        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.invalid.len(), 1);
    }

    #[test]
    fn test_cancellation() {
        let cancel = AtomicBool::new(true);
        let err = compiler()
            .compile_batch_cancellable(["p-[1px]"], &cancel)
            .unwrap_err();
        assert!(matches!(err, CompileError::Cancelled { processed: 0 }));
    }

    #[test]
    fn test_generate_groups_and_caches() {
        let compiler = compiler();
        let options = GenerationOptions::default();
        let output = compiler.generate("p-[24px] px-[1px] p-[24px]", &options).unwrap();
        assert_eq!(output.stats.valid_classes, 2);
        assert_eq!(output.stats.total_input, 3);
        assert!(!output.stats.from_cache);

        let again = compiler.generate("px-[1px] p-[24px]", &options).unwrap();
        assert!(again.stats.from_cache);
        assert_eq!(again.css, output.css);
        assert_eq!(again.stats.total_input, 2);
    }

    #[test]
    fn test_generate_json_entry_point() {
        let compiler = compiler();
        let output = compiler
            .generate_json(&json!(["p-[24px]", 42]), &json!({ "minify": true }))
            .unwrap();
        assert_eq!(output.css, r".p-\[24px\]{padding:24px}");
        assert_eq!(output.stats.total_input, 2);
        assert_eq!(output.stats.invalid_classes, 1);
        assert_eq!(output.invalid[0].kind, RejectionKind::InvalidInput);

        assert!(matches!(
            compiler.generate_json(&json!(42), &json!({})),
            Err(CompileError::InvalidBatch { .. })
        ));
        assert!(matches!(
            compiler.generate_json(&json!([]), &json!({ "bogus": 1 })),
            Err(CompileError::InvalidOptions { .. })
        ));
    }
}
