//! End-to-end tests for the compile pipeline: token in, CSS or rejection out.

use std::sync::Arc;

use dx_bracket::{
    ClassCompiler, CompilerConfig, GenerationOptions, ManualClock, RejectionKind, RiskLevel, Tables,
    ValueType,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn compiler() -> ClassCompiler {
    let mut config = CompilerConfig::default();
    config.cache.sweep_interval_ms = None;
    ClassCompiler::with_parts(config, Tables::default(), Arc::new(ManualClock::new()))
        .expect("default compiler should build")
}

/// The canonical single-class example renders as one escaped rule.
#[test]
fn test_padding_class_renders_escaped_rule() {
    let compiler = compiler();
    let output = compiler
        .generate(["p-[24px]"], &GenerationOptions::default())
        .unwrap();

    assert_eq!(output.css, ".p-\\[24px\\] {\n  padding: 24px;\n}\n");
    assert_eq!(output.stats.valid_classes, 1);
    assert_eq!(output.stats.generated_rules, 1);
    assert!(output.invalid.is_empty());
}

#[test]
fn test_values_are_normalized_and_typed() {
    let compiler = compiler();

    let bg = compiler.compile_class("bg-[#FFF]").unwrap();
    assert_eq!(bg.property, "background-color");
    assert_eq!(bg.value, "#ffffff");
    assert_eq!(bg.metadata.value_type, ValueType::Color);

    let text = compiler.compile_class("text-[16px]").unwrap();
    assert_eq!(text.property, "font-size");

    let text_color = compiler.compile_class("text-[hsl(360,100%,50%)]").unwrap();
    assert_eq!(text_color.property, "color");

    let margin = compiler.compile_class("m-[10px 20px]").unwrap();
    assert_eq!(margin.value, "10px 20px");
    assert_eq!(
        margin.metadata.sides.clone().unwrap(),
        ["10px", "20px", "10px", "20px"].map(String::from)
    );
}

#[test]
fn test_out_of_range_colors_are_rejected() {
    let compiler = compiler();
    for token in ["bg-[rgb(256,0,0)]", "bg-[hsl(400,50%,50%)]"] {
        let rejection = compiler.compile_class(token).unwrap_err();
        assert_eq!(rejection.kind, RejectionKind::InvalidCssValue, "{token}");
    }
    assert!(compiler.compile_class("bg-[rgb(255,0,0)]").is_ok());
}

/// Dangerous tokens are stopped before the grammar ever sees them.
#[test]
fn test_dangerous_tokens_short_circuit() {
    let compiler = compiler();
    for token in [
        "w-[expression(alert(1))]",
        "bg-[url(javascript:alert(1))]",
        "w-[<script>]",
    ] {
        let rejection = compiler.compile_class(token).unwrap_err();
        assert_eq!(rejection.kind, RejectionKind::DangerousInput, "{token}");
        assert!(rejection.risk.unwrap() >= RiskLevel::High);
    }
    let expression = compiler.compile_class("w-[expression(alert(1))]").unwrap_err();
    assert_eq!(expression.risk, Some(RiskLevel::Critical));
}

#[test]
fn test_rejections_carry_suggestions() {
    let compiler = compiler();

    let shorthand = compiler.compile_class("p-24px").unwrap_err();
    assert_eq!(shorthand.kind, RejectionKind::InvalidSyntax);
    assert!(shorthand.suggestions.iter().any(|s| s.contains("p-[24px]")));

    let variant = compiler.compile_class("hovr:p-[1px]").unwrap_err();
    assert!(variant.suggestions.contains(&"hover".to_string()));

    let prefix = compiler.compile_class("pading-[1px]").unwrap_err();
    assert_eq!(prefix.kind, RejectionKind::PropertyNotSupported);
    assert!(!prefix.suggestions.is_empty());
}

/// A bad token never takes the rest of the batch down with it.
#[test]
fn test_batch_keeps_going_past_bad_tokens() {
    let compiler = compiler();
    let result = compiler.compile_batch(["p-[24px]", "p-[24px]", "nope", "w-[50%]", "p-[abc]"]);

    assert_eq!(result.total_input, 5);
    let names: Vec<&str> = result.classes.iter().map(|c| c.class_name.as_str()).collect();
    assert_eq!(names, vec!["p-[24px]", "w-[50%]"]);
    let kinds: Vec<RejectionKind> = result.invalid.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RejectionKind::InvalidSyntax, RejectionKind::InvalidCssValue]);
}

#[test]
fn test_identical_declarations_group_into_one_rule() {
    let compiler = compiler();
    let output = compiler
        .generate("p-[1px] hover:p-[1px]", &GenerationOptions::default())
        .unwrap();

    assert_eq!(output.stats.generated_rules, 2);
    assert_eq!(output.stats.grouped_rules, 1);
    assert_eq!(output.stats.compression_ratio, 0.5);
    assert_eq!(
        output.rules[0].selectors,
        vec![".p-\\[1px\\]".to_string(), ".hover\\:p-\\[1px\\]:hover".to_string()]
    );
    assert_eq!(output.css, ".p-\\[1px\\],\n.hover\\:p-\\[1px\\]:hover {\n  padding: 1px;\n}\n");

    let ungrouped = compiler
        .generate(
            "p-[1px] hover:p-[1px]",
            &GenerationOptions {
                group_selectors: false,
                ..GenerationOptions::default()
            },
        )
        .unwrap();
    assert_eq!(ungrouped.stats.grouped_rules, 2);
}

#[test]
fn test_media_rules_follow_plain_rules_by_width() {
    let compiler = compiler();
    let output = compiler
        .generate("lg:p-[3px] p-[1px] sm:p-[2px]", &GenerationOptions::default())
        .unwrap();

    let plain = output.css.find(".p-\\[1px\\]").unwrap();
    let sm = output.css.find("@media (min-width: 640px)").unwrap();
    let lg = output.css.find("@media (min-width: 1024px)").unwrap();
    assert!(plain < sm && sm < lg);
    assert!(output.css.contains("@media (min-width: 640px) {\n  .sm\\:p-\\[2px\\] {\n    padding: 2px;\n  }\n}\n"));
}

#[test]
fn test_breakpoint_with_leading_digit_is_hex_escaped() {
    let compiler = compiler();
    let output = compiler
        .generate(["2xl:w-[10px]"], &GenerationOptions { minify: true, ..GenerationOptions::default() })
        .unwrap();
    assert_eq!(output.css, "@media (min-width: 1536px){\\32 xl\\:w-\\[10px\\]{width:10px}}");
}

#[test]
fn test_scope_important_and_comments() {
    let compiler = compiler();
    let options = GenerationOptions {
        scope: Some(".app".into()),
        important: true,
        include_comments: true,
        ..GenerationOptions::default()
    };
    let output = compiler.generate(["p-[24px]"], &options).unwrap();
    assert_eq!(
        output.css,
        "/* p-[24px] */\n.app .p-\\[24px\\] {\n  padding: 24px !important;\n}\n"
    );
}

#[test]
fn test_json_entry_point_reports_every_problem() {
    let compiler = compiler();
    let output = compiler
        .generate_json(&json!(["p-[24px]", null, "bogus"]), &json!({ "includeComments": false }))
        .unwrap();
    assert_eq!(output.stats.total_input, 3);
    assert_eq!(output.stats.valid_classes, 1);
    assert_eq!(output.stats.invalid_classes, 2);

    let serialized = serde_json::to_value(&output).unwrap();
    assert_eq!(serialized["stats"]["validClasses"], json!(1));
    assert_eq!(serialized["stats"]["fromCache"], json!(false));
    assert!(serialized["invalid"].as_array().unwrap().iter().any(|r| r["kind"] == json!("InvalidSyntax")));
}

/// Cold and warm parses agree, and a compiler with a fresh cache agrees with both.
#[test]
fn test_parsing_is_deterministic_across_caches() {
    let first = compiler();
    let second = compiler();
    for token in ["p-[24px]", "md:hover:text-[16px]", "bg-[linear-gradient(red,blue)]", "m-[1px 2px 3px]"] {
        let cold = first.compile_class(token).unwrap();
        let warm = first.compile_class(token).unwrap();
        let fresh = second.compile_class(token).unwrap();
        assert_eq!(cold, warm);
        assert_eq!(cold, fresh);
    }
}
