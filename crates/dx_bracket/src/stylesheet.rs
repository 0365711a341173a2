//! Final CSS text assembly.

use crate::dedup::GroupedRule;
use crate::options::GenerationOptions;
use crate::rule::declarations_css;

/// Orders groups for output: plain rules first, then media rules by ascending width.
///
/// The sort is stable, so groups with equal width and priority keep their first appearance.
pub fn order(groups: &mut [GroupedRule]) {
    groups.sort_by_key(|group| (group.min_width.is_some(), group.min_width.unwrap_or(0), group.priority));
}

pub fn assemble(groups: &[GroupedRule], options: &GenerationOptions) -> String {
    let mut ordered = groups.to_vec();
    order(&mut ordered);

    let mut buf = String::with_capacity(ordered.len() * 48);
    for group in &ordered {
        write_group(&mut buf, group, options);
    }
    buf
}

fn write_group(buf: &mut String, group: &GroupedRule, options: &GenerationOptions) {
    let minify = options.minify;
    if options.include_comments && !minify {
        buf.push_str("/* ");
        buf.push_str(&comment_text(&group.class_names.join(", ")));
        buf.push_str(" */\n");
    }

    let body = declarations_css(&group.declarations, minify);
    match (&group.media, minify) {
        (Some(media), true) => {
            buf.push_str(media);
            buf.push('{');
            buf.push_str(&group.selectors.join(","));
            buf.push('{');
            buf.push_str(&body);
            buf.push_str("}}");
        }
        (Some(media), false) => {
            buf.push_str(media);
            buf.push_str(" {\n");
            let selectors: Vec<String> = group.selectors.iter().map(|s| format!("  {s}")).collect();
            buf.push_str(&selectors.join(",\n"));
            buf.push_str(" {\n");
            for declaration in &group.declarations {
                buf.push_str("    ");
                buf.push_str(&declaration.to_css(false));
                buf.push_str(";\n");
            }
            buf.push_str("  }\n}\n");
        }
        (None, true) => {
            buf.push_str(&group.selectors.join(","));
            buf.push('{');
            buf.push_str(&body);
            buf.push('}');
        }
        (None, false) => {
            buf.push_str(&group.selectors.join(",\n"));
            buf.push_str(" {\n");
            for declaration in &group.declarations {
                buf.push_str("  ");
                buf.push_str(&declaration.to_css(false));
                buf.push_str(";\n");
            }
            buf.push_str("}\n");
        }
    }
}

// Class names may contain `*/`, which would close the comment early.
fn comment_text(text: &str) -> String {
    text.replace("*/", "* /")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Declaration;
    use pretty_assertions::assert_eq;

    fn group(selectors: &[&str], property: &str, value: &str, min_width: Option<u32>) -> GroupedRule {
        GroupedRule {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            class_names: selectors.iter().map(|s| s.trim_start_matches('.').to_string()).collect(),
            declarations: vec![Declaration {
                property: property.into(),
                value: value.into(),
                important: false,
            }],
            declaration_string: format!("{property}: {value};"),
            media: min_width.map(|w| format!("@media (min-width: {w}px)")),
            min_width,
            priority: if min_width.is_some() { 11 } else { 10 },
        }
    }

    #[test]
    fn test_pretty_output() {
        let css = assemble(&[group(&[".a", ".b"], "padding", "24px", None)], &GenerationOptions::default());
        assert_eq!(css, ".a,\n.b {\n  padding: 24px;\n}\n");
    }

    #[test]
    fn test_minified_output() {
        let options = GenerationOptions {
            minify: true,
            include_comments: true,
            ..GenerationOptions::default()
        };
        let css = assemble(
            &[
                group(&[".m"], "margin", "1px", Some(768)),
                group(&[".a", ".b"], "padding", "24px", None),
            ],
            &options,
        );
        assert_eq!(css, ".a,.b{padding:24px}@media (min-width: 768px){.m{margin:1px}}");
    }

    #[test]
    fn test_media_ordering_by_width() {
        let css = assemble(
            &[
                group(&[".lg"], "margin", "3px", Some(1024)),
                group(&[".sm"], "margin", "2px", Some(640)),
                group(&[".plain"], "margin", "1px", None),
            ],
            &GenerationOptions::default(),
        );
        let plain = css.find(".plain").unwrap();
        let sm = css.find(".sm").unwrap();
        let lg = css.find(".lg").unwrap();
        assert!(plain < sm && sm < lg);
        assert!(css.contains("@media (min-width: 640px) {\n  .sm {\n    margin: 2px;\n  }\n}\n"));
    }

    #[test]
    fn test_comments_are_sanitized() {
        let options = GenerationOptions {
            include_comments: true,
            ..GenerationOptions::default()
        };
        let mut g = group(&[".a"], "padding", "1px", None);
        g.class_names = vec!["a*/b".into()];
        let css = assemble(&[g], &options);
        assert!(css.starts_with("/* a* /b */\n"));
    }
}
