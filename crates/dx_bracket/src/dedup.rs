//! Groups rules that share a declaration block so the stylesheet emits each block once.

use ahash::AHashMap;
use serde::Serialize;

use crate::rule::{CssRule, Declaration};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedRule {
    pub selectors: Vec<String>,
    pub class_names: Vec<String>,
    pub declarations: Vec<Declaration>,
    pub declaration_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(skip)]
    pub min_width: Option<u32>,
    /// Highest priority among the merged rules.
    pub priority: u32,
}

impl GroupedRule {
    fn from_rule(rule: &CssRule) -> Self {
        Self {
            selectors: vec![rule.selector.clone()],
            class_names: vec![rule.class_name.clone()],
            declarations: rule.declarations.clone(),
            declaration_string: rule.declaration_string.clone(),
            media: rule.media.clone(),
            min_width: rule.min_width,
            priority: rule.priority,
        }
    }

    fn absorb(&mut self, rule: &CssRule) {
        if !self.selectors.contains(&rule.selector) {
            self.selectors.push(rule.selector.clone());
        }
        if !self.class_names.contains(&rule.class_name) {
            self.class_names.push(rule.class_name.clone());
        }
        self.priority = self.priority.max(rule.priority);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Deduplicator;

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }

    /// Merges rules keyed by `(media, declaration_string)`, first-seen order.
    pub fn group<'a>(&self, rules: impl IntoIterator<Item = &'a CssRule>) -> Vec<GroupedRule> {
        let mut index: AHashMap<(Option<&'a str>, &'a str), usize> = AHashMap::new();
        let mut groups: Vec<GroupedRule> = Vec::new();

        for rule in rules {
            let key = (rule.media.as_deref(), rule.declaration_string.as_str());
            match index.get(&key) {
                Some(&slot) => groups[slot].absorb(rule),
                None => {
                    index.insert(key, groups.len());
                    groups.push(GroupedRule::from_rule(rule));
                }
            }
        }

        tracing::debug!(groups = groups.len(), "grouped rules");
        groups
    }

    /// One group per rule, used when selector grouping is turned off.
    pub fn singletons<'a>(&self, rules: impl IntoIterator<Item = &'a CssRule>) -> Vec<GroupedRule> {
        rules.into_iter().map(GroupedRule::from_rule).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::declaration_string;
    use pretty_assertions::assert_eq;

    fn rule(class_name: &str, property: &str, value: &str, media: Option<&str>) -> CssRule {
        let declarations = vec![Declaration {
            property: property.into(),
            value: value.into(),
            important: false,
        }];
        CssRule {
            selector: format!(".{class_name}"),
            declaration_string: declaration_string(&declarations),
            declarations,
            class_name: class_name.into(),
            property: property.into(),
            value: value.into(),
            priority: if media.is_some() { 11 } else { 10 },
            media: media.map(str::to_string),
            min_width: media.map(|_| 768),
        }
    }

    #[test]
    fn test_identical_declarations_share_a_group() {
        let rules = vec![
            rule("a", "padding", "24px", None),
            rule("b", "margin", "1px", None),
            rule("c", "padding", "24px", None),
        ];
        let groups = Deduplicator::new().group(&rules);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].selectors, vec![".a".to_string(), ".c".to_string()]);
        assert_eq!(groups[0].class_names, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(groups[1].selectors, vec![".b".to_string()]);
    }

    #[test]
    fn test_media_separates_groups() {
        let rules = vec![
            rule("a", "padding", "24px", None),
            rule("b", "padding", "24px", Some("@media (min-width: 768px)")),
        ];
        let groups = Deduplicator::new().group(&rules);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].priority, 11);
    }

    #[test]
    fn test_singletons_keep_every_rule() {
        let rules = vec![rule("a", "padding", "24px", None), rule("c", "padding", "24px", None)];
        assert_eq!(Deduplicator::new().singletons(&rules).len(), 2);
    }
}
