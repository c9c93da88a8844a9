//! Dependency normalization: reconciles the `Requires` and `RequiredBy`
//! relations into a single consistent set of edges.

use std::collections::{HashMap, HashSet};

use pm_core::PluginAttributes;
use tracing::debug;

/// Makes `requires` and `required_by` mutually consistent across the set.
///
/// For every known `B` in `A.requires`, `A` is added to `B.required_by`.
/// For every `B` in `A.required_by`, `A` is added to `B.requires` when `B`
/// is known; an unknown `B` is appended to `A.requires` instead, so the
/// validator reports it as a missing dependency. Edge lists are
/// de-duplicated, plugin order is preserved, and the operation is
/// idempotent.
pub fn normalize(mut plugins: Vec<PluginAttributes>) -> Vec<PluginAttributes> {
    let index: HashMap<String, usize> = plugins
        .iter()
        .enumerate()
        .map(|(i, plugin)| (plugin.name.clone(), i))
        .collect();

    // Declared lists may repeat a name; collapse them up front so the
    // executor's wait counting stays exact.
    for plugin in &mut plugins {
        dedup(&mut plugin.requires);
        dedup(&mut plugin.required_by);
    }

    for i in 0..plugins.len() {
        let name = plugins[i].name.clone();

        for req in plugins[i].requires.clone() {
            if let Some(&ri) = index.get(&req) {
                push_unique(&mut plugins[ri].required_by, &name);
            }
        }

        for rby in plugins[i].required_by.clone() {
            match index.get(&rby) {
                Some(&ri) => push_unique(&mut plugins[ri].requires, &name),
                None => {
                    debug!(plugin = %name, dependent = %rby, "unknown RequiredBy target");
                    push_unique(&mut plugins[i].requires, &rby);
                }
            }
        }
    }

    plugins
}

fn dedup(list: &mut Vec<String>) {
    let mut seen = HashSet::new();
    list.retain(|name| seen.insert(name.clone()));
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(name: &str) -> PluginAttributes {
        PluginAttributes::new(name)
    }

    #[test]
    fn test_requires_implies_required_by() {
        let plugins = normalize(vec![
            plugin("A").with_requires(vec!["D".to_string()]),
            plugin("D"),
        ]);

        assert_eq!(plugins[0].requires, vec!["D"]);
        assert_eq!(plugins[1].required_by, vec!["A"]);
    }

    #[test]
    fn test_required_by_implies_requires() {
        // Scenario: A declares RequiredBy=B; B declares nothing.
        let plugins = normalize(vec![
            plugin("A").with_required_by(vec!["B".to_string()]),
            plugin("B"),
        ]);

        assert_eq!(plugins[0].required_by, vec!["B"]);
        assert_eq!(plugins[1].requires, vec!["A"]);
    }

    #[test]
    fn test_unknown_required_by_lands_in_requires() {
        let plugins = normalize(vec![plugin("A").with_required_by(vec!["ghost".to_string()])]);

        // The unknown dependent becomes a requirement so validation
        // reports it as missing.
        assert_eq!(plugins[0].requires, vec!["ghost"]);
    }

    #[test]
    fn test_unknown_requires_left_for_validation() {
        let plugins = normalize(vec![plugin("A").with_requires(vec!["ghost".to_string()])]);
        assert_eq!(plugins[0].requires, vec!["ghost"]);
        assert!(plugins[0].required_by.is_empty());
    }

    #[test]
    fn test_declared_duplicates_collapsed() {
        let plugins = normalize(vec![
            plugin("A").with_requires(vec!["D".to_string(), "D".to_string()]),
            plugin("D").with_required_by(vec!["A".to_string()]),
        ]);

        assert_eq!(plugins[0].requires, vec!["D"]);
        assert_eq!(plugins[1].required_by, vec!["A"]);
    }

    #[test]
    fn test_order_preserved() {
        let plugins = normalize(vec![plugin("Z"), plugin("A"), plugin("M")]);
        let names: Vec<_> = plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            plugin("A")
                .with_requires(vec!["D".to_string()])
                .with_required_by(vec!["B".to_string()]),
            plugin("B"),
            plugin("D"),
        ];

        let once = normalize(input);
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }
}
