//! Topological validation of plugin dependencies.

use std::collections::{HashMap, HashSet, VecDeque};

use pm_core::{PluginAttributes, PmError, Result};
use tracing::{debug, warn};

/// Produces a valid execution order, or fails naming the plugins that are
/// stuck in a dependency cycle or waiting on a missing dependency.
///
/// Plugins are seeded in lexicographic name order so the output is
/// deterministic. The loop then drains the waiting queue one generation
/// at a time; a generation that places nothing means the remaining
/// plugins can never run.
pub fn validate_dependencies(plugins: &[PluginAttributes]) -> Result<Vec<String>> {
    let by_name: HashMap<&str, &PluginAttributes> = plugins
        .iter()
        .map(|plugin| (plugin.name.as_str(), plugin))
        .collect();

    let mut sorted_names: Vec<&str> = by_name.keys().copied().collect();
    sorted_names.sort_unstable();

    let mut order = Vec::new();
    let mut satisfied: HashSet<&str> = HashSet::new();
    let mut waiting: VecDeque<&str> = VecDeque::new();

    for name in sorted_names {
        if by_name[name].requires.is_empty() {
            satisfied.insert(name);
            order.push(name.to_string());
        } else {
            waiting.push_back(name);
        }
    }

    let mut prev_len = waiting.len();
    while !waiting.is_empty() {
        for _ in 0..waiting.len() {
            let name = waiting.pop_front().expect("generation is non-empty");
            let met = by_name[name]
                .requires
                .iter()
                .all(|req| satisfied.contains(req.as_str()));
            if met {
                debug!(plugin = name, "dependencies met");
                satisfied.insert(name);
                order.push(name.to_string());
            } else {
                waiting.push_back(name);
            }
        }

        if waiting.len() == prev_len {
            let stuck: Vec<String> = waiting.iter().map(|name| name.to_string()).collect();
            warn!(plugins = ?stuck, "dependency validation failed");
            return Err(PmError::DependencyValidation(stuck));
        }
        prev_len = waiting.len();
    }

    Ok(order)
}
