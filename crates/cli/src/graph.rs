//! Dependency-graph rendering.
//!
//! Keeps a directed graph of the plugin set and rewrites the `.dot`
//! source at every state change, re-rendering the `.svg` image when
//! Graphviz is installed. Node fill colors track plugin state and node
//! URLs link to the plugin file, then to its log file once it finishes.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use petgraph::graph::{DiGraph, NodeIndex};
use pm_core::{PluginAttributes, PluginStatus};
use pm_engine::GraphNotifier;
use tracing::{debug, warn};

struct GraphNode {
    name: String,
    label: String,
    fill: &'static str,
    url: String,
}

struct Inner {
    type_tag: String,
    graph: DiGraph<GraphNode, ()>,
    nodes: HashMap<String, NodeIndex>,
    dot_available: bool,
}

/// Renders the plugin graph as DOT source and an SVG image.
///
/// Rendering is best-effort: failures are logged and never surface to the
/// run. Thread-safe so notifications could move off the scheduler without
/// changing this type.
pub struct DotRenderer {
    dot_path: PathBuf,
    svg_path: PathBuf,
    inner: Mutex<Inner>,
}

impl DotRenderer {
    /// Graph artifacts are `<artifact_stem>.dot` and `<artifact_stem>.svg`.
    pub fn new(artifact_stem: &str) -> Self {
        Self {
            dot_path: PathBuf::from(format!("{artifact_stem}.dot")),
            svg_path: PathBuf::from(format!("{artifact_stem}.svg")),
            inner: Mutex::new(Inner {
                type_tag: String::new(),
                graph: DiGraph::new(),
                nodes: HashMap::new(),
                dot_available: true,
            }),
        }
    }

    /// Path of the rendered image.
    pub fn image_path(&self) -> &Path {
        &self.svg_path
    }

    fn render(&self, inner: &mut Inner) {
        let source = dot_source(inner);
        if let Err(err) = fs::write(&self.dot_path, source) {
            warn!(file = %self.dot_path.display(), error = %err, "failed to write dot file");
            return;
        }
        if !inner.dot_available {
            return;
        }

        let result = Command::new("dot")
            .arg("-Tsvg")
            .arg(&self.dot_path)
            .arg("-o")
            .arg(&self.svg_path)
            .output();
        match result {
            Ok(out) if !out.status.success() => {
                warn!(status = %out.status, "dot returned an error");
            }
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("graphviz 'dot' not installed; skipping SVG generation");
                inner.dot_available = false;
            }
            Err(err) => warn!(error = %err, "failed to run 'dot'"),
        }
    }
}

impl GraphNotifier for DotRenderer {
    fn init(&self, plugin_type: &str, plugins: &[PluginAttributes]) {
        let mut inner = self.inner.lock().expect("graph state poisoned");
        inner.type_tag = plugin_type.to_string();
        inner.graph = DiGraph::new();
        inner.nodes = HashMap::new();

        // Sorted so the generated source is stable run over run.
        let mut sorted: Vec<&PluginAttributes> = plugins.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        for plugin in &sorted {
            let idx = inner.graph.add_node(GraphNode {
                name: plugin.name.clone(),
                label: plugin.description.clone(),
                fill: "lightgrey",
                url: plugin.name.clone(),
            });
            inner.nodes.insert(plugin.name.clone(), idx);
        }

        for plugin in &sorted {
            let to = inner.nodes[&plugin.name];
            for req in &plugin.requires {
                // A requirement outside the set still gets a node, so
                // missing dependencies show up in the image.
                let from = match inner.nodes.get(req) {
                    Some(&idx) => idx,
                    None => {
                        let idx = inner.graph.add_node(GraphNode {
                            name: req.clone(),
                            label: req.clone(),
                            fill: "lightgrey",
                            url: req.clone(),
                        });
                        inner.nodes.insert(req.clone(), idx);
                        idx
                    }
                };
                inner.graph.add_edge(from, to, ());
            }
        }

        self.render(&mut inner);
    }

    fn update(&self, _plugin_type: &str, plugin: &str, status: PluginStatus, url: &str) {
        let mut inner = self.inner.lock().expect("graph state poisoned");
        if let Some(&idx) = inner.nodes.get(plugin) {
            let node = &mut inner.graph[idx];
            node.fill = status_color(status);
            if !url.is_empty() {
                node.url = url.to_string();
            }
        }
        self.render(&mut inner);
    }
}

fn status_color(status: PluginStatus) -> &'static str {
    match status {
        PluginStatus::Starting => "blue",
        PluginStatus::Succeeded => "green",
        PluginStatus::Failed => "red",
        PluginStatus::Skipped => "yellow",
    }
}

fn dot_source(inner: &Inner) -> String {
    let mut out = String::from("digraph {\n");
    out.push_str("subgraph cluster_0 {\n");
    out.push_str(&format!("label=\"{} plugins\"\n", escape(&inner.type_tag)));
    out.push_str("labelloc=t\nfontsize=24\n");
    out.push_str("node [shape=polygon,sides=6,style=filled,fillcolor=lightgrey]\n");

    for node in inner.graph.node_weights() {
        out.push_str(&format!(
            "\"{}\" [label=\"{}\",style=filled,fillcolor={},URL=\"{}\"]\n",
            escape(&node.name),
            escape(&node.label),
            node.fill,
            escape(&node.url),
        ));
    }
    for edge in inner.graph.edge_indices() {
        let (from, to) = inner
            .graph
            .edge_endpoints(edge)
            .expect("edge index from the same graph");
        out.push_str(&format!(
            "\"{}\" -> \"{}\"\n",
            escape(&inner.graph[from].name),
            escape(&inner.graph[to].name),
        ));
    }

    out.push_str("}\n}\n");
    out
}

fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn plugin(name: &str, description: &str, requires: &[&str]) -> PluginAttributes {
        PluginAttributes::new(name)
            .with_description(description)
            .with_requires(requires.iter().map(|r| r.to_string()).collect())
    }

    #[test]
    fn test_init_writes_nodes_and_edges() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("pm.test").display().to_string();
        let renderer = DotRenderer::new(&stem);

        renderer.init(
            "prereboot",
            &[
                plugin("A/a.prereboot", "Checking \"A\"", &["D/d.prereboot"]),
                plugin("D/d.prereboot", "Checking D", &[]),
            ],
        );

        let source = fs::read_to_string(format!("{stem}.dot")).unwrap();
        assert!(source.contains("label=\"prereboot plugins\""));
        assert!(source.contains("\"A/a.prereboot\" [label=\"Checking \\\"A\\\"\""));
        assert!(source.contains("fillcolor=lightgrey"));
        assert!(source.contains("\"D/d.prereboot\" -> \"A/a.prereboot\""));
    }

    #[test]
    fn test_update_changes_color_and_url() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("pm.test").display().to_string();
        let renderer = DotRenderer::new(&stem);

        renderer.init("prereboot", &[plugin("D/d.prereboot", "d", &[])]);
        renderer.update(
            "prereboot",
            "D/d.prereboot",
            PluginStatus::Succeeded,
            "plugins/D:d.prereboot.ts.log",
        );

        let source = fs::read_to_string(format!("{stem}.dot")).unwrap();
        assert!(source.contains("fillcolor=green"));
        assert!(source.contains("URL=\"plugins/D:d.prereboot.ts.log\""));
    }

    #[test]
    fn test_update_for_unknown_plugin_is_ignored() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("pm.test").display().to_string();
        let renderer = DotRenderer::new(&stem);

        renderer.init("prereboot", &[plugin("D/d.prereboot", "d", &[])]);
        renderer.update("prereboot", "ghost", PluginStatus::Failed, "");

        let source = fs::read_to_string(format!("{stem}.dot")).unwrap();
        assert!(!source.contains("ghost"));
    }

    #[test]
    fn test_missing_dependency_gets_a_node() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("pm.test").display().to_string();
        let renderer = DotRenderer::new(&stem);

        renderer.init("prereboot", &[plugin("A/a.prereboot", "a", &["ghost"])]);

        let source = fs::read_to_string(format!("{stem}.dot")).unwrap();
        assert!(source.contains("\"ghost\" -> \"A/a.prereboot\""));
    }
}
