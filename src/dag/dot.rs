// src/dag/dot.rs

//! Graphviz rendering of a [`Graph`].
//!
//! Output is sorted (edge groups by source name, targets by name, start and
//! end sets by name) so rendering an unchanged graph twice yields identical
//! text.

use crate::dag::Graph;

/// Attribute lists copied verbatim into the output, e.g. `rankdir=LR`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotOptions {
    pub graph_attrs: Vec<String>,
    pub node_attrs: Vec<String>,
    pub edge_attrs: Vec<String>,
}

impl DotOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph_attr(mut self, attr: impl Into<String>) -> Self {
        self.graph_attrs.push(attr.into());
        self
    }

    pub fn with_node_attr(mut self, attr: impl Into<String>) -> Self {
        self.node_attrs.push(attr.into());
        self
    }

    pub fn with_edge_attr(mut self, attr: impl Into<String>) -> Self {
        self.edge_attrs.push(attr.into());
        self
    }
}

impl Graph {
    pub fn dot(&self, options: &DotOptions) -> String {
        let mut out = String::from("\ndigraph G {\n");

        attr_line(&mut out, "graph", &options.graph_attrs);
        attr_line(&mut out, "node", &options.node_attrs);
        attr_line(&mut out, "edge", &options.edge_attrs);

        out.push_str("\"start\"[shape=box,color=\"green\"]\n");
        out.push_str("\"end\"[shape=box,color=\"red\"]\n");

        let mut groups: Vec<(&str, Vec<&str>)> = self
            .node_ids()
            .filter_map(|id| {
                let mut targets: Vec<&str> = self
                    .successors(id)
                    .into_iter()
                    .map(|next| self.name(next))
                    .collect();
                if targets.is_empty() {
                    return None;
                }
                targets.sort_unstable();
                targets.dedup();
                Some((self.name(id), targets))
            })
            .collect();
        groups.sort_unstable_by(|a, b| a.0.cmp(b.0));

        for (from, targets) in &groups {
            out.push_str(&format!("{} -> {{{}}}\n", quote(from), quoted_list(targets)));
        }

        out.push_str(&format!("\"start\" -> {{{}}}\n", quoted_list(&self.sources())));
        out.push_str(&format!("{{{}}}  -> \"end\"\n", quoted_list(&self.sinks())));
        out.push_str("}\n");
        out
    }
}

fn attr_line(out: &mut String, kind: &str, attrs: &[String]) {
    if !attrs.is_empty() {
        out.push_str(&format!("{kind} [{}]\n", attrs.join(",")));
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quoted_list(names: &[&str]) -> String {
    names.iter().map(|n| quote(n)).collect::<Vec<_>>().join(",")
}
