//! String graph to DOT (Graphviz) conversion.
//!
//! This module renders a string graph in DOT format so it can be inspected
//! with Graphviz tools like `dot` or online viewers. Every node reachable
//! from the root is emitted exactly once, so graphs with back edges come
//! out as plain cyclic digraphs instead of infinite unfoldings.
//!
//! # Conventions
//!
//! - Leaf nodes (`SIMPLE`, `MAX`, `EMPTY`) are boxes; `CONCAT` and `OR`
//!   nodes are ellipses.
//! - `SIMPLE` nodes are labeled with their character (or their numeric
//!   bound for placeholders); inner nodes with their label name.
//! - Edge order follows child order, which matters for `CONCAT`.
//!
//! # Examples
//!
//! ```
//! use stringgraph_rs::graph::StringGraph;
//!
//! let g = StringGraph::from_literal("hi");
//! let dot = g.to_dot().unwrap();
//! assert!(dot.starts_with("digraph stringgraph {"));
//! // Render with: dot -Tpng graph.dot -o graph.png
//! ```

use std::collections::HashSet;
use std::fmt::Write;

use crate::graph::StringGraph;
use crate::node::{Label, NodeId};

impl StringGraph {
    /// Convert the graph to DOT (Graphviz) format.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "digraph stringgraph {{")?;
        writeln!(out, "  rankdir=TB;")?;

        let mut order = Vec::new();
        collect_reachable(self, self.root(), &mut HashSet::new(), &mut order);

        for &id in &order {
            let label = match self.label(id) {
                Label::Simple => match self.character(id) {
                    Some(letter) => letter.to_string(),
                    None => self.bound(id).unwrap_or(0).to_string(),
                },
                other => other.to_string(),
            };
            let shape = if self.children(id).is_empty() { "box" } else { "ellipse" };
            writeln!(out, "  n{} [label=\"{}\", shape={}];", id.index(), label, shape)?;
        }
        for &id in &order {
            for &child in self.children(id) {
                writeln!(out, "  n{} -> n{};", id.index(), child.index())?;
            }
        }

        writeln!(out, "}}")?;
        Ok(out)
    }
}

fn collect_reachable(g: &StringGraph, id: NodeId, seen: &mut HashSet<NodeId>, order: &mut Vec<NodeId>) {
    if !seen.insert(id) {
        return;
    }
    order.push(id);
    for &child in g.children(id) {
        collect_reachable(g, child, seen, order);
    }
}
