//! Normalize: four local rewrite rules that canonicalize `Concat`
//! structure, from *"A Suite of Abstract Domains for Static Analysis of
//! String Values"*.
//!
//! Same traversal discipline as [`compact`][crate::graph::StringGraph::compact]:
//! post-order, each node once, never across an edge to a node already being
//! processed. Subtrees whose cached `normalized` flag is set are skipped
//! entirely; the flag is set on every visited node once its rules have been
//! applied.

use std::collections::HashSet;

use log::debug;

use crate::graph::StringGraph;
use crate::node::{Label, NodeId};

impl StringGraph {
    /// Bring the graph into normal form, children first.
    pub fn normalize(&mut self) {
        debug!("normalize({})", self.root());
        let mut visited = HashSet::new();
        self.normalize_from(self.root(), &mut visited);
    }

    fn normalize_from(&mut self, id: NodeId, visited: &mut HashSet<NodeId>) {
        if !visited.insert(id) || self.is_normalized(id) {
            return;
        }
        for child in self.children(id).to_vec() {
            self.normalize_from(child, visited);
        }
        self.normalize_rules(id);
        self.set_normalized(id, true);
    }

    fn normalize_rules(&mut self, id: NodeId) {
        // Rule 1: a CONCAT with a single part becomes that part.
        if self.label(id) == Label::Concat && self.children(id).len() == 1 {
            let child = self.children(id)[0];
            debug!("normalize: absorbing single part {} into {}", child, id);
            self.absorb_child(id, child);
        }

        // Rule 2: a CONCAT of MAX parts denotes any string.
        if self.label(id) == Label::Concat
            && !self.children(id).is_empty()
            && self.children(id).iter().all(|&c| self.label(c) == Label::Max)
        {
            debug!("normalize: CONCAT of MAX parts => MAX at {}", id);
            self.set_label(id, Label::Max);
            self.remove_all_children(id);
        }

        // Rule 3: merge adjacent CONCAT parts that are not shared. The
        // second sibling's parts move to the tail of the first, which
        // preserves concatenation order.
        if self.label(id) == Label::Concat && self.children(id).len() >= 2 {
            let mut pos = 0;
            while pos + 1 < self.children(id).len() {
                let prev = self.children(id)[pos];
                let curr = self.children(id)[pos + 1];
                if self.label(prev) == Label::Concat
                    && self.label(curr) == Label::Concat
                    && self.parents(prev).len() == 1
                    && self.parents(curr).len() == 1
                {
                    debug!("normalize: merging sibling {} into {}", curr, prev);
                    let moved = self.children(curr).to_vec();
                    self.remove_all_children(curr);
                    self.add_children(prev, moved);
                    self.remove_child(id, curr);
                } else {
                    pos += 1;
                }
            }
        }

        // Rule 4: splice unshared CONCAT parts in place.
        if self.label(id) == Label::Concat
            && self
                .children(id)
                .iter()
                .any(|&c| self.label(c) == Label::Concat && self.parents(c).len() == 1)
        {
            let mut rebuilt = Vec::new();
            for child in self.children(id).to_vec() {
                if self.label(child) == Label::Concat && self.parents(child).len() == 1 {
                    let grandchildren = self.children(child).to_vec();
                    self.remove_all_children(child);
                    rebuilt.extend(grandchildren);
                } else {
                    rebuilt.push(child);
                }
            }
            self.remove_all_children(id);
            self.add_children(id, rebuilt);
        }
    }
}
