//! Compact: eight local rewrite rules that eliminate redundant `Or` and
//! `Empty` structure, from Janssens and Bruynooghe, *"Deriving Descriptions
//! of Possible Values of Program Variables by Means of Abstract
//! Interpretation"*.
//!
//! The pass is a single post-order traversal that visits every reachable
//! node once; edges to already-visited nodes (in particular back edges) are
//! not followed, which makes the pass terminate on cyclic graphs. One pass
//! is not guaranteed to reach a global fixpoint on deeply nested shapes:
//! callers that need full canonicalization run compact followed by
//! [`normalize`][crate::graph::StringGraph::normalize], as the domain
//! operations do.

use std::collections::HashSet;

use log::debug;

use crate::graph::StringGraph;
use crate::node::{Label, NodeId};

impl StringGraph {
    /// Apply the compact rules once at every reachable node, children
    /// first.
    pub fn compact(&mut self) {
        debug!("compact({})", self.root());
        let mut visited = HashSet::new();
        self.compact_from(self.root(), &mut visited);
    }

    fn compact_from(&mut self, id: NodeId, visited: &mut HashSet<NodeId>) {
        if !visited.insert(id) {
            return;
        }
        for child in self.children(id).to_vec() {
            self.compact_from(child, visited);
        }
        self.compact_rules(id);
    }

    fn compact_rules(&mut self, id: NodeId) {
        // Rule 1: a CONCAT that denotes no string collapses to EMPTY.
        if self.label(id) == Label::Concat && !self.has_nonempty_denotation(id) {
            debug!("compact: CONCAT with empty denotation => EMPTY at {}", id);
            self.set_label(id, Label::Empty);
            self.remove_all_children(id);
        }

        // Rule 2: drop EMPTY alternatives.
        if self.label(id) == Label::Or {
            for child in self.children(id).to_vec() {
                if self.label(child) == Label::Empty {
                    self.remove_child(id, child);
                }
            }
        }

        // Rule 3: drop a self-loop alternative.
        if self.label(id) == Label::Or && self.children(id).contains(&id) {
            debug!("compact: OR with itself as alternative at {}", id);
            self.remove_child(id, id);
        }

        // Rule 4: an OR with no alternatives left denotes nothing.
        if self.label(id) == Label::Or && self.children(id).is_empty() {
            self.set_label(id, Label::Empty);
        }

        // Rule 5: a MAX alternative absorbs the whole OR.
        if self.label(id) == Label::Or
            && self.children(id).iter().any(|&c| self.label(c) == Label::Max)
        {
            debug!("compact: OR with MAX alternative => MAX at {}", id);
            self.set_label(id, Label::Max);
            self.remove_all_children(id);
        }

        // Rule 6: splice unshared OR alternatives into this OR.
        if self.label(id) == Label::Or {
            for child in self.children(id).to_vec() {
                if child != id && self.label(child) == Label::Or && self.parents(child).len() == 1 {
                    let grandchildren = self.children(child).to_vec();
                    self.remove_all_children(child);
                    self.remove_child(id, child);
                    self.add_children(id, grandchildren);
                }
            }
        }

        // Rule 7: an OR with a single alternative becomes that alternative.
        if self.label(id) == Label::Or && self.children(id).len() == 1 {
            let child = self.children(id)[0];
            debug!("compact: absorbing single alternative {} into {}", child, id);
            self.absorb_child(id, child);
        }

        // Rule 8: an OR alternative shared with other parents gets those
        // parents rewired onto this node, keeping one shared alternative.
        if self.label(id) == Label::Or {
            for child in self.children(id).to_vec() {
                if self.label(child) == Label::Or && self.parents(child).len() > 1 {
                    debug!("compact: rewiring the other parents of {} onto {}", child, id);
                    for parent in self.parents(child).to_vec() {
                        if parent != id {
                            self.remove_child(parent, child);
                            self.add_child(parent, id);
                        }
                    }
                }
            }
        }
    }

    /// Whether the set of finite strings this node denotes is non-empty:
    /// a `Concat` requires every part, an `Or` at least one alternative.
    /// A node reached through its own unfolding counts as non-empty, the
    /// same coinductive reading the partial order uses.
    pub(crate) fn has_nonempty_denotation(&self, id: NodeId) -> bool {
        self.nonempty_denotation_guarded(id, &mut HashSet::new())
    }

    fn nonempty_denotation_guarded(&self, id: NodeId, on_stack: &mut HashSet<NodeId>) -> bool {
        if !on_stack.insert(id) {
            return true;
        }
        let result = match self.label(id) {
            Label::Concat if !self.children(id).is_empty() => self
                .children(id)
                .iter()
                .all(|&c| self.nonempty_denotation_guarded(c, on_stack)),
            Label::Or => self
                .children(id)
                .iter()
                .any(|&c| self.nonempty_denotation_guarded(c, on_stack)),
            label => label == Label::Simple || label == Label::Max,
        };
        on_stack.remove(&id);
        result
    }
}
