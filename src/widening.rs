//! Widening machinery: depth and ancestor queries, topological-clash
//! detection, and the two graph rewrites (cycle induction and replacement)
//! that fold unbounded growth into finitely many back edges.
//!
//! Concatenation and join can grow graphs without bound across loop
//! iterations, so the lattice has infinite ascending chains. When the old
//! value `go` is not already above the new value `gn`, the domain joins the
//! two and then looks for a *topological clash*: corresponding vertices
//! that differ in depth or principal labels. A clash is resolved either by
//! *cycle induction* (reroute the edge into the clashing vertex onto an
//! ancestor that subsumes it, creating a back edge) or by *replacement*
//! (substitute the clashing vertex for an unrelated ancestor). The driver
//! in [`domain`][crate::domain] re-joins and repeats until neither rule
//! fires.
//!
//! Every traversal here carries a visited set: the graphs being widened may
//! already contain cycles from earlier widening steps.

use std::collections::{BTreeSet, HashSet};

use log::debug;

use crate::graph::StringGraph;
use crate::node::NodeId;
use crate::order::{check_partial_order, principal_labels};

/// Depth of a vertex: its distance from the root, accumulated over the
/// parent paths, with revisited parents cut off.
pub fn depth(g: &StringGraph, id: NodeId) -> i64 {
    depth_guarded(g, id, &mut HashSet::new())
}

fn depth_guarded(g: &StringGraph, id: NodeId, visited: &mut HashSet<NodeId>) -> i64 {
    if !visited.insert(id) {
        return -1;
    }
    if g.parents(id).is_empty() {
        return 0;
    }
    let mut total = 0;
    for &parent in g.parents(id) {
        total += depth_guarded(g, parent, visited);
    }
    total + 1
}

/// Transitive parents of a vertex. The walk is cycle-guarded, and the
/// result is ordered so that rule selection is deterministic.
pub fn ancestors(g: &StringGraph, id: NodeId) -> BTreeSet<NodeId> {
    let mut seen = BTreeSet::new();
    let mut work: Vec<NodeId> = g.parents(id).to_vec();
    while let Some(node) = work.pop() {
        if seen.insert(node) {
            work.extend(g.parents(node).iter().copied());
        }
    }
    seen
}

/// Whether some pair of corresponding vertices of `go` and `gn` differs in
/// depth or in principal labels, while the roots are related by the
/// partial order.
pub fn topological_clash(go: &StringGraph, gn: &StringGraph) -> bool {
    if !check_partial_order(go, go.root(), gn, gn.root(), &mut HashSet::new()) {
        return false;
    }
    clash_below(go, go.root(), gn, gn.root(), &mut HashSet::new())
}

fn clash_below(
    go: &StringGraph,
    vo: NodeId,
    gn: &StringGraph,
    vn: NodeId,
    seen: &mut HashSet<(NodeId, NodeId)>,
) -> bool {
    if !seen.insert((vo, vn)) {
        return false;
    }
    for &so in go.children(vo) {
        for &sn in gn.children(vn) {
            if clash_below(go, so, gn, sn, seen) {
                return true;
            }
        }
    }
    depth(go, vo) != depth(gn, vn) || principal_labels(go, vo) != principal_labels(gn, vn)
}

/// A topological clash where the new-side vertex additionally disagrees on
/// principal labels at the same depth, or sits strictly deeper than its
/// old-side counterpart.
pub fn widening_topological_clash(go: &StringGraph, gn: &StringGraph) -> bool {
    widening_clash_pair(go, go.root(), gn, gn.root(), &mut HashSet::new())
}

fn widening_clash_pair(
    go: &StringGraph,
    vo: NodeId,
    gn: &StringGraph,
    vn: NodeId,
    seen: &mut HashSet<(NodeId, NodeId)>,
) -> bool {
    if !check_partial_order(go, vo, gn, vn, &mut HashSet::new()) {
        return false;
    }
    if !clash_below(go, vo, gn, vn, &mut HashSet::new()) {
        return false;
    }
    widening_clash_below(go, vo, gn, vn, seen)
}

fn widening_clash_below(
    go: &StringGraph,
    vo: NodeId,
    gn: &StringGraph,
    vn: NodeId,
    seen: &mut HashSet<(NodeId, NodeId)>,
) -> bool {
    if !seen.insert((vo, vn)) {
        return false;
    }
    for &so in go.children(vo) {
        for &sn in gn.children(vn) {
            if widening_clash_pair(go, so, gn, sn, seen) {
                return true;
            }
        }
    }
    let pf_n = principal_labels(gn, vn);
    if pf_n.is_empty() {
        return false;
    }
    let depth_o = depth(go, vo);
    let depth_n = depth(gn, vn);
    (principal_labels(go, vo) != pf_n && depth_o == depth_n) || depth_o < depth_n
}

/// Cycle induction: reroute the root edge into a clashing vertex of `gn`
/// onto one of the vertex's ancestors that subsumes it, introducing a back
/// edge that finitely represents the growth. Returns whether `gn` changed.
pub(crate) fn cycle_induction_rule(go: &StringGraph, gn: &mut StringGraph) -> bool {
    if !widening_topological_clash(go, gn) {
        return false;
    }
    for vn in gn.children(gn.root()).to_vec() {
        if let Some(va) = cycle_induction_target(go, gn, vn) {
            debug!("widening: cycle induction reroutes {} onto ancestor {}", vn, va);
            return replace_edge(gn, vn, va);
        }
    }
    false
}

/// An ancestor `va` of `vn` qualifies when `vn <= va`, some child `vo` of
/// the old root is at least as deep as `va`, and the depth gap between
/// `vo` and `vn` is small.
fn cycle_induction_target(go: &StringGraph, gn: &StringGraph, vn: NodeId) -> Option<NodeId> {
    let candidates = ancestors(gn, vn);
    let depth_n = depth(gn, vn);
    for &vo in go.children(go.root()) {
        let depth_o = depth(go, vo);
        for &va in &candidates {
            if check_partial_order(gn, vn, gn, va, &mut HashSet::new())
                && depth_o >= depth(gn, va)
                && depth_o - depth_n < 2
            {
                return Some(va);
            }
        }
    }
    None
}

/// Replacement: substitute a clashing vertex of `gn` for one of its
/// ancestors that is *not* above it in the partial order but dominates it
/// in depth or structure. Returns whether `gn` changed.
pub(crate) fn replacement_rule(go: &StringGraph, gn: &mut StringGraph) -> bool {
    if !widening_topological_clash(go, gn) {
        return false;
    }
    for vn in gn.children(gn.root()).to_vec() {
        if let Some(va) = replacement_target(go, gn, vn) {
            debug!("widening: replacement substitutes {} for ancestor {}", vn, va);
            return replace_vertex(gn, va, vn);
        }
    }
    false
}

fn replacement_target(go: &StringGraph, gn: &StringGraph, vn: NodeId) -> Option<NodeId> {
    let candidates = ancestors(gn, vn);
    let depth_n = depth(gn, vn);
    let pf_n = principal_labels(gn, vn);
    for &vo in go.children(go.root()) {
        let depth_o = depth(go, vo);
        for &va in &candidates {
            if !check_partial_order(gn, vn, gn, va, &mut HashSet::new())
                && depth_o >= depth(gn, va)
                && (principal_labels(gn, va).is_superset(&pf_n) || depth_o < depth_n)
            {
                return Some(va);
            }
        }
    }
    None
}

/// Swap the root edge into `from_child` for an edge into `to_child`. Both
/// endpoints must still be reachable from the root, otherwise nothing is
/// rewired and the caller must not treat the rule as applied.
fn replace_edge(g: &mut StringGraph, from_child: NodeId, to_child: NodeId) -> bool {
    let root = g.root();
    if !reachable(g, root, from_child) || !reachable(g, root, to_child) {
        return false;
    }
    g.remove_child(root, from_child);
    g.add_child(root, to_child);
    true
}

/// Replace `old` by `new`: every parent of `old` is rewired onto `new`,
/// which also takes over `old`'s children.
fn replace_vertex(g: &mut StringGraph, old: NodeId, new: NodeId) -> bool {
    if old == new {
        return false;
    }
    let root = g.root();
    if !reachable(g, root, old) || !reachable(g, root, new) {
        return false;
    }
    for parent in g.parents(old).to_vec() {
        g.remove_child(parent, old);
        g.add_child(parent, new);
    }
    let children = g.children(old).to_vec();
    g.remove_all_children(old);
    g.add_children(new, children);
    true
}

fn reachable(g: &StringGraph, from: NodeId, target: NodeId) -> bool {
    let mut seen = HashSet::new();
    let mut work = vec![from];
    while let Some(node) = work.pop() {
        if node == target {
            return true;
        }
        if seen.insert(node) {
            work.extend(g.children(node).iter().copied());
        }
    }
    false
}
