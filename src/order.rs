//! The coinductive partial order over string graphs: denotation
//! containment, decided structurally.
//!
//! The relation is defined coinductively so that it stays well-founded on
//! cyclic graphs: every recursive step first registers the node pair it is
//! about to decide, and a pair that comes around again is assumed to hold.
//! This is the same memoized-pair discipline the widening engine relies on
//! for its convergence tests.

use std::collections::{BTreeSet, HashSet};

use crate::graph::StringGraph;
use crate::node::{Label, NodeId};

/// Containment between two whole graphs: `a <= b`.
pub fn leq(a: &StringGraph, b: &StringGraph) -> bool {
    check_partial_order(a, a.root(), b, b.root(), &mut HashSet::new())
}

/// Whether the denotation of `a`'s vertex `na` is contained in the
/// denotation of `b`'s vertex `nb`. The two vertices may live in the same
/// graph. `edges` carries the node pairs already assumed on the current
/// derivation.
pub(crate) fn check_partial_order(
    a: &StringGraph,
    na: NodeId,
    b: &StringGraph,
    nb: NodeId,
    edges: &mut HashSet<(NodeId, NodeId)>,
) -> bool {
    if edges.contains(&(na, nb)) {
        return true;
    }
    if b.label(nb) == Label::Max {
        return true;
    }
    let la = a.label(na);
    let lb = b.label(nb);
    if la == Label::Concat
        && lb == Label::Concat
        && !a.children(na).is_empty()
        && a.children(na).len() == b.children(nb).len()
    {
        edges.insert((na, nb));
        return a
            .children(na)
            .iter()
            .zip(b.children(nb))
            .all(|(&ca, &cb)| check_partial_order(a, ca, b, cb, edges));
    }
    if la == Label::Or {
        edges.insert((na, nb));
        return a
            .children(na)
            .iter()
            .all(|&ca| check_partial_order(a, ca, b, nb, edges));
    }
    if lb == Label::Or {
        let candidates = label_equality_set(b, &principal_nodes(b, nb), la);
        if candidates.is_empty() {
            return false;
        }
        edges.insert((na, nb));
        return candidates
            .iter()
            .any(|&s| check_partial_order(a, na, b, s, edges));
    }
    la == lb
}

/// Principal nodes of a vertex: the vertex itself plus, for an `Or`, every
/// node reachable by unfolding nested `Or` children. Cycle-guarded.
pub fn principal_nodes(g: &StringGraph, id: NodeId) -> BTreeSet<NodeId> {
    let mut nodes = BTreeSet::new();
    collect_principal(g, id, &mut nodes);
    nodes
}

fn collect_principal(g: &StringGraph, id: NodeId, nodes: &mut BTreeSet<NodeId>) {
    if !nodes.insert(id) {
        return;
    }
    if g.label(id) == Label::Or {
        for &child in g.children(id) {
            collect_principal(g, child, nodes);
        }
    }
}

/// Labels of the principal node set.
pub fn principal_labels(g: &StringGraph, id: NodeId) -> BTreeSet<Label> {
    principal_nodes(g, id).iter().map(|&n| g.label(n)).collect()
}

/// The subset of `nodes` carrying `label`.
fn label_equality_set(g: &StringGraph, nodes: &BTreeSet<NodeId>, label: Label) -> Vec<NodeId> {
    nodes.iter().copied().filter(|&n| g.label(n) == label).collect()
}
