//! The string graph value: an arena of labeled nodes plus a designated root.
//!
//! A [`StringGraph`] owns every node it can reach. Child and parent edges are
//! index lists kept symmetric by the mutation API; algorithms address nodes
//! through [`NodeId`] handles, so cycles (introduced by widening) need no
//! special ownership treatment. Composing two values copies both operands
//! into a fresh arena, which keeps sibling abstract values from aliasing
//! storage that a later rewrite would mutate.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Write};
use std::hash::{Hash, Hasher};

use log::debug;

use crate::alphabet::Letter;
use crate::error::BuildError;
use crate::node::{Label, Node, NodeId};

/// A set of possible string values, represented as a rooted, possibly
/// cyclic, labeled graph.
#[derive(Debug, Clone)]
pub struct StringGraph {
    nodes: Vec<Node>,
    root: NodeId,
}

impl StringGraph {
    /// Graph denoting any string (the top of the lattice).
    pub fn max() -> Self {
        Self::leaf(Label::Max, None, None)
    }

    /// Graph denoting no string (the bottom of the lattice).
    pub fn empty() -> Self {
        Self::leaf(Label::Empty, None, None)
    }

    /// Build a graph from a literal string.
    ///
    /// A literal that parses as an integer becomes a `Simple` placeholder
    /// carrying the value as its bound (consumed by the ternary substring
    /// evaluation); the empty string becomes `Empty`; a single supported
    /// character becomes `Simple`; anything longer becomes a flat `Concat`
    /// of `Simple` nodes. A literal containing any unsupported character
    /// degrades to `Max`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stringgraph_rs::graph::StringGraph;
    ///
    /// assert_eq!(StringGraph::from_literal("hello").to_string(), "CONCAT[ h e l l o]");
    /// assert_eq!(StringGraph::from_literal("").to_string(), "EMPTY");
    /// assert_eq!(StringGraph::from_literal("|").to_string(), "MAX");
    /// ```
    pub fn from_literal(literal: &str) -> Self {
        if let Ok(value) = literal.parse::<i32>() {
            return Self::leaf(Label::Simple, None, Some(value));
        }
        if literal.is_empty() {
            return Self::empty();
        }
        let letters = match literal.chars().map(Letter::from_char).collect::<Option<Vec<_>>>() {
            Some(letters) => letters,
            None => {
                debug!("from_literal: unsupported character in {:?} => MAX", literal);
                return Self::max();
            }
        };
        if let [letter] = letters[..] {
            return Self::leaf(Label::Simple, Some(letter), None);
        }
        let mut graph = Self::leaf(Label::Concat, None, None);
        let root = graph.root;
        for letter in letters {
            let child = graph.alloc(Label::Simple, Some(letter), None);
            graph.add_child(root, child);
        }
        graph
    }

    /// Build a graph by specifying the root label, its subtrees and (for a
    /// `Simple` root) the character. The construction invariants are
    /// validated and violations are reported, never repaired.
    pub fn new(
        label: Label,
        children: Vec<StringGraph>,
        character: Option<Letter>,
    ) -> Result<Self, BuildError> {
        match label {
            Label::Simple if !children.is_empty() => return Err(BuildError::SimpleWithChildren),
            Label::Concat | Label::Or if children.is_empty() => {
                return Err(BuildError::MissingChildren)
            }
            Label::Max | Label::Empty if !children.is_empty() => {
                return Err(BuildError::LeafWithChildren(label))
            }
            _ => {}
        }
        if label == Label::Simple && character.is_none() {
            return Err(BuildError::MissingCharacter);
        }
        if label != Label::Simple && character.is_some() {
            return Err(BuildError::UnexpectedCharacter);
        }
        let parts: Vec<&StringGraph> = children.iter().collect();
        Ok(Self::compose(label, character, &parts))
    }

    /// Concatenation of two graphs, without canonicalization.
    pub fn concat(left: &StringGraph, right: &StringGraph) -> Self {
        Self::compose(Label::Concat, None, &[left, right])
    }

    /// Disjunction of two graphs, without canonicalization.
    pub fn or(left: &StringGraph, right: &StringGraph) -> Self {
        Self::compose(Label::Or, None, &[left, right])
    }

    pub(crate) fn leaf(label: Label, character: Option<Letter>, bound: Option<i32>) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            root: NodeId::new(0),
        };
        graph.root = graph.alloc(label, character, bound);
        graph
    }

    fn compose(label: Label, character: Option<Letter>, parts: &[&StringGraph]) -> Self {
        let mut graph = Self::leaf(label, character, None);
        let root = graph.root;
        for part in parts {
            let mut memo = HashMap::new();
            let child = graph.import(part, part.root(), &mut memo);
            graph.add_child(root, child);
        }
        // A node whose immediate children are all Simple is normalized by
        // construction.
        let normalized = graph.children(root).iter().all(|&c| graph.label(c) == Label::Simple);
        graph.set_normalized(root, normalized);
        graph
    }

    pub(crate) fn alloc(
        &mut self,
        label: Label,
        character: Option<Letter>,
        bound: Option<i32>,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(label, character, bound));
        id
    }

    /// Root node of this graph.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn label(&self, id: NodeId) -> Label {
        self.nodes[id.index()].label
    }

    pub fn character(&self, id: NodeId) -> Option<Letter> {
        self.nodes[id.index()].character
    }

    pub fn bound(&self, id: NodeId) -> Option<i32> {
        self.nodes[id.index()].bound
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].parents
    }

    pub fn is_normalized(&self, id: NodeId) -> bool {
        self.nodes[id.index()].normalized
    }

    pub(crate) fn set_label(&mut self, id: NodeId, label: Label) {
        self.nodes[id.index()].label = label;
    }

    pub(crate) fn set_character(&mut self, id: NodeId, character: Option<Letter>) {
        self.nodes[id.index()].character = character;
    }

    pub(crate) fn set_bound(&mut self, id: NodeId, bound: Option<i32>) {
        self.nodes[id.index()].bound = bound;
    }

    pub(crate) fn set_normalized(&mut self, id: NodeId, normalized: bool) {
        self.nodes[id.index()].normalized = normalized;
    }

    /// Link `child` under `parent`, keeping the child and parent lists
    /// symmetric. Linking a non-`Simple` child invalidates the parent's
    /// normalized flag. Child lists are duplicate-free: re-adding an
    /// existing child only repairs the symmetric link.
    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if self.label(child) != Label::Simple && self.is_normalized(parent) {
            self.set_normalized(parent, false);
        }
        if !self.nodes[parent.index()].children.contains(&child) {
            self.nodes[parent.index()].children.push(child);
        }
        if !self.nodes[child.index()].parents.contains(&parent) {
            self.nodes[child.index()].parents.push(parent);
        }
    }

    pub(crate) fn add_children(&mut self, parent: NodeId, children: impl IntoIterator<Item = NodeId>) {
        for child in children {
            self.add_child(parent, child);
        }
    }

    /// Unlink `child` from `parent` on both sides.
    pub(crate) fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.retain(|&c| c != child);
        self.nodes[child.index()].parents.retain(|&p| p != parent);
    }

    /// Unlink every child of `id`, clearing the symmetric parent entries.
    pub(crate) fn remove_all_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.index()].children);
        for child in children {
            self.nodes[child.index()].parents.retain(|&p| p != id);
        }
    }

    /// Unlink `id` from every parent, clearing the symmetric child entries.
    pub(crate) fn remove_all_parents(&mut self, id: NodeId) {
        let parents = std::mem::take(&mut self.nodes[id.index()].parents);
        for parent in parents {
            self.nodes[parent.index()].children.retain(|&c| c != id);
        }
    }

    /// Deep-copy the subgraph of `src` rooted at `node` into this arena.
    /// The memo map makes sharing and cycles come out intact.
    pub(crate) fn import(
        &mut self,
        src: &StringGraph,
        node: NodeId,
        memo: &mut HashMap<NodeId, NodeId>,
    ) -> NodeId {
        if let Some(&copy) = memo.get(&node) {
            return copy;
        }
        let copy = self.alloc(src.label(node), src.character(node), src.bound(node));
        memo.insert(node, copy);
        for &child in src.children(node) {
            let child_copy = self.import(src, child, memo);
            self.add_child(copy, child_copy);
        }
        self.set_normalized(copy, src.is_normalized(node));
        copy
    }

    /// Collapse `child` into `parent`: the parent takes over the child's
    /// label, character, bound and children, and every *other* parent of
    /// the child is rewired onto `parent`. The child ends up fully
    /// detached.
    pub(crate) fn absorb_child(&mut self, parent: NodeId, child: NodeId) {
        self.set_label(parent, self.label(child));
        self.set_character(parent, self.character(child));
        self.set_bound(parent, self.bound(child));
        self.remove_child(parent, child);
        let grandchildren = self.children(child).to_vec();
        self.remove_all_children(child);
        self.add_children(parent, grandchildren);
        for other in self.parents(child).to_vec() {
            if other != parent {
                self.remove_child(other, child);
                self.add_child(other, parent);
            }
        }
        self.remove_all_parents(child);
    }

    /// Substring over `lo..hi`, in characters.
    ///
    /// The operation is only defined when this graph is a `Concat` whose
    /// first `hi` children are all character nodes and the bounds satisfy
    /// `0 <= lo < hi <= arity`; every other shape degrades to `Max`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stringgraph_rs::graph::StringGraph;
    ///
    /// let g = StringGraph::from_literal("ternaryexpression");
    /// assert_eq!(g.substring(7, 17).to_string(), "CONCAT[ e x p r e s s i o n]");
    /// assert_eq!(g.substring(-1, 200).to_string(), "MAX");
    /// ```
    pub fn substring(&self, lo: i32, hi: i32) -> StringGraph {
        let root = self.root;
        if self.label(root) != Label::Concat || lo < 0 || hi <= lo {
            return Self::max();
        }
        let (lo, hi) = (lo as usize, hi as usize);
        if self.children(root).len() < hi {
            return Self::max();
        }
        for &child in &self.children(root)[..hi] {
            if self.label(child) != Label::Simple || self.character(child).is_none() {
                return Self::max();
            }
        }
        let mut graph = Self::leaf(Label::Concat, None, None);
        let new_root = graph.root;
        for &child in &self.children(root)[lo..hi] {
            let copy = graph.alloc(Label::Simple, self.character(child), None);
            graph.add_child(new_root, copy);
        }
        graph
    }

    /// Cycle-safe textual form of the graph. A child that is already on
    /// the current rendering path is printed as `recursive@<LABEL>`
    /// instead of being unfolded.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut path = Vec::new();
        self.render_into(self.root, &mut path, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, path: &mut Vec<NodeId>, out: &mut String) {
        match self.label(id) {
            Label::Max => out.push_str("MAX"),
            Label::Empty => out.push_str("EMPTY"),
            Label::Simple => match self.character(id) {
                Some(letter) => out.push(letter.as_char()),
                // numeric placeholder
                None => {
                    let _ = write!(out, "{}", self.bound(id).unwrap_or(0));
                }
            },
            label @ (Label::Concat | Label::Or) => {
                out.push_str(if label == Label::Concat { "CONCAT[" } else { "OR[" });
                path.push(id);
                for &child in self.children(id) {
                    out.push(' ');
                    if path.contains(&child) {
                        let _ = write!(out, "recursive@{}", self.label(child));
                    } else {
                        self.render_into(child, path, out);
                    }
                }
                path.pop();
                out.push(']');
            }
        }
    }
}

impl Display for StringGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Structural equality over the canonical rendering. Node handles are
/// deliberately not part of the comparison: two graphs built independently
/// from the same literal are equal.
impl PartialEq for StringGraph {
    fn eq(&self, other: &Self) -> bool {
        self.render() == other.render()
    }
}

impl Eq for StringGraph {}

impl Hash for StringGraph {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.render().hash(state);
    }
}
