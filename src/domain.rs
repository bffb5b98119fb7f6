//! The domain adapter: the lattice surface and the operator-evaluation
//! surface an analyzer drives per program operation.
//!
//! The adapter recognizes string concatenation, substring extraction and
//! character containment; every other operator deliberately evaluates to
//! `Max` (imprecise but sound) and every other `satisfies` query answers
//! [`Satisfiability::Unknown`].

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use log::debug;

use crate::alphabet::Letter;
use crate::graph::StringGraph;
use crate::node::{Label, NodeId};
use crate::order::leq;
use crate::widening::{cycle_induction_rule, replacement_rule};

/// Three-valued answer to a `satisfies` query.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Satisfiability {
    /// The property holds in every concrete string the value denotes.
    Satisfied,
    /// The property holds in none of them.
    NotSatisfied,
    /// Anything in between.
    Unknown,
}

/// Unary string operators an analyzer may ask about. None is modeled.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UnaryOperator {
    Reverse,
    Trim,
}

/// Binary string operators. Only `Concat` is evaluated precisely, and only
/// `Contains` is answered by [`StringGraphDomain::satisfies_binary`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinaryOperator {
    Concat,
    Contains,
    EndsWith,
    Equals,
    IndexOf,
    StartsWith,
}

/// Ternary string operators. Only `Substring` is evaluated precisely.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TernaryOperator {
    Replace,
    Substring,
}

/// An abstract string value: one string graph, kept compact and normalized
/// at the operation boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringGraphDomain {
    graph: StringGraph,
}

impl StringGraphDomain {
    pub fn new(graph: StringGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &StringGraph {
        &self.graph
    }

    /// Top: any string.
    pub fn top() -> Self {
        Self::new(StringGraph::max())
    }

    /// Bottom: no string.
    pub fn bottom() -> Self {
        Self::new(StringGraph::empty())
    }

    pub fn is_top(&self) -> bool {
        self.graph.label(self.graph.root()) == Label::Max
    }

    pub fn is_bottom(&self) -> bool {
        self.graph.label(self.graph.root()) == Label::Empty
    }

    /// Abstract value of a string constant. Double quotes around the
    /// literal, if the frontend kept them, are stripped before building.
    pub fn eval_constant(literal: &str) -> Self {
        let literal = literal.replace('"', "");
        Self::new(StringGraph::from_literal(&literal))
    }

    /// No unary string operator is modeled: the result is top.
    pub fn eval_unary(operator: UnaryOperator, _arg: &Self) -> Self {
        debug!("eval_unary: {:?} is not modeled => MAX", operator);
        Self::top()
    }

    /// Evaluate a binary operator. Concatenation builds the concatenation
    /// graph and canonicalizes it; everything else is top.
    pub fn eval_binary(operator: BinaryOperator, left: &Self, right: &Self) -> Self {
        match operator {
            BinaryOperator::Concat => {
                let mut graph = StringGraph::concat(&left.graph, &right.graph);
                graph.compact();
                graph.normalize();
                Self::new(graph)
            }
            _ => {
                debug!("eval_binary: {:?} is not modeled => MAX", operator);
                Self::top()
            }
        }
    }

    /// Evaluate a ternary operator. Substring reads its bounds from the
    /// numeric placeholders of the middle and right operands; everything
    /// else (including missing bounds) is top.
    pub fn eval_ternary(operator: TernaryOperator, left: &Self, middle: &Self, right: &Self) -> Self {
        match operator {
            TernaryOperator::Substring => {
                let lo = middle.graph.bound(middle.graph.root());
                let hi = right.graph.bound(right.graph.root());
                match (lo, hi) {
                    (Some(lo), Some(hi)) => Self::new(left.graph.substring(lo, hi)),
                    _ => {
                        debug!("eval_ternary: substring without numeric bounds => MAX");
                        Self::top()
                    }
                }
            }
            _ => {
                debug!("eval_ternary: {:?} is not modeled => MAX", operator);
                Self::top()
            }
        }
    }

    /// Answer a three-valued binary query. Only `Contains` with a
    /// single-character right operand is modeled.
    pub fn satisfies_binary(operator: BinaryOperator, left: &Self, right: &Self) -> Satisfiability {
        match operator {
            BinaryOperator::Contains => {
                let g = &right.graph;
                match (g.label(g.root()), g.character(g.root())) {
                    (Label::Simple, Some(letter)) => left.contains(letter),
                    _ => Satisfiability::Unknown,
                }
            }
            _ => Satisfiability::Unknown,
        }
    }

    /// Three-valued character containment: `Satisfied` when the character
    /// is forced in every denotation without surviving only through an
    /// `Or` alternative, `NotSatisfied` when it cannot occur at all.
    pub fn contains(&self, letter: Letter) -> Satisfiability {
        let root = self.graph.root();
        if !self.contains_char_or_max(root, letter, &mut HashSet::new()) {
            Satisfiability::NotSatisfied
        } else if self.contains_char_without_or(root, letter, &mut HashSet::new()) {
            Satisfiability::Satisfied
        } else {
            Satisfiability::Unknown
        }
    }

    /// Whether the character, or a MAX node, is reachable at all.
    fn contains_char_or_max(&self, id: NodeId, letter: Letter, seen: &mut HashSet<NodeId>) -> bool {
        if !seen.insert(id) {
            return false;
        }
        match self.graph.label(id) {
            Label::Simple => self.graph.character(id) == Some(letter),
            Label::Max => true,
            _ => self
                .graph
                .children(id)
                .iter()
                .any(|&c| self.contains_char_or_max(c, letter, seen)),
        }
    }

    /// Whether the character is reachable without crossing an OR node.
    fn contains_char_without_or(&self, id: NodeId, letter: Letter, seen: &mut HashSet<NodeId>) -> bool {
        if !seen.insert(id) {
            return false;
        }
        match self.graph.label(id) {
            Label::Simple => self.graph.character(id) == Some(letter),
            Label::Max => true,
            Label::Empty | Label::Or => false,
            Label::Concat => self
                .graph
                .children(id)
                .iter()
                .any(|&c| self.contains_char_without_or(c, letter, seen)),
        }
    }

    /// Least upper bound: an OR over the two values, canonicalized.
    pub fn lub(&self, other: &Self) -> Self {
        let mut graph = StringGraph::or(&self.graph, &other.graph);
        graph.compact();
        graph.normalize();
        Self::new(graph)
    }

    /// Containment in the approximation order.
    pub fn less_or_equal(&self, other: &Self) -> bool {
        leq(&self.graph, &other.graph)
    }

    /// Widening: when `self` already subsumes `other` the result is `self`
    /// unchanged; otherwise cycle induction and replacement are applied to
    /// the join, re-joining after every applied rule, until neither rule
    /// fires. The iteration also ends on a rejoined state that was already
    /// seen, or after a fixed number of rounds; a rewrite can fold away
    /// structure of `other` it mistook for subsumed, so the result is
    /// joined with any argument it no longer covers before it is returned.
    pub fn widening(&self, other: &Self) -> Self {
        const MAX_REWRITE_ROUNDS: usize = 8;

        if self.less_or_equal(other) {
            return self.clone();
        }
        let mut current = self.lub(other);
        let mut seen = HashSet::new();
        seen.insert(current.graph.render());
        for _ in 0..MAX_REWRITE_ROUNDS {
            let applied = cycle_induction_rule(&self.graph, &mut current.graph)
                || replacement_rule(&self.graph, &mut current.graph);
            if !applied {
                break;
            }
            current = self.lub(&current);
            if !seen.insert(current.graph.render()) {
                debug!("widening: reached a stable shape");
                break;
            }
        }
        // the result must stay above both arguments
        if !self.less_or_equal(&current) {
            current = self.lub(&current);
        }
        if !other.less_or_equal(&current) {
            current = current.lub(other);
        }
        current
    }
}

impl Display for StringGraphDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.graph)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn letter(c: char) -> Letter {
        Letter::from_char(c).unwrap()
    }

    #[test]
    fn test_top_and_bottom() {
        assert!(StringGraphDomain::top().is_top());
        assert!(!StringGraphDomain::top().is_bottom());
        assert!(StringGraphDomain::bottom().is_bottom());
        assert!(!StringGraphDomain::bottom().is_top());
        assert_eq!(StringGraphDomain::top().to_string(), "MAX");
        assert_eq!(StringGraphDomain::bottom().to_string(), "EMPTY");
    }

    #[test]
    fn test_eval_constant() {
        assert_eq!(StringGraphDomain::eval_constant("hello").to_string(), "CONCAT[ h e l l o]");
        assert_eq!(StringGraphDomain::eval_constant("\"hello\"").to_string(), "CONCAT[ h e l l o]");
        assert_eq!(StringGraphDomain::eval_constant("").to_string(), "EMPTY");
        assert_eq!(StringGraphDomain::eval_constant("he|lo").to_string(), "MAX");
    }

    #[test]
    fn test_eval_concat() {
        let hello = StringGraphDomain::eval_constant("hello");
        let world = StringGraphDomain::eval_constant("world");
        let joined = StringGraphDomain::eval_binary(BinaryOperator::Concat, &hello, &world);

        assert_eq!(joined.to_string(), "CONCAT[ h e l l o w o r l d]");
        let g = joined.graph();
        let root = g.root();
        assert_eq!(g.children(root).len(), 10);
        for &child in g.children(root) {
            assert_eq!(g.parents(child), &[root]);
        }
        // operands are fresh copies, not shared
        assert_eq!(hello.to_string(), "CONCAT[ h e l l o]");
        assert_eq!(world.to_string(), "CONCAT[ w o r l d]");
    }

    #[test]
    fn test_unmodeled_operators_are_top() {
        let hello = StringGraphDomain::eval_constant("hello");
        let world = StringGraphDomain::eval_constant("world");
        for op in [
            BinaryOperator::Equals,
            BinaryOperator::EndsWith,
            BinaryOperator::IndexOf,
            BinaryOperator::StartsWith,
            BinaryOperator::Contains,
        ] {
            assert!(StringGraphDomain::eval_binary(op, &hello, &world).is_top());
        }
        assert!(StringGraphDomain::eval_unary(UnaryOperator::Reverse, &hello).is_top());
        assert!(StringGraphDomain::eval_unary(UnaryOperator::Trim, &hello).is_top());
    }

    #[test]
    fn test_eval_substring() {
        let value = StringGraphDomain::eval_constant("ternaryexpression");
        let lo = StringGraphDomain::eval_constant("7");
        let hi = StringGraphDomain::eval_constant("17");

        let result = StringGraphDomain::eval_ternary(TernaryOperator::Substring, &value, &lo, &hi);
        assert_eq!(result.to_string(), "CONCAT[ e x p r e s s i o n]");

        let bad_lo = StringGraphDomain::eval_constant("-1");
        let bad_hi = StringGraphDomain::eval_constant("200");
        let result = StringGraphDomain::eval_ternary(TernaryOperator::Substring, &value, &bad_lo, &bad_hi);
        assert!(result.is_top());

        // bounds that are not numeric placeholders
        let result = StringGraphDomain::eval_ternary(TernaryOperator::Substring, &value, &value, &hi);
        assert!(result.is_top());

        // substring over an OR is not a CONCAT of characters
        let alts = value.lub(&StringGraphDomain::eval_constant("other"));
        let result = StringGraphDomain::eval_ternary(TernaryOperator::Substring, &alts, &lo, &hi);
        assert!(result.is_top());

        let result = StringGraphDomain::eval_ternary(TernaryOperator::Replace, &value, &lo, &hi);
        assert!(result.is_top());
    }

    #[test]
    fn test_lub_keeps_both_alternatives() {
        let hello = StringGraphDomain::eval_constant("hello");
        let world = StringGraphDomain::eval_constant("world");
        let both = hello.lub(&world);

        let g = both.graph();
        let root = g.root();
        assert_eq!(g.label(root), Label::Or);
        assert_eq!(g.children(root).len(), 2);
        for &child in g.children(root) {
            assert_eq!(g.parents(child), &[root]);
        }
        assert_eq!(both.to_string(), "OR[ CONCAT[ h e l l o] CONCAT[ w o r l d]]");
        assert!(hello.less_or_equal(&both));
        assert!(world.less_or_equal(&both));
    }

    #[test]
    fn test_lub_with_bottom_and_top() {
        let hello = StringGraphDomain::eval_constant("hello");
        // EMPTY alternatives are compacted away, and the single remaining
        // alternative is absorbed
        let with_bottom = hello.lub(&StringGraphDomain::bottom());
        assert_eq!(with_bottom.to_string(), "CONCAT[ h e l l o]");
        // a MAX alternative absorbs the OR
        let with_top = hello.lub(&StringGraphDomain::top());
        assert!(with_top.is_top());
    }

    #[test]
    fn test_contains() {
        let hello = StringGraphDomain::eval_constant("hello");
        assert_eq!(hello.contains(letter('o')), Satisfiability::Satisfied);
        assert_eq!(hello.contains(letter('a')), Satisfiability::NotSatisfied);

        // reachable only through an OR alternative: unknown
        let wrapped = StringGraphDomain::new(
            StringGraph::new(Label::Or, vec![StringGraph::from_literal("hello")], None).unwrap(),
        );
        assert_eq!(wrapped.contains(letter('o')), Satisfiability::Unknown);
        assert_eq!(wrapped.contains(letter('a')), Satisfiability::NotSatisfied);

        assert_eq!(StringGraphDomain::top().contains(letter('q')), Satisfiability::Satisfied);
        assert_eq!(StringGraphDomain::bottom().contains(letter('q')), Satisfiability::NotSatisfied);
    }

    #[test]
    fn test_satisfies_binary() {
        let hello = StringGraphDomain::eval_constant("hello");
        let o = StringGraphDomain::eval_constant("o");
        let a = StringGraphDomain::eval_constant("a");

        assert_eq!(
            StringGraphDomain::satisfies_binary(BinaryOperator::Contains, &hello, &o),
            Satisfiability::Satisfied
        );
        assert_eq!(
            StringGraphDomain::satisfies_binary(BinaryOperator::Contains, &hello, &a),
            Satisfiability::NotSatisfied
        );
        // right operand that is not a single character
        assert_eq!(
            StringGraphDomain::satisfies_binary(BinaryOperator::Contains, &hello, &hello),
            Satisfiability::Unknown
        );
        // numeric placeholder has no character either
        let seven = StringGraphDomain::eval_constant("7");
        assert_eq!(
            StringGraphDomain::satisfies_binary(BinaryOperator::Contains, &hello, &seven),
            Satisfiability::Unknown
        );
        assert_eq!(
            StringGraphDomain::satisfies_binary(BinaryOperator::StartsWith, &hello, &o),
            Satisfiability::Unknown
        );
    }

    #[test]
    fn test_contains_terminates_on_cycles() {
        let mut g = StringGraph::leaf(Label::Or, None, None);
        let root = g.root();
        let concat = g.alloc(Label::Concat, None, None);
        let a = g.alloc(Label::Simple, Letter::from_char('a'), None);
        g.add_child(root, concat);
        g.add_child(concat, a);
        g.add_child(concat, root);
        let value = StringGraphDomain::new(g);

        assert_eq!(value.contains(letter('a')), Satisfiability::Unknown);
        assert_eq!(value.contains(letter('b')), Satisfiability::NotSatisfied);
    }

    #[test]
    fn test_widening_returns_self_when_already_above() {
        // the order compares shapes, so two five-letter words subsume
        // each other and widening keeps the old value
        let hello = StringGraphDomain::eval_constant("hello");
        let world = StringGraphDomain::eval_constant("world");
        assert!(hello.less_or_equal(&world));
        let widened = hello.widening(&world);
        assert_eq!(widened, hello);
        assert_eq!(widened.to_string(), "CONCAT[ h e l l o]");
    }

    #[test]
    fn test_widening_is_an_upper_bound() {
        let a = StringGraphDomain::eval_constant("a");
        let ab = StringGraphDomain::eval_constant("ab");
        assert!(!a.less_or_equal(&ab));

        let widened = a.widening(&ab);
        assert!(a.less_or_equal(&widened));
        assert!(ab.less_or_equal(&widened));
        assert_eq!(widened.to_string(), "OR[ a CONCAT[ a b]]");
    }

    #[test]
    fn test_widening_covers_the_new_value_after_cycle_induction() {
        // concatenating a two-alternative value with a letter makes the
        // join clash with the old value; cycle induction folds the growth
        // into a back edge, and the result must still cover both arguments
        let go = StringGraphDomain::eval_constant("a").lub(&StringGraphDomain::eval_constant("ab"));
        let b = StringGraphDomain::eval_constant("b");
        let gn = StringGraphDomain::eval_binary(BinaryOperator::Concat, &go, &b);
        assert_eq!(gn.to_string(), "CONCAT[ OR[ a CONCAT[ a b]] b]");
        assert!(!go.less_or_equal(&gn));

        let widened = go.widening(&gn);
        assert!(go.less_or_equal(&widened));
        assert!(gn.less_or_equal(&widened));
    }

    #[test]
    fn test_widening_terminates_when_rules_keep_firing() {
        // go's root has children and the join clashes, so cycle induction
        // fires; rejoining reproduces the same shape and the iteration
        // must stop instead of spinning
        let go = StringGraphDomain::eval_constant("ab");
        let gn = StringGraphDomain::eval_constant("a").lub(&StringGraphDomain::eval_constant("b"));
        assert!(!go.less_or_equal(&gn));

        let widened = go.widening(&gn);
        assert!(go.less_or_equal(&widened));
        assert!(gn.less_or_equal(&widened));
        assert_eq!(widened.to_string(), "OR[ CONCAT[ a b] a b]");
    }

    #[test]
    fn test_equality_and_hashing_are_structural() {
        use std::collections::HashMap;

        let first = StringGraphDomain::eval_constant("hello");
        let second = StringGraphDomain::eval_constant("hello");
        assert_eq!(first, second);

        let mut memo = HashMap::new();
        memo.insert(first, 1);
        assert_eq!(memo.get(&second), Some(&1));
    }
}
