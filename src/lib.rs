//! # stringgraph-rs: String Graphs in Rust
//!
//! **`stringgraph-rs`** implements the *string graph* abstract domain: a value domain for static
//! analysis that represents sets of possible run-time string values as a finite, possibly cyclic,
//! labeled graph.
//!
//! ## What is a string graph?
//!
//! A string graph is a rooted graph whose nodes are labeled `Simple` (one character), `Concat`,
//! `Or`, `Max` (any string) or `Empty` (no string). Concatenating or joining values grows the
//! graph; two rewriting passes (*compact* and *normalize*) keep it in a canonical minimal shape,
//! and a widening operator folds unbounded growth into back edges so that fixpoint analyses of
//! loops terminate.
//!
//! ## Key Features
//!
//! - **Arena-backed graphs**: every value owns a vector arena of nodes addressed by lightweight
//!   [`NodeId`][crate::node::NodeId] handles, so cyclic parent/child structure needs no reference
//!   counting.
//! - **Canonicalization**: the eight compact rules and four normalize rules from the string-graph
//!   literature, applied as cycle-safe post-order rewrites.
//! - **Coinductive ordering**: the partial-order check memoizes visited node pairs and stays
//!   well-defined on graphs with back edges.
//! - **Widening**: topological-clash detection plus the cycle-induction and replacement rules,
//!   driven to a fixpoint.
//!
//! ## Basic Usage
//!
//! ```rust
//! use stringgraph_rs::domain::{BinaryOperator, StringGraphDomain};
//!
//! // Abstract values for two string constants
//! let hello = StringGraphDomain::eval_constant("hello");
//! let world = StringGraphDomain::eval_constant("world");
//!
//! // Join: either of the two strings
//! let both = hello.lub(&world);
//! assert_eq!(both.to_string(), "OR[ CONCAT[ h e l l o] CONCAT[ w o r l d]]");
//!
//! // Concatenation evaluates to a single flat CONCAT
//! let joined = StringGraphDomain::eval_binary(BinaryOperator::Concat, &hello, &world);
//! assert_eq!(joined.to_string(), "CONCAT[ h e l l o w o r l d]");
//!
//! // The approximation order
//! assert!(hello.less_or_equal(&both));
//! ```
//!
//! ## Core Components
//!
//! - **[`graph`]**: the [`StringGraph`][crate::graph::StringGraph] value and its mutation API.
//! - **[`compact`] / [`normalize`]**: the canonicalization passes.
//! - **[`order`] / [`widening`]**: the partial order and the convergence-forcing widening.
//! - **[`domain`]**: the lattice and operator-evaluation surface consumed by an analyzer.
//! - **[`dot`]**: Graphviz export for visualizing graphs.

pub mod alphabet;
pub mod compact;
pub mod domain;
pub mod dot;
pub mod error;
pub mod graph;
pub mod node;
pub mod normalize;
pub mod order;
pub mod widening;
