use thiserror::Error;

use crate::node::Label;

/// Precondition violations while building a graph by hand.
///
/// These are fatal construction errors reported to the caller, never
/// silently repaired. Note that an unsupported character in a literal or an
/// unrecognized operator is *not* an error: those degrade the result to
/// `Max`, trading precision for soundness.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum BuildError {
    #[error("SIMPLE node cannot have children")]
    SimpleWithChildren,
    #[error("OR and CONCAT nodes must have at least one child")]
    MissingChildren,
    #[error("{0} node cannot have children")]
    LeafWithChildren(Label),
    #[error("SIMPLE node must have a character")]
    MissingCharacter,
    #[error("only SIMPLE nodes can carry a character")]
    UnexpectedCharacter,
}
