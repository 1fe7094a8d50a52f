//! Typed errors for the expression model.
//!
//! Everything recoverable at the language boundary is a variant here; refcount
//! corruption and reentrancy are invariant violations and panic instead (see
//! [`crate::handle`]).
use thiserror::Error;

use crate::node::NodeKind;

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("child index {index} out of bounds for a node with {len} children")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("slice step cannot be zero")]
    ZeroStep,

    #[error("{kind} node requires at least {min} children, got {got}")]
    TooFewOperands {
        kind: NodeKind,
        min: usize,
        got: usize,
    },

    #[error("cannot append children to a {0} node")]
    NotAppendable(NodeKind),

    #[error("expected a {expected} node, found {found}")]
    KindMismatch {
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("expected a {expected} item, found {found}")]
    ItemKindMismatch {
        expected: crate::item::ItemKind,
        found: crate::item::ItemKind,
    },

    #[error("number is not representable as {target}")]
    Unrepresentable { target: &'static str },
}

pub type ExprResult<T> = Result<T, ExprError>;
