//! mxexpr: the reference-counted expression-tree model of the mx engine.
//!
//! One concrete [`node::Node`] representation carries every mathematical
//! construct (numbers, n-ary operators, comparisons, variables, functions,
//! units, vectors); refined kinds are transient views that re-validate the
//! kind tag on access. Ownership flows exclusively through the intrusive
//! [`handle::Ref`] handle, whose adopt/wrap asymmetry between tree nodes and
//! named entities is a type-level property.
//!
//! Handles are thread-affine: counts are non-atomic and all operations on a
//! given tree must stay serialized with respect to each other.
//!
//! Example
//! ```
//! use mxexpr::prelude::*;
//!
//! let power = Node::power(Some(Node::number(2)), Some(Node::number(10)));
//! let view = power.as_power().unwrap();
//! assert_eq!(view.exponent().number_value().unwrap(), Number::from(10));
//! assert_eq!(format!("{power:?}"), "Power(base=Number(2), exponent=Number(10))");
//! ```

/// Typed error taxonomy for the model layer.
pub mod error;
/// Intrusive refcount and the ownership handle.
pub mod handle;
/// Named entities (variables, functions, units) living in global tables.
pub mod item;
/// The generic node, refined-kind constructors/views, mutation protocol.
pub mod node;
/// Opaque numeric value type and its host conversion contract.
pub mod number;
/// Tree-building operators with scalar promotion.
pub mod ops;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::error::{ExprError, ExprResult};
    pub use crate::handle::{Ref, RefCounted};
    pub use crate::item::{BuiltinFn, Item, ItemKind, ItemRef};
    pub use crate::node::kinds::{
        ComparisonView, FunctionView, NumberView, PowerView, UnitView, VariableView, VectorView,
    };
    pub use crate::node::{ComparisonOp, Node, NodeKind, NodeRef, Payload};
    pub use crate::number::Number;
}
