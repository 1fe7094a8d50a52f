//! Tree-building arithmetic on node handles.
//!
//! Operators construct new trees and never mutate their operands. Subtraction
//! and division lower to the engine's canonical forms, which is why Negate,
//! Inverse and Division stay reserved kinds: `a - b` becomes
//! `Addition(a, Multiplication(-1, b))` and `a / b` becomes
//! `Multiplication(a, Power(b, -1))`. Host scalars promote to Number nodes
//! through `Into<NodeRef>`.
use std::ops::{Add, Div, Mul, Sub};

use crate::node::{ComparisonOp, Node, NodeRef};
use crate::number::Number;

impl From<Number> for NodeRef {
    fn from(value: Number) -> NodeRef {
        Node::number(value)
    }
}

impl From<i64> for NodeRef {
    fn from(value: i64) -> NodeRef {
        Node::number(value)
    }
}

impl From<i32> for NodeRef {
    fn from(value: i32) -> NodeRef {
        Node::number(value)
    }
}

impl From<f64> for NodeRef {
    fn from(value: f64) -> NodeRef {
        Node::number(value)
    }
}

impl From<Vec<NodeRef>> for NodeRef {
    fn from(children: Vec<NodeRef>) -> NodeRef {
        Node::vector(children)
    }
}

impl NodeRef {
    /// `self ^ exponent` as a new Power tree.
    pub fn pow(&self, exponent: impl Into<NodeRef>) -> NodeRef {
        Node::power(Some(self.clone()), Some(exponent.into()))
    }

    /// `-self` as the canonical `Multiplication(-1, self)` form.
    pub fn negated(&self) -> NodeRef {
        Node::multiplication([Node::number(-1), self.clone()])
    }

    pub fn compare(&self, op: ComparisonOp, other: impl Into<NodeRef>) -> NodeRef {
        Node::comparison(Some(self.clone()), op, Some(other.into()))
    }

    pub fn equals(&self, other: impl Into<NodeRef>) -> NodeRef {
        self.compare(ComparisonOp::Equals, other)
    }

    pub fn not_equals(&self, other: impl Into<NodeRef>) -> NodeRef {
        self.compare(ComparisonOp::NotEquals, other)
    }

    pub fn less_than(&self, other: impl Into<NodeRef>) -> NodeRef {
        self.compare(ComparisonOp::Less, other)
    }

    pub fn greater_than(&self, other: impl Into<NodeRef>) -> NodeRef {
        self.compare(ComparisonOp::Greater, other)
    }

    pub fn less_or_equal(&self, other: impl Into<NodeRef>) -> NodeRef {
        self.compare(ComparisonOp::LessOrEqual, other)
    }

    pub fn greater_or_equal(&self, other: impl Into<NodeRef>) -> NodeRef {
        self.compare(ComparisonOp::GreaterOrEqual, other)
    }
}

impl<R: Into<NodeRef>> Add<R> for NodeRef {
    type Output = NodeRef;

    fn add(self, rhs: R) -> NodeRef {
        Node::addition([self, rhs.into()])
    }
}

impl<R: Into<NodeRef>> Sub<R> for NodeRef {
    type Output = NodeRef;

    fn sub(self, rhs: R) -> NodeRef {
        let rhs = rhs.into();
        Node::addition([self, rhs.negated()])
    }
}

impl<R: Into<NodeRef>> Mul<R> for NodeRef {
    type Output = NodeRef;

    fn mul(self, rhs: R) -> NodeRef {
        Node::multiplication([self, rhs.into()])
    }
}

impl<R: Into<NodeRef>> Div<R> for NodeRef {
    type Output = NodeRef;

    fn div(self, rhs: R) -> NodeRef {
        let rhs = rhs.into();
        Node::multiplication([self, rhs.pow(-1)])
    }
}
