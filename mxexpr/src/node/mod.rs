//! The polymorphic expression node and its mutation protocol.
//!
//! Role
//! - One concrete [`Node`] representation carries every kind of mathematical
//!   construct; the tag lives in a `Cell` because the evaluation engine may
//!   retag a node it is rewriting. Refined kinds (see [`kinds`]) are transient
//!   views that re-validate the tag on every access instead of trusting the
//!   kind a node was constructed as.
//! - Children are owned counted shares. Indexed access is 0-based at the API
//!   surface and 1-based internally, matching the engine's own addressing.
pub mod kinds;

use std::cell::{Cell, RefCell};

use either::Either;
use smallvec::SmallVec;
use strum::{Display, EnumIs};

use crate::error::{ExprError, ExprResult};
use crate::handle::{Ref, RefCounted};
use crate::item::ItemRef;
use crate::number::Number;

/// Kind tag of a node. The last five are reserved marker kinds: constructible,
/// rendered in diagnostics, but inert otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIs)]
pub enum NodeKind {
    Number,
    Multiplication,
    Addition,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseNot,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    LogicalNot,
    Comparison,
    Variable,
    Function,
    Unit,
    Power,
    Vector,
    Undefined,
    Datetime,
    Symbolic,
    Negate,
    Inverse,
    Division,
}

impl NodeKind {
    /// Kinds with a 0..N child sequence that may be appended to.
    pub fn is_sequence_like(self) -> bool {
        matches!(
            self,
            NodeKind::Multiplication
                | NodeKind::Addition
                | NodeKind::Vector
                | NodeKind::BitwiseAnd
                | NodeKind::BitwiseOr
                | NodeKind::BitwiseXor
                | NodeKind::BitwiseNot
                | NodeKind::LogicalAnd
                | NodeKind::LogicalOr
                | NodeKind::LogicalXor
                | NodeKind::LogicalNot
        )
    }
}

/// Comparison operator carried by Comparison nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ComparisonOp {
    Equals,
    NotEquals,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

/// Kind-specific payload. Variable/Function/Unit nodes hold a counted share on
/// an entity in the global tables, not ownership of the table entry.
#[derive(Clone, Default)]
pub enum Payload {
    #[default]
    None,
    Number(Number),
    Comparison(ComparisonOp),
    Item(ItemRef),
}

/// A unit of the expression tree.
pub struct Node {
    refs: Cell<usize>,
    kind: Cell<NodeKind>,
    payload: RefCell<Payload>,
    children: RefCell<SmallVec<NodeRef, 4>>,
}

/// Counted handle to a [`Node`].
pub type NodeRef = Ref<Node>;

unsafe impl RefCounted for Node {
    // A freshly constructed node already accounts for its first handle.
    const NEW_STARTS_OWNED: bool = true;

    fn refcount_cell(&self) -> &Cell<usize> {
        &self.refs
    }
}

impl Node {
    pub(crate) fn raw(kind: NodeKind, payload: Payload) -> Node {
        Node {
            refs: Cell::new(1),
            kind: Cell::new(kind),
            payload: RefCell::new(payload),
            children: RefCell::new(SmallVec::new()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind.get()
    }

    /// Rewrite the kind tag in place. Engine-side rewriting only; any refined
    /// view taken before this call is invalidated and will fail to re-validate.
    pub fn retag(&self, kind: NodeKind) {
        self.kind.set(kind);
    }

    pub fn number_value(&self) -> Option<Number> {
        match &*self.payload.borrow() {
            Payload::Number(n) => Some(n.clone()),
            _ => None,
        }
    }

    pub fn set_number(&self, value: Number) {
        *self.payload.borrow_mut() = Payload::Number(value);
    }

    pub fn comparison_op(&self) -> Option<ComparisonOp> {
        match &*self.payload.borrow() {
            Payload::Comparison(op) => Some(*op),
            _ => None,
        }
    }

    pub fn set_comparison_op(&self, op: ComparisonOp) {
        *self.payload.borrow_mut() = Payload::Comparison(op);
    }

    /// The named entity referenced by a Variable/Function/Unit node.
    pub fn item(&self) -> Option<ItemRef> {
        match &*self.payload.borrow() {
            Payload::Item(item) => Some(item.clone()),
            _ => None,
        }
    }

    pub(crate) fn set_item(&self, item: ItemRef) {
        *self.payload.borrow_mut() = Payload::Item(item);
    }

    // ---------------- Mutation protocol ----------------

    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    /// 1-based internal addressing, the engine's native convention.
    fn child_1(&self, index: usize) -> Option<NodeRef> {
        if index == 0 {
            return None;
        }
        self.children.borrow().get(index - 1).cloned()
    }

    /// 0-based indexed access; the returned handle is a fresh counted share.
    pub fn child(&self, index: usize) -> ExprResult<NodeRef> {
        self.child_1(index + 1).ok_or(ExprError::IndexOutOfBounds {
            index,
            len: self.child_count(),
        })
    }

    /// Append a child share. Legal only on sequence-like kinds; the handed-in
    /// handle becomes the child list's share.
    pub fn append(&self, child: NodeRef) -> ExprResult<()> {
        if !self.kind().is_sequence_like() {
            return Err(ExprError::NotAppendable(self.kind()));
        }
        self.push_child(child);
        Ok(())
    }

    /// Unchecked append used by constructors that own the shape invariant.
    pub(crate) fn push_child(&self, child: NodeRef) {
        self.children.borrow_mut().push(child);
    }

    /// 0-based deletion, releasing the child's ownership share.
    pub fn del_child(&self, index: usize) -> ExprResult<()> {
        self.del_child_1(index + 1)
            .map(drop)
            .ok_or(ExprError::IndexOutOfBounds {
                index,
                len: self.child_count(),
            })
    }

    fn del_child_1(&self, index: usize) -> Option<NodeRef> {
        let mut children = self.children.borrow_mut();
        if index == 0 || index > children.len() {
            return None;
        }
        Some(children.remove(index - 1))
    }

    /// Replace the child at `index`, dropping the previous share.
    pub fn set_child(&self, index: usize, child: NodeRef) -> ExprResult<()> {
        let mut children = self.children.borrow_mut();
        let len = children.len();
        match children.get_mut(index) {
            Some(slot) => {
                *slot = child;
                Ok(())
            }
            None => Err(ExprError::IndexOutOfBounds { index, len }),
        }
    }

    /// Extended indexed access: negative endpoints wrap modulo the child
    /// count, `step` may be negative for reverse iteration, and a range
    /// inverted relative to the step's direction yields an empty sequence.
    ///
    /// `stop` is exclusive; `stop == child_count()` is the valid full-range
    /// endpoint. A zero step and out-of-bounds endpoints (after wrapping) are
    /// errors, never clamped.
    pub fn slice(&self, start: isize, stop: isize, step: isize) -> ExprResult<Vec<NodeRef>> {
        if step == 0 {
            return Err(ExprError::ZeroStep);
        }
        let len = self.child_count();
        let start = wrap_index(start, len)?;
        let stop = wrap_index(stop, len)?;
        let reverse = stop < start;

        if reverse != (step < 0) {
            return Ok(Vec::new());
        }
        if start > len || stop > len || (reverse && start >= len) {
            return Err(ExprError::IndexOutOfBounds {
                index: start.max(stop),
                len,
            });
        }

        let indices = if reverse {
            Either::Left(((stop + 1)..=start).rev().step_by(step.unsigned_abs()))
        } else {
            Either::Right((start..stop).step_by(step.unsigned_abs()))
        };

        let children = self.children.borrow();
        Ok(indices.map(|i| children[i].clone()).collect())
    }

    /// Open-ended slice from `start` to the nearest end of the child list:
    /// toward the back for a positive step, down to and including child 0
    /// for a negative one. Covers the ranges an exclusive wrapped `stop`
    /// cannot express.
    pub fn slice_open(&self, start: isize, step: isize) -> ExprResult<Vec<NodeRef>> {
        if step == 0 {
            return Err(ExprError::ZeroStep);
        }
        let len = self.child_count();
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = wrap_index(start, len)?;
        if start >= len {
            return Err(ExprError::IndexOutOfBounds { index: start, len });
        }

        let indices = if step < 0 {
            Either::Left((0..=start).rev().step_by(step.unsigned_abs()))
        } else {
            Either::Right((start..len).step_by(step.unsigned_abs()))
        };

        let children = self.children.borrow();
        Ok(indices.map(|i| children[i].clone()).collect())
    }

    pub(crate) fn children_snapshot(&self) -> Vec<NodeRef> {
        self.children.borrow().iter().cloned().collect()
    }
}

// Negative indices wrap modulo the length, the engine binding's defined
// normalization (not Python clamping): -1 maps to len - 1, -len - 1 back to
// len - 1, while -len maps to len and is caught by the bounds check.
fn wrap_index(index: isize, len: usize) -> ExprResult<usize> {
    if index >= 0 {
        return Ok(index as usize);
    }
    if len == 0 {
        return Err(ExprError::IndexOutOfBounds { index: 0, len });
    }
    let m = index.unsigned_abs() % len;
    Ok(len - m)
}

impl PartialEq for Node {
    /// Structural equality: same kind, same payload (entities compare by
    /// identity), pairwise-equal children.
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.kind() != other.kind() {
            return false;
        }
        let payload_eq = match (&*self.payload.borrow(), &*other.payload.borrow()) {
            (Payload::None, Payload::None) => true,
            (Payload::Number(a), Payload::Number(b)) => a == b,
            (Payload::Comparison(a), Payload::Comparison(b)) => a == b,
            (Payload::Item(a), Payload::Item(b)) => a.ptr_eq(b),
            _ => false,
        };
        if !payload_eq {
            return false;
        }
        let a = self.children.borrow();
        let b = other.children.borrow();
        a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| **x == **y)
    }
}

impl std::fmt::Debug for Node {
    /// Kind-tagged diagnostic repr, recursive over children. Stable and
    /// idempotent; independent from the locale-aware printer.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let children = self.children.borrow();
        let write_list = |f: &mut std::fmt::Formatter<'_>| -> std::fmt::Result {
            write!(f, "([")?;
            for (i, child) in children.iter().enumerate() {
                if i != 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", **child)?;
            }
            write!(f, "])")
        };

        match self.kind() {
            NodeKind::Number => match self.number_value() {
                Some(n) => write!(f, "Number({n})"),
                None => write!(f, "Number(?)"),
            },
            kind @ (NodeKind::Multiplication
            | NodeKind::Addition
            | NodeKind::BitwiseAnd
            | NodeKind::BitwiseOr
            | NodeKind::BitwiseXor
            | NodeKind::BitwiseNot
            | NodeKind::LogicalAnd
            | NodeKind::LogicalOr
            | NodeKind::LogicalXor
            | NodeKind::LogicalNot
            | NodeKind::Vector) => {
                write!(f, "{kind}")?;
                write_list(f)
            }
            NodeKind::Comparison => {
                write!(f, "Comparison(left=")?;
                match children.first() {
                    Some(left) => write!(f, "{:?}", **left)?,
                    None => write!(f, "?")?,
                }
                match self.comparison_op() {
                    Some(op) => write!(f, ", op={op}")?,
                    None => write!(f, ", op=?")?,
                }
                write!(f, ", right=")?;
                match children.get(1) {
                    Some(right) => write!(f, "{:?}", **right)?,
                    None => write!(f, "?")?,
                }
                write!(f, ")")
            }
            NodeKind::Power => {
                write!(f, "Power(base=")?;
                match children.first() {
                    Some(base) => write!(f, "{:?}", **base)?,
                    None => write!(f, "?")?,
                }
                write!(f, ", exponent=")?;
                match children.get(1) {
                    Some(exp) => write!(f, "{:?}", **exp)?,
                    None => write!(f, "?")?,
                }
                write!(f, ")")
            }
            NodeKind::Variable => match self.item() {
                Some(item) => write!(f, "Variable(variable={})", item.name()),
                None => write!(f, "Variable(variable=?)"),
            },
            NodeKind::Function => {
                match self.item() {
                    Some(item) => write!(f, "Function(function={}", item.name())?,
                    None => write!(f, "Function(function=?")?,
                }
                write!(f, ", args=[")?;
                for (i, child) in children.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", **child)?;
                }
                write!(f, "])")
            }
            NodeKind::Unit => match self.item() {
                Some(item) => write!(f, "Unit(unit={})", item.name()),
                None => write!(f, "Unit(unit=?)"),
            },
            NodeKind::Undefined => write!(f, "Undefined()"),
            kind => write!(f, "<{kind}>"),
        }
    }
}
