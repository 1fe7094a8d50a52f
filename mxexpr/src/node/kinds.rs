//! Refined-kind constructors and transient views.
//!
//! Construction enforces each kind's shape up front: fixed-arity kinds always
//! materialize their operand slots (defaulting to an owned `Number(0)`), item
//! kinds check the entity family, and the binary-minimum helper rejects
//! too-few operands before any mutation is visible.
//!
//! Views borrow the node and re-validate the kind tag when taken, never
//! caching it: after any call into the evaluation engine a previously taken
//! view must be re-acquired.
use crate::error::{ExprError, ExprResult};
use crate::handle::Ref;
use crate::item::{ItemKind, ItemRef};
use crate::node::{ComparisonOp, Node, NodeKind, NodeRef, Payload};
use crate::number::Number;

fn expect_item_kind(item: &ItemRef, expected: ItemKind) -> ExprResult<()> {
    if item.kind() == expected {
        Ok(())
    } else {
        Err(ExprError::ItemKindMismatch {
            expected,
            found: item.kind(),
        })
    }
}

impl Node {
    pub fn number(value: impl Into<Number>) -> NodeRef {
        Ref::construct(Node::raw(NodeKind::Number, Payload::Number(value.into())))
    }

    pub fn undefined() -> NodeRef {
        Ref::construct(Node::raw(NodeKind::Undefined, Payload::None))
    }

    /// Reserved marker kinds (Datetime, Symbolic, Negate, Inverse, Division):
    /// constructible, rendered in diagnostics, inert otherwise.
    pub fn marker(kind: NodeKind) -> NodeRef {
        Ref::construct(Node::raw(kind, Payload::None))
    }

    fn sequence(kind: NodeKind, children: impl IntoIterator<Item = NodeRef>) -> NodeRef {
        let node = Ref::construct(Node::raw(kind, Payload::None));
        for child in children {
            node.push_child(child);
        }
        node
    }

    pub fn addition(children: impl IntoIterator<Item = NodeRef>) -> NodeRef {
        Node::sequence(NodeKind::Addition, children)
    }

    pub fn multiplication(children: impl IntoIterator<Item = NodeRef>) -> NodeRef {
        Node::sequence(NodeKind::Multiplication, children)
    }

    pub fn vector(children: impl IntoIterator<Item = NodeRef>) -> NodeRef {
        Node::sequence(NodeKind::Vector, children)
    }

    /// Construct any sequence-like operator kind with 0..N children.
    pub fn operation(
        kind: NodeKind,
        children: impl IntoIterator<Item = NodeRef>,
    ) -> ExprResult<NodeRef> {
        if !kind.is_sequence_like() {
            return Err(ExprError::NotAppendable(kind));
        }
        Ok(Node::sequence(kind, children))
    }

    /// Construct a sequence-like operator kind that requires at least two
    /// initial operands.
    pub fn binary_operation(
        kind: NodeKind,
        children: impl IntoIterator<Item = NodeRef>,
    ) -> ExprResult<NodeRef> {
        let node = Node::operation(kind, children)?;
        let got = node.child_count();
        if got < 2 {
            return Err(ExprError::TooFewOperands { kind, min: 2, got });
        }
        Ok(node)
    }

    /// Power node: exactly two children, absent operands default to `0`.
    pub fn power(base: Option<NodeRef>, exponent: Option<NodeRef>) -> NodeRef {
        let node = Ref::construct(Node::raw(NodeKind::Power, Payload::None));
        node.push_child(base.unwrap_or_else(|| Node::number(0)));
        node.push_child(exponent.unwrap_or_else(|| Node::number(0)));
        node
    }

    /// Comparison node: exactly two children, absent operands default to `0`.
    pub fn comparison(left: Option<NodeRef>, op: ComparisonOp, right: Option<NodeRef>) -> NodeRef {
        let node = Ref::construct(Node::raw(NodeKind::Comparison, Payload::Comparison(op)));
        node.push_child(left.unwrap_or_else(|| Node::number(0)));
        node.push_child(right.unwrap_or_else(|| Node::number(0)));
        node
    }

    pub fn variable(item: ItemRef) -> ExprResult<NodeRef> {
        expect_item_kind(&item, ItemKind::Variable)?;
        Ok(Ref::construct(Node::raw(
            NodeKind::Variable,
            Payload::Item(item),
        )))
    }

    /// Function node: a callee entity plus 0..N argument children.
    pub fn function(
        callee: ItemRef,
        args: impl IntoIterator<Item = NodeRef>,
    ) -> ExprResult<NodeRef> {
        expect_item_kind(&callee, ItemKind::Function)?;
        let node = Ref::construct(Node::raw(NodeKind::Function, Payload::Item(callee)));
        for arg in args {
            node.push_child(arg);
        }
        Ok(node)
    }

    pub fn unit(item: ItemRef) -> ExprResult<NodeRef> {
        expect_item_kind(&item, ItemKind::Unit)?;
        Ok(Ref::construct(Node::raw(NodeKind::Unit, Payload::Item(item))))
    }

    fn view<'a, V>(&'a self, expected: NodeKind, make: fn(&'a Node) -> V) -> ExprResult<V> {
        if self.kind() == expected {
            Ok(make(self))
        } else {
            Err(ExprError::KindMismatch {
                expected,
                found: self.kind(),
            })
        }
    }

    pub fn as_number(&self) -> ExprResult<NumberView<'_>> {
        self.view(NodeKind::Number, NumberView)
    }

    pub fn as_power(&self) -> ExprResult<PowerView<'_>> {
        self.view(NodeKind::Power, PowerView)
    }

    pub fn as_comparison(&self) -> ExprResult<ComparisonView<'_>> {
        self.view(NodeKind::Comparison, ComparisonView)
    }

    pub fn as_variable(&self) -> ExprResult<VariableView<'_>> {
        self.view(NodeKind::Variable, VariableView)
    }

    pub fn as_function(&self) -> ExprResult<FunctionView<'_>> {
        self.view(NodeKind::Function, FunctionView)
    }

    pub fn as_unit(&self) -> ExprResult<UnitView<'_>> {
        self.view(NodeKind::Unit, UnitView)
    }

    pub fn as_vector(&self) -> ExprResult<VectorView<'_>> {
        self.view(NodeKind::Vector, VectorView)
    }
}

/// View over a Number node.
#[derive(Debug)]
pub struct NumberView<'a>(&'a Node);

impl NumberView<'_> {
    pub fn value(&self) -> Number {
        self.0.number_value().unwrap_or_else(Number::zero)
    }

    pub fn set_value(&self, value: Number) {
        self.0.set_number(value);
    }
}

/// View over a Power node (children: base, exponent).
pub struct PowerView<'a>(&'a Node);

impl PowerView<'_> {
    pub fn base(&self) -> NodeRef {
        self.0.child(0).expect("power node has two children")
    }

    pub fn exponent(&self) -> NodeRef {
        self.0.child(1).expect("power node has two children")
    }

    pub fn set_base(&self, base: NodeRef) {
        let _ = self.0.set_child(0, base);
    }

    pub fn set_exponent(&self, exponent: NodeRef) {
        let _ = self.0.set_child(1, exponent);
    }
}

/// View over a Comparison node (children: left, right).
pub struct ComparisonView<'a>(&'a Node);

impl ComparisonView<'_> {
    pub fn left(&self) -> NodeRef {
        self.0.child(0).expect("comparison node has two children")
    }

    pub fn right(&self) -> NodeRef {
        self.0.child(1).expect("comparison node has two children")
    }

    pub fn op(&self) -> ComparisonOp {
        self.0.comparison_op().expect("comparison node carries an op")
    }

    pub fn set_left(&self, left: NodeRef) {
        let _ = self.0.set_child(0, left);
    }

    pub fn set_right(&self, right: NodeRef) {
        let _ = self.0.set_child(1, right);
    }

    pub fn set_op(&self, op: ComparisonOp) {
        self.0.set_comparison_op(op);
    }
}

/// View over a Variable node.
pub struct VariableView<'a>(&'a Node);

impl VariableView<'_> {
    pub fn variable(&self) -> ItemRef {
        self.0.item().expect("variable node references an entity")
    }
}

/// View over a Function node.
pub struct FunctionView<'a>(&'a Node);

impl FunctionView<'_> {
    pub fn function(&self) -> ItemRef {
        self.0.item().expect("function node references an entity")
    }

    pub fn arg_count(&self) -> usize {
        self.0.child_count()
    }

    pub fn arg(&self, index: usize) -> ExprResult<NodeRef> {
        self.0.child(index)
    }
}

/// View over a Unit node.
pub struct UnitView<'a>(&'a Node);

impl UnitView<'_> {
    pub fn unit(&self) -> ItemRef {
        self.0.item().expect("unit node references an entity")
    }
}

/// View over a Vector node, including the matrix conveniences the engine
/// exposes on vectors of vectors.
pub struct VectorView<'a>(&'a Node);

impl VectorView<'_> {
    fn is_matrix(&self) -> bool {
        self.0.child_count() > 0
            && self
                .0
                .children_snapshot()
                .iter()
                .all(|c| c.kind() == NodeKind::Vector)
    }

    pub fn rows(&self) -> usize {
        if self.is_matrix() { self.0.child_count() } else { 1 }
    }

    pub fn columns(&self) -> usize {
        if self.is_matrix() {
            self.0.child(0).map(|row| row.child_count()).unwrap_or(0)
        } else {
            self.0.child_count()
        }
    }

    /// Element access by (row, column); a flat vector is a single row.
    pub fn element(&self, row: usize, column: usize) -> ExprResult<NodeRef> {
        if self.is_matrix() {
            self.0.child(row)?.child(column)
        } else if row == 0 {
            self.0.child(column)
        } else {
            Err(ExprError::IndexOutOfBounds {
                index: row,
                len: 1,
            })
        }
    }

    /// New Vector with nested vectors flattened depth-first.
    pub fn flatten(&self) -> NodeRef {
        let out = Node::vector([]);
        fn walk(node: &Node, out: &NodeRef) {
            for child in node.children_snapshot() {
                if child.kind() == NodeKind::Vector {
                    walk(&child, out);
                } else {
                    out.push_child(child);
                }
            }
        }
        walk(self.0, &out);
        out
    }

    /// New Vector with numeric children sorted; non-numeric children keep
    /// their relative order after the numbers.
    pub fn sort(&self, ascending: bool) -> NodeRef {
        let mut numeric: Vec<(Number, NodeRef)> = Vec::new();
        let mut rest: Vec<NodeRef> = Vec::new();
        for child in self.0.children_snapshot() {
            match child.number_value() {
                Some(value) => numeric.push((value, child)),
                None => rest.push(child),
            }
        }
        numeric.sort_by(|a, b| {
            let ord = a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal);
            if ascending { ord } else { ord.reverse() }
        });
        Node::vector(numeric.into_iter().map(|(_, node)| node).chain(rest))
    }

    /// New Vector with children in reverse order.
    pub fn flip(&self) -> NodeRef {
        let mut children = self.0.children_snapshot();
        children.reverse();
        Node::vector(children)
    }
}
