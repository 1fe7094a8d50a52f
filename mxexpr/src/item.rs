//! Named entities referenced by Variable/Function/Unit nodes.
//!
//! Entities live in the calculator's global tables and are independently
//! refcounted; nodes hold counted shares, never table ownership. Unlike tree
//! nodes, a freshly constructed item owns no share yet (count 0), so
//! [`Ref::construct`] wraps instead of adopting.
use std::cell::{Cell, RefCell};

use strum::{Display, EnumIs};

use crate::handle::{Ref, RefCounted};
use crate::node::NodeRef;
use crate::number::Number;

/// Entity family tag, immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIs)]
pub enum ItemKind {
    Variable,
    Function,
    Unit,
    Assumptions,
}

/// Signature of a builtin function evaluator: numeric arguments in, numeric
/// result out, `None` when the arguments are outside its domain.
pub type BuiltinFn = fn(&[Number]) -> Option<Number>;

/// A named entity: variable, math function, unit, or assumptions record.
pub struct Item {
    refs: Cell<usize>,
    kind: ItemKind,
    names: RefCell<Vec<String>>,
    value: RefCell<Option<NodeRef>>,
    builtin: Option<BuiltinFn>,
}

pub type ItemRef = Ref<Item>;

unsafe impl RefCounted for Item {
    const NEW_STARTS_OWNED: bool = false;

    fn refcount_cell(&self) -> &Cell<usize> {
        &self.refs
    }
}

impl Item {
    fn new(kind: ItemKind, name: &str, builtin: Option<BuiltinFn>) -> Item {
        Item {
            refs: Cell::new(0),
            kind,
            names: RefCell::new(vec![name.to_string()]),
            value: RefCell::new(None),
            builtin,
        }
    }

    /// An unknown variable: no value, stays symbolic under evaluation.
    pub fn variable(name: &str) -> Item {
        Item::new(ItemKind::Variable, name, None)
    }

    /// A known variable carrying a value tree substituted during evaluation.
    pub fn known_variable(name: &str, value: NodeRef) -> Item {
        let item = Item::new(ItemKind::Variable, name, None);
        *item.value.borrow_mut() = Some(value);
        item
    }

    pub fn function(name: &str, builtin: BuiltinFn) -> Item {
        Item::new(ItemKind::Function, name, Some(builtin))
    }

    pub fn unit(name: &str) -> Item {
        Item::new(ItemKind::Unit, name, None)
    }

    pub fn assumptions() -> Item {
        Item::new(ItemKind::Assumptions, "assumptions", None)
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Primary name (the first registered one).
    pub fn name(&self) -> String {
        self.names.borrow()[0].clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.names.borrow().clone()
    }

    /// Register an additional name. Index 0 stays the primary name.
    pub fn add_name(&self, name: &str) {
        self.names.borrow_mut().push(name.to_string());
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.borrow().iter().any(|n| n == name)
    }

    pub fn value(&self) -> Option<NodeRef> {
        self.value.borrow().clone()
    }

    pub fn builtin(&self) -> Option<BuiltinFn> {
        self.builtin
    }
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind, self.name())
    }
}
