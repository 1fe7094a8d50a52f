//! The calculator context: symbol tables, loaders, diagnostics, precision.
//!
//! Role
//! - Owns the global variable/function/unit tables plus prefix, currency and
//!   dataset registries. Every engine operation goes through an explicit
//!   `&Calculator`; there is no process-wide instance, and separate instances
//!   are fully isolated.
//! - Lookups are alias-aware and return counted shares on the table entry, so
//!   repeated lookups of one name observe the same entity.
//! - Engine operations are serialized by an internal mutex; a reentrant call
//!   on the same calculator is an invariant violation and panics.
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use log::debug;
use parking_lot::Mutex;

use mxexpr::item::{Item, ItemRef};
use mxexpr::node::{Node, NodeRef};
use mxexpr::number::Number;

use crate::error::{CalcError, CalcResult};
use crate::message::{Message, MessageKind};

/// A decimal scaling prefix (`k` = 10^3 and friends).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub name: String,
    pub symbol: String,
    pub exponent10: i32,
}

#[derive(Debug, Clone, Copy, Default)]
struct LoadedTables {
    prefixes: bool,
    units: bool,
    currencies: bool,
    variables: bool,
    functions: bool,
    datasets: bool,
}

pub struct Calculator {
    variables: RefCell<Vec<ItemRef>>,
    functions: RefCell<Vec<ItemRef>>,
    units: RefCell<Vec<ItemRef>>,
    assumptions: RefCell<Option<ItemRef>>,
    prefixes: RefCell<Vec<Prefix>>,
    datasets: RefCell<Vec<String>>,
    messages: RefCell<VecDeque<Message>>,
    precision: Cell<usize>,
    loaded: Cell<LoadedTables>,
    pub(crate) engine: Mutex<()>,
}

impl Calculator {
    pub fn new() -> Calculator {
        Calculator {
            variables: RefCell::new(Vec::new()),
            functions: RefCell::new(Vec::new()),
            units: RefCell::new(Vec::new()),
            assumptions: RefCell::new(None),
            prefixes: RefCell::new(Vec::new()),
            datasets: RefCell::new(Vec::new()),
            messages: RefCell::new(VecDeque::new()),
            precision: Cell::new(10),
            loaded: Cell::new(LoadedTables::default()),
            engine: Mutex::new(()),
        }
    }

    // ---------------- Precision ----------------

    pub fn precision(&self) -> usize {
        self.precision.get()
    }

    pub fn set_precision(&self, precision: usize) {
        self.precision.set(precision);
    }

    // ---------------- Messages ----------------

    pub(crate) fn push_message(&self, kind: MessageKind, text: impl Into<String>) {
        self.messages.borrow_mut().push_back(Message::new(kind, text));
    }

    /// Pop the oldest pending diagnostic.
    pub fn next_message(&self) -> Option<Message> {
        self.messages.borrow_mut().pop_front()
    }

    /// Drain all pending diagnostics, oldest first.
    pub fn take_messages(&self) -> Vec<Message> {
        self.messages.borrow_mut().drain(..).collect()
    }

    // ---------------- Registration and lookup ----------------

    /// Insert an entity into the table of its kind, returning a share on it.
    /// An assumptions record replaces the calculator's current one instead of
    /// entering a name-lookup table.
    pub fn register(&self, item: Item) -> ItemRef {
        let handle = ItemRef::construct(item);
        let table = match handle.kind() {
            mxexpr::item::ItemKind::Variable => &self.variables,
            mxexpr::item::ItemKind::Function => &self.functions,
            mxexpr::item::ItemKind::Unit => &self.units,
            mxexpr::item::ItemKind::Assumptions => {
                *self.assumptions.borrow_mut() = Some(handle.clone());
                return handle;
            }
        };
        table.borrow_mut().push(handle.clone());
        handle
    }

    /// The calculator's current assumptions record, if one was registered.
    pub fn assumptions(&self) -> Option<ItemRef> {
        self.assumptions.borrow().clone()
    }

    fn lookup(table: &RefCell<Vec<ItemRef>>, name: &str) -> Option<ItemRef> {
        table.borrow().iter().find(|item| item.has_name(name)).cloned()
    }

    pub fn get_variable(&self, name: &str) -> Option<ItemRef> {
        Calculator::lookup(&self.variables, name)
    }

    pub fn get_function(&self, name: &str) -> Option<ItemRef> {
        Calculator::lookup(&self.functions, name)
    }

    pub fn get_unit(&self, name: &str) -> Option<ItemRef> {
        Calculator::lookup(&self.units, name)
    }

    /// Lookup across all entity tables: variables, then functions, then units.
    pub fn get_item(&self, name: &str) -> Option<ItemRef> {
        self.get_variable(name)
            .or_else(|| self.get_function(name))
            .or_else(|| self.get_unit(name))
    }

    pub fn get_prefix(&self, name: &str) -> Option<Prefix> {
        self.prefixes
            .borrow()
            .iter()
            .find(|p| p.name == name || p.symbol == name)
            .cloned()
    }

    pub fn dataset_names(&self) -> Vec<String> {
        self.datasets.borrow().clone()
    }

    // ---------------- Global definition loaders ----------------

    pub fn load_global_prefixes(&self) -> CalcResult<()> {
        let defs: &[(&str, &str, i32)] = &[
            ("yocto", "y", -24),
            ("zepto", "z", -21),
            ("atto", "a", -18),
            ("femto", "f", -15),
            ("pico", "p", -12),
            ("nano", "n", -9),
            ("micro", "u", -6),
            ("milli", "m", -3),
            ("centi", "c", -2),
            ("deci", "d", -1),
            ("deca", "da", 1),
            ("hecto", "h", 2),
            ("kilo", "k", 3),
            ("mega", "M", 6),
            ("giga", "G", 9),
            ("tera", "T", 12),
            ("peta", "P", 15),
            ("exa", "E", 18),
            ("zetta", "Z", 21),
            ("yotta", "Y", 24),
        ];
        let mut prefixes = self.prefixes.borrow_mut();
        prefixes.clear();
        prefixes.extend(defs.iter().map(|(name, symbol, exponent10)| Prefix {
            name: name.to_string(),
            symbol: symbol.to_string(),
            exponent10: *exponent10,
        }));
        self.mark_loaded(|l| l.prefixes = true);
        debug!("loaded {} global prefixes", prefixes.len());
        Ok(())
    }

    pub fn load_global_units(&self) -> CalcResult<()> {
        let defs: &[(&str, &[&str])] = &[
            ("meter", &["m", "metre"]),
            ("second", &["s"]),
            ("gram", &["g"]),
            ("ampere", &["A"]),
            ("kelvin", &["K"]),
            ("mole", &["mol"]),
            ("candela", &["cd"]),
            ("newton", &["N"]),
            ("joule", &["J"]),
            ("watt", &["W"]),
            ("hertz", &["Hz"]),
            ("liter", &["L", "litre"]),
            ("hour", &["h"]),
        ];
        for (name, aliases) in defs {
            if self.get_unit(name).is_none() {
                let unit = Item::unit(name);
                for alias in *aliases {
                    unit.add_name(alias);
                }
                self.register(unit);
            }
        }
        self.mark_loaded(|l| l.units = true);
        debug!("loaded global units");
        Ok(())
    }

    /// Currency definitions extend the unit table and require base units to
    /// be present first.
    pub fn load_global_currencies(&self) -> CalcResult<()> {
        if !self.loaded.get().units {
            return Err(CalcError::LoadFailed("currency"));
        }
        let defs: &[(&str, &[&str])] = &[
            ("euro", &["EUR"]),
            ("dollar", &["USD"]),
            ("pound", &["GBP"]),
            ("yen", &["JPY"]),
        ];
        for (name, aliases) in defs {
            if self.get_unit(name).is_none() {
                let unit = Item::unit(name);
                for alias in *aliases {
                    unit.add_name(alias);
                }
                self.register(unit);
            }
        }
        self.mark_loaded(|l| l.currencies = true);
        debug!("loaded global currencies");
        Ok(())
    }

    pub fn load_global_variables(&self) -> CalcResult<()> {
        if self.get_variable("pi").is_none() {
            let pi = Item::known_variable("pi", Node::number(std::f64::consts::PI));
            pi.add_name("π");
            self.register(pi);
        }
        if self.get_variable("e").is_none() {
            self.register(Item::known_variable(
                "e",
                Node::number(std::f64::consts::E),
            ));
        }
        if self.get_variable("i").is_none() {
            self.register(Item::known_variable(
                "i",
                Node::number(Number::complex(0.0, 1.0)),
            ));
        }
        self.mark_loaded(|l| l.variables = true);
        debug!("loaded global variables");
        Ok(())
    }

    pub fn load_global_functions(&self) -> CalcResult<()> {
        let defs: &[(&str, mxexpr::item::BuiltinFn)] = &[
            ("abs", builtins::abs),
            ("sqrt", builtins::sqrt),
            ("exp", builtins::exp),
            ("log", builtins::log),
            ("floor", builtins::floor),
            ("ceil", builtins::ceil),
            ("round", builtins::round),
            ("min", builtins::min),
            ("max", builtins::max),
        ];
        for (name, builtin) in defs {
            if self.get_function(name).is_none() {
                self.register(Item::function(name, *builtin));
            }
        }
        self.mark_loaded(|l| l.functions = true);
        debug!("loaded global functions");
        Ok(())
    }

    pub fn load_global_datasets(&self) -> CalcResult<()> {
        let mut datasets = self.datasets.borrow_mut();
        datasets.clear();
        datasets.extend(["elements", "planets"].map(String::from));
        self.mark_loaded(|l| l.datasets = true);
        debug!("loaded {} global datasets", datasets.len());
        Ok(())
    }

    fn mark_loaded(&self, update: impl FnOnce(&mut LoadedTables)) {
        let mut flags = self.loaded.get();
        update(&mut flags);
        self.loaded.set(flags);
    }

    /// Resolve the target unit of a conversion request by name.
    pub(crate) fn resolve_target_unit(&self, name: &str) -> CalcResult<ItemRef> {
        self.get_unit(name).ok_or_else(|| CalcError::NotFound {
            kind: "unit",
            name: name.to_string(),
        })
    }

    /// Table-backed identifier resolution used by the parser. Unknown names
    /// become fresh unknown variables so that repeated parses of one name
    /// observe the same entity.
    pub(crate) fn resolve_or_intern(&self, name: &str, intern_unknown: bool) -> Option<NodeRef> {
        if let Some(variable) = self.get_variable(name) {
            return Node::variable(variable).ok();
        }
        if let Some(unit) = self.get_unit(name) {
            return Node::unit(unit).ok();
        }
        if !intern_unknown {
            return None;
        }
        let item = self.register(Item::variable(name));
        Node::variable(item).ok()
    }
}

impl Default for Calculator {
    fn default() -> Calculator {
        Calculator::new()
    }
}

mod builtins {
    //! Numeric evaluators behind the global function table.
    use mxexpr::number::Number;

    fn unary_float(args: &[Number], f: impl Fn(f64) -> f64) -> Option<Number> {
        match args {
            [x] => Some(Number::from_f64(f(x.approx_f64()?))),
            _ => None,
        }
    }

    pub fn abs(args: &[Number]) -> Option<Number> {
        match args {
            [x] if x.is_negative() => Some(-x.clone()),
            [x] if !x.is_complex() => Some(x.clone()),
            _ => None,
        }
    }

    pub fn sqrt(args: &[Number]) -> Option<Number> {
        unary_float(args, f64::sqrt)
    }

    pub fn exp(args: &[Number]) -> Option<Number> {
        unary_float(args, f64::exp)
    }

    /// Natural log with one argument, arbitrary base with two.
    pub fn log(args: &[Number]) -> Option<Number> {
        match args {
            [_] => unary_float(args, f64::ln),
            [x, base] => Some(Number::from_f64(
                x.approx_f64()?.ln() / base.approx_f64()?.ln(),
            )),
            _ => None,
        }
    }

    pub fn floor(args: &[Number]) -> Option<Number> {
        unary_float(args, f64::floor)
    }

    pub fn ceil(args: &[Number]) -> Option<Number> {
        unary_float(args, f64::ceil)
    }

    pub fn round(args: &[Number]) -> Option<Number> {
        unary_float(args, f64::round)
    }

    fn extremum(args: &[Number], keep_right: impl Fn(std::cmp::Ordering) -> bool) -> Option<Number> {
        let mut best: Option<&Number> = None;
        for arg in args {
            best = match best {
                None => Some(arg),
                Some(current) => {
                    let ord = arg.partial_cmp(current)?;
                    if keep_right(ord) { Some(arg) } else { Some(current) }
                }
            };
        }
        best.cloned()
    }

    pub fn min(args: &[Number]) -> Option<Number> {
        extremum(args, |ord| ord.is_lt())
    }

    pub fn max(args: &[Number]) -> Option<Number> {
        extremum(args, |ord| ord.is_gt())
    }
}
