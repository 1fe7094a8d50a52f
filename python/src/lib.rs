//! Python system-bindings for the mx engine.
//!
//! Every `Node`/`Item` wrapper owns exactly one counted share on its entity;
//! Python garbage collection (the wrapper's `Drop`) is the sole decrement
//! trigger. Handles are thread-affine, so every class here is `unsendable`:
//! a finalizer running on a foreign thread can never touch a count.
//!
//! Scalars promote implicitly: Python ints (any magnitude, via the base-256
//! digest), floats, complex numbers, and sequences become Number and Vector
//! nodes at the boundary.
use pyo3::exceptions::{PyIndexError, PyKeyError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyComplex, PyFloat, PyInt, PyList, PySlice, PyTuple};

use mxcore::error::CalcError;
use mxcore::options::{EvaluationOptions, ParseOptions, PrintOptions};
use mxcore::print::DEFAULT_PRINT_OPTIONS;
use mxexpr::error::ExprError;
use mxexpr::item::ItemRef;
use mxexpr::node::{ComparisonOp, Node, NodeRef};
use mxexpr::number::Number;

// ---------------- Error mapping ----------------

fn expr_err(err: ExprError) -> PyErr {
    match err {
        ExprError::IndexOutOfBounds { .. } => PyIndexError::new_err(err.to_string()),
        ExprError::KindMismatch { .. }
        | ExprError::ItemKindMismatch { .. }
        | ExprError::NotAppendable(_) => PyTypeError::new_err(err.to_string()),
        ExprError::ZeroStep | ExprError::TooFewOperands { .. } | ExprError::Unrepresentable { .. } => {
            PyValueError::new_err(err.to_string())
        }
    }
}

fn calc_err(err: CalcError) -> PyErr {
    match err {
        CalcError::NotFound { .. } => PyKeyError::new_err(err.to_string()),
        CalcError::LoadFailed(_) | CalcError::Aborted { .. } => {
            PyRuntimeError::new_err(err.to_string())
        }
        CalcError::Expr(inner) => expr_err(inner),
    }
}

// ---------------- Host integer digest ----------------

fn pyint_to_number(obj: &Bound<'_, PyAny>) -> PyResult<Number> {
    if let Ok(small) = obj.extract::<i64>() {
        return Ok(Number::from(small));
    }
    // Wider than a machine word: go through the base-256 digest.
    let negative = obj.lt(0)?;
    let magnitude = obj.call_method0("__abs__")?;
    let bits: u64 = magnitude.call_method0("bit_length")?.extract()?;
    let nbytes = bits.div_ceil(8).max(1);
    let raw: Vec<u8> = magnitude.call_method1("to_bytes", (nbytes, "big"))?.extract()?;
    Ok(Number::from_bytes_be(negative, &raw))
}

fn number_to_pyint<'py>(py: Python<'py>, value: &Number) -> PyResult<Bound<'py, PyAny>> {
    if let Ok(small) = value.try_to_i64() {
        return Ok(small.into_pyobject(py)?.into_any());
    }
    let (negative, bytes) = value.to_bytes_be().map_err(expr_err)?;
    let int_type = py.import("builtins")?.getattr("int")?;
    let magnitude = int_type.call_method1("from_bytes", (PyBytes::new(py, &bytes), "big"))?;
    if negative { magnitude.neg() } else { Ok(magnitude) }
}

// ---------------- Implicit promotion ----------------

fn promote(obj: &Bound<'_, PyAny>) -> PyResult<NodeRef> {
    if let Ok(node) = obj.extract::<PyRef<PyNode>>() {
        return Ok(node.inner.clone());
    }
    if let Ok(number) = obj.extract::<PyRef<PyNumber>>() {
        return Ok(Node::number(number.inner.clone()));
    }
    if obj.downcast::<PyInt>().is_ok() {
        return Ok(Node::number(pyint_to_number(obj)?));
    }
    if let Ok(float) = obj.downcast::<PyFloat>() {
        return Ok(Node::number(float.value()));
    }
    if let Ok(complex) = obj.downcast::<PyComplex>() {
        return Ok(Node::number(Number::complex(complex.real(), complex.imag())));
    }
    if obj.downcast::<PyList>().is_ok() || obj.downcast::<PyTuple>().is_ok() {
        let mut children = Vec::new();
        for element in obj.try_iter()? {
            children.push(promote(&element?)?);
        }
        return Ok(Node::vector(children));
    }
    Err(PyTypeError::new_err(format!(
        "cannot convert {} to an expression node",
        obj.get_type().name()?
    )))
}

fn scalar_to_number(obj: &Bound<'_, PyAny>) -> PyResult<Number> {
    if let Ok(number) = obj.extract::<PyRef<PyNumber>>() {
        return Ok(number.inner.clone());
    }
    if obj.downcast::<PyInt>().is_ok() {
        return pyint_to_number(obj);
    }
    if let Ok(float) = obj.downcast::<PyFloat>() {
        return Ok(Number::from(float.value()));
    }
    if let Ok(complex) = obj.downcast::<PyComplex>() {
        return Ok(Number::complex(complex.real(), complex.imag()));
    }
    Err(PyTypeError::new_err(format!(
        "cannot convert {} to a number",
        obj.get_type().name()?
    )))
}

// Engine calls run with the GIL released. The wrapped references are not
// Send, which is sound here: the class is unsendable (thread-affine) and the
// calculator's engine mutex serializes access while detached.
struct AssertSend<T>(T);
unsafe impl<T> Send for AssertSend<T> {}

// ---------------- Number ----------------

/// Opaque numeric value, convertible from/to Python scalars.
#[pyclass(unsendable, name = "Number")]
pub struct PyNumber {
    inner: Number,
}

#[pymethods]
impl PyNumber {
    #[new]
    fn new(value: &Bound<'_, PyAny>) -> PyResult<PyNumber> {
        Ok(PyNumber {
            inner: scalar_to_number(value)?,
        })
    }

    fn __int__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        number_to_pyint(py, &self.inner)
    }

    fn __float__(&self) -> PyResult<f64> {
        self.inner.try_to_f64().map_err(expr_err)
    }

    fn __complex__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyComplex>> {
        let (re, im) = self.inner.try_to_complex().map_err(expr_err)?;
        Ok(PyComplex::from_doubles(py, re, im))
    }

    fn __eq__(&self, other: &Bound<'_, PyAny>) -> bool {
        scalar_to_number(other).is_ok_and(|value| value == self.inner)
    }

    fn __repr__(&self) -> String {
        format!("Number({})", self.inner)
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    #[getter]
    fn is_integer(&self) -> bool {
        self.inner.is_integer()
    }

    #[getter]
    fn is_float(&self) -> bool {
        self.inner.is_float()
    }

    #[getter]
    fn is_complex(&self) -> bool {
        self.inner.is_complex()
    }
}

// ---------------- Item ----------------

/// A named entity (variable, function, or unit) living in a calculator table.
#[pyclass(unsendable, name = "Item")]
pub struct PyItem {
    inner: ItemRef,
}

#[pymethods]
impl PyItem {
    #[getter]
    fn name(&self) -> String {
        self.inner.name()
    }

    #[getter]
    fn names(&self) -> Vec<String> {
        self.inner.names()
    }

    #[getter]
    fn kind(&self) -> String {
        self.inner.kind().to_string()
    }

    fn has_name(&self, name: &str) -> bool {
        self.inner.has_name(name)
    }

    fn __eq__(&self, other: &Bound<'_, PyAny>) -> bool {
        other
            .extract::<PyRef<PyItem>>()
            .is_ok_and(|other| other.inner.ptr_eq(&self.inner))
    }

    fn __repr__(&self) -> String {
        format!("{:?}", &*self.inner)
    }
}

// ---------------- Node ----------------

/// One node of an expression tree; kind-specific attributes re-validate the
/// runtime kind tag and raise TypeError when stale.
#[pyclass(unsendable, name = "Node")]
pub struct PyNode {
    inner: NodeRef,
}

impl PyNode {
    fn wrap(inner: NodeRef) -> PyNode {
        PyNode { inner }
    }

    fn normalize_index(&self, index: isize) -> isize {
        if index < 0 {
            index + self.inner.child_count() as isize
        } else {
            index
        }
    }
}

fn comparison_op_from_str(op: &str) -> PyResult<ComparisonOp> {
    match op {
        "Equals" | "=" => Ok(ComparisonOp::Equals),
        "NotEquals" | "!=" => Ok(ComparisonOp::NotEquals),
        "Less" | "<" => Ok(ComparisonOp::Less),
        "Greater" | ">" => Ok(ComparisonOp::Greater),
        "LessOrEqual" | "<=" => Ok(ComparisonOp::LessOrEqual),
        "GreaterOrEqual" | ">=" => Ok(ComparisonOp::GreaterOrEqual),
        other => Err(PyValueError::new_err(format!(
            "unknown comparison operator '{other}'"
        ))),
    }
}

#[pymethods]
impl PyNode {
    #[new]
    fn new(value: &Bound<'_, PyAny>) -> PyResult<PyNode> {
        Ok(PyNode::wrap(promote(value)?))
    }

    #[staticmethod]
    fn undefined() -> PyNode {
        PyNode::wrap(Node::undefined())
    }

    #[getter]
    fn kind(&self) -> String {
        self.inner.kind().to_string()
    }

    fn __repr__(&self) -> String {
        format!("{:?}", &*self.inner)
    }

    fn __str__(&self) -> String {
        mxcore::print_node(&self.inner, &DEFAULT_PRINT_OPTIONS)
    }

    fn __len__(&self) -> usize {
        self.inner.child_count()
    }

    fn __getitem__<'py>(
        &self,
        py: Python<'py>,
        index: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyAny>> {
        if let Ok(slice) = index.downcast::<PySlice>() {
            let len = self.inner.child_count() as isize;
            let step: isize = opt_isize(&slice.getattr("step")?)?.unwrap_or(1);
            let d_start = if step < 0 { len - 1 } else { 0 };
            let start = opt_isize(&slice.getattr("start")?)?.unwrap_or(d_start);
            // An absent stop runs to the end of the list in the step's
            // direction, which an exclusive wrapped stop cannot express.
            let nodes = match opt_isize(&slice.getattr("stop")?)? {
                Some(stop) => self.inner.slice(start, stop, step),
                None => self.inner.slice_open(start, step),
            }
            .map_err(expr_err)?;
            let wrapped: Vec<Py<PyNode>> = nodes
                .into_iter()
                .map(|node| Py::new(py, PyNode::wrap(node)))
                .collect::<PyResult<_>>()?;
            return Ok(PyList::new(py, wrapped)?.into_any());
        }
        let index = self.normalize_index(index.extract::<isize>()?);
        if index < 0 {
            return Err(PyIndexError::new_err("child index out of bounds"));
        }
        let child = self.inner.child(index as usize).map_err(expr_err)?;
        Ok(Py::new(py, PyNode::wrap(child))?.into_bound(py).into_any())
    }

    fn __setitem__(&self, index: isize, value: &Bound<'_, PyAny>) -> PyResult<()> {
        let index = self.normalize_index(index);
        if index < 0 {
            return Err(PyIndexError::new_err("child index out of bounds"));
        }
        self.inner
            .set_child(index as usize, promote(value)?)
            .map_err(expr_err)
    }

    fn __delitem__(&self, index: isize) -> PyResult<()> {
        let index = self.normalize_index(index);
        if index < 0 {
            return Err(PyIndexError::new_err("child index out of bounds"));
        }
        self.inner.del_child(index as usize).map_err(expr_err)
    }

    /// Append a child; legal only on sequence-like kinds.
    fn append(&self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.inner.append(promote(value)?).map_err(expr_err)
    }

    fn __eq__(&self, other: &Bound<'_, PyAny>) -> bool {
        promote(other).is_ok_and(|other| *other == *self.inner)
    }

    fn __add__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyNode> {
        Ok(PyNode::wrap(self.inner.clone() + promote(other)?))
    }

    fn __radd__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyNode> {
        Ok(PyNode::wrap(promote(other)? + self.inner.clone()))
    }

    fn __sub__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyNode> {
        Ok(PyNode::wrap(self.inner.clone() - promote(other)?))
    }

    fn __rsub__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyNode> {
        Ok(PyNode::wrap(promote(other)? - self.inner.clone()))
    }

    fn __mul__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyNode> {
        Ok(PyNode::wrap(self.inner.clone() * promote(other)?))
    }

    fn __rmul__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyNode> {
        Ok(PyNode::wrap(promote(other)? * self.inner.clone()))
    }

    fn __truediv__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyNode> {
        Ok(PyNode::wrap(self.inner.clone() / promote(other)?))
    }

    fn __rtruediv__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyNode> {
        Ok(PyNode::wrap(promote(other)? / self.inner.clone()))
    }

    fn __pow__(&self, other: &Bound<'_, PyAny>, _modulo: Option<&Bound<'_, PyAny>>) -> PyResult<PyNode> {
        Ok(PyNode::wrap(self.inner.pow(promote(other)?)))
    }

    fn __neg__(&self) -> PyNode {
        PyNode::wrap(self.inner.negated())
    }

    /// Build a Comparison node over this node and `other`.
    fn compare(&self, op: &str, other: &Bound<'_, PyAny>) -> PyResult<PyNode> {
        let op = comparison_op_from_str(op)?;
        Ok(PyNode::wrap(self.inner.compare(op, promote(other)?)))
    }

    // ---- Number nodes ----

    #[getter]
    fn value<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        let view = self.inner.as_number().map_err(expr_err)?;
        let value = view.value();
        if value.is_integer() {
            return number_to_pyint(py, &value);
        }
        if let Ok(float) = value.try_to_f64() {
            return Ok(float.into_pyobject(py)?.into_any());
        }
        let (re, im) = value.try_to_complex().map_err(expr_err)?;
        Ok(PyComplex::from_doubles(py, re, im).into_any())
    }

    #[setter]
    fn set_value(&self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        let view = self.inner.as_number().map_err(expr_err)?;
        view.set_value(scalar_to_number(value)?);
        Ok(())
    }

    // ---- Power nodes ----

    #[getter]
    fn base(&self) -> PyResult<PyNode> {
        let view = self.inner.as_power().map_err(expr_err)?;
        Ok(PyNode::wrap(view.base()))
    }

    #[setter]
    fn set_base(&self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        let view = self.inner.as_power().map_err(expr_err)?;
        view.set_base(promote(value)?);
        Ok(())
    }

    #[getter]
    fn exponent(&self) -> PyResult<PyNode> {
        let view = self.inner.as_power().map_err(expr_err)?;
        Ok(PyNode::wrap(view.exponent()))
    }

    #[setter]
    fn set_exponent(&self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        let view = self.inner.as_power().map_err(expr_err)?;
        view.set_exponent(promote(value)?);
        Ok(())
    }

    // ---- Comparison nodes ----

    #[getter]
    fn left(&self) -> PyResult<PyNode> {
        let view = self.inner.as_comparison().map_err(expr_err)?;
        Ok(PyNode::wrap(view.left()))
    }

    #[setter]
    fn set_left(&self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        let view = self.inner.as_comparison().map_err(expr_err)?;
        view.set_left(promote(value)?);
        Ok(())
    }

    #[getter]
    fn right(&self) -> PyResult<PyNode> {
        let view = self.inner.as_comparison().map_err(expr_err)?;
        Ok(PyNode::wrap(view.right()))
    }

    #[setter]
    fn set_right(&self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        let view = self.inner.as_comparison().map_err(expr_err)?;
        view.set_right(promote(value)?);
        Ok(())
    }

    #[getter]
    fn op(&self) -> PyResult<String> {
        let view = self.inner.as_comparison().map_err(expr_err)?;
        Ok(view.op().to_string())
    }

    #[setter]
    fn set_op(&self, op: &str) -> PyResult<()> {
        let view = self.inner.as_comparison().map_err(expr_err)?;
        view.set_op(comparison_op_from_str(op)?);
        Ok(())
    }

    // ---- Entity nodes ----

    #[getter]
    fn item(&self) -> PyResult<PyItem> {
        match self.inner.item() {
            Some(item) => Ok(PyItem { inner: item }),
            None => Err(PyTypeError::new_err(format!(
                "{} node references no entity",
                self.inner.kind()
            ))),
        }
    }

    // ---- Vector nodes ----

    #[getter]
    fn rows(&self) -> PyResult<usize> {
        Ok(self.inner.as_vector().map_err(expr_err)?.rows())
    }

    #[getter]
    fn columns(&self) -> PyResult<usize> {
        Ok(self.inner.as_vector().map_err(expr_err)?.columns())
    }

    fn element(&self, row: usize, column: usize) -> PyResult<PyNode> {
        let view = self.inner.as_vector().map_err(expr_err)?;
        Ok(PyNode::wrap(view.element(row, column).map_err(expr_err)?))
    }

    fn flatten(&self) -> PyResult<PyNode> {
        Ok(PyNode::wrap(self.inner.as_vector().map_err(expr_err)?.flatten()))
    }

    #[pyo3(signature = (ascending=true))]
    fn sort(&self, ascending: bool) -> PyResult<PyNode> {
        Ok(PyNode::wrap(
            self.inner.as_vector().map_err(expr_err)?.sort(ascending),
        ))
    }

    fn flip(&self) -> PyResult<PyNode> {
        Ok(PyNode::wrap(self.inner.as_vector().map_err(expr_err)?.flip()))
    }

    /// Current reference count, exposed for diagnostics.
    #[getter]
    fn refcount(&self) -> usize {
        self.inner.refcount()
    }
}

fn opt_isize(obj: &Bound<'_, PyAny>) -> PyResult<Option<isize>> {
    if obj.is_none() {
        Ok(None)
    } else {
        Ok(Some(obj.extract()?))
    }
}

// ---------------- Message ----------------

/// One queued diagnostic from parsing or evaluation.
#[pyclass(unsendable, name = "Message")]
pub struct PyMessage {
    inner: mxcore::Message,
}

#[pymethods]
impl PyMessage {
    #[getter]
    fn kind(&self) -> String {
        self.inner.kind().to_string()
    }

    #[getter]
    fn text(&self) -> String {
        self.inner.text().to_string()
    }

    fn __repr__(&self) -> String {
        format!("Message({})", self.inner)
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

// ---------------- Options ----------------

#[pyclass(unsendable, name = "ParseOptions")]
#[derive(Clone)]
pub struct PyParseOptions {
    #[pyo3(get, set)]
    pub unknowns_as_variables: bool,
    #[pyo3(get, set)]
    pub implicit_multiplication: bool,
}

#[pymethods]
impl PyParseOptions {
    #[new]
    #[pyo3(signature = (unknowns_as_variables=true, implicit_multiplication=true))]
    fn new(unknowns_as_variables: bool, implicit_multiplication: bool) -> PyParseOptions {
        PyParseOptions {
            unknowns_as_variables,
            implicit_multiplication,
        }
    }
}

impl PyParseOptions {
    fn to_core(&self) -> ParseOptions {
        ParseOptions {
            unknowns_as_variables: self.unknowns_as_variables,
            implicit_multiplication: self.implicit_multiplication,
        }
    }
}

#[pyclass(unsendable, name = "EvaluationOptions")]
#[derive(Clone)]
pub struct PyEvaluationOptions {
    #[pyo3(get, set)]
    pub max_steps: Option<u64>,
}

#[pymethods]
impl PyEvaluationOptions {
    #[new]
    #[pyo3(signature = (max_steps=None))]
    fn new(max_steps: Option<u64>) -> PyEvaluationOptions {
        PyEvaluationOptions { max_steps }
    }
}

impl PyEvaluationOptions {
    fn to_core(&self) -> EvaluationOptions {
        EvaluationOptions {
            max_steps: self.max_steps,
        }
    }
}

#[pyclass(unsendable, name = "PrintOptions")]
#[derive(Clone)]
pub struct PyPrintOptions {
    #[pyo3(get, set)]
    pub multiplication_sign: String,
    #[pyo3(get, set)]
    pub precision: Option<usize>,
}

#[pymethods]
impl PyPrintOptions {
    #[new]
    #[pyo3(signature = (multiplication_sign=" * ".to_string(), precision=None))]
    fn new(multiplication_sign: String, precision: Option<usize>) -> PyPrintOptions {
        PyPrintOptions {
            multiplication_sign,
            precision,
        }
    }
}

impl PyPrintOptions {
    fn to_core(&self) -> PrintOptions {
        PrintOptions {
            multiplication_sign: self.multiplication_sign.clone(),
            precision: self.precision,
        }
    }
}

// ---------------- Calculator ----------------

/// An isolated calculator context: symbol tables, messages, precision.
#[pyclass(unsendable, name = "Calculator")]
pub struct PyCalculator {
    inner: mxcore::Calculator,
}

#[pymethods]
impl PyCalculator {
    #[new]
    fn new() -> PyCalculator {
        PyCalculator {
            inner: mxcore::Calculator::new(),
        }
    }

    fn load_global_prefixes(&self) -> PyResult<()> {
        self.inner.load_global_prefixes().map_err(calc_err)
    }

    fn load_global_units(&self) -> PyResult<()> {
        self.inner.load_global_units().map_err(calc_err)
    }

    fn load_global_currencies(&self) -> PyResult<()> {
        self.inner.load_global_currencies().map_err(calc_err)
    }

    fn load_global_variables(&self) -> PyResult<()> {
        self.inner.load_global_variables().map_err(calc_err)
    }

    fn load_global_functions(&self) -> PyResult<()> {
        self.inner.load_global_functions().map_err(calc_err)
    }

    fn load_global_datasets(&self) -> PyResult<()> {
        self.inner.load_global_datasets().map_err(calc_err)
    }

    fn get_variable(&self, name: &str) -> PyResult<PyItem> {
        self.inner
            .get_variable(name)
            .map(|inner| PyItem { inner })
            .ok_or_else(|| PyKeyError::new_err(format!("no variable named '{name}'")))
    }

    fn get_function(&self, name: &str) -> PyResult<PyItem> {
        self.inner
            .get_function(name)
            .map(|inner| PyItem { inner })
            .ok_or_else(|| PyKeyError::new_err(format!("no function named '{name}'")))
    }

    fn get_unit(&self, name: &str) -> PyResult<PyItem> {
        self.inner
            .get_unit(name)
            .map(|inner| PyItem { inner })
            .ok_or_else(|| PyKeyError::new_err(format!("no unit named '{name}'")))
    }

    fn get_item(&self, name: &str) -> PyResult<PyItem> {
        self.inner
            .get_item(name)
            .map(|inner| PyItem { inner })
            .ok_or_else(|| PyKeyError::new_err(format!("no item named '{name}'")))
    }

    #[getter]
    fn precision(&self) -> usize {
        self.inner.precision()
    }

    #[setter]
    fn set_precision(&self, precision: usize) {
        self.inner.set_precision(precision);
    }

    fn take_messages(&self) -> Vec<PyMessage> {
        self.inner
            .take_messages()
            .into_iter()
            .map(|inner| PyMessage { inner })
            .collect()
    }

    fn next_message(&self) -> Option<PyMessage> {
        self.inner.next_message().map(|inner| PyMessage { inner })
    }

    #[pyo3(signature = (text, options=None))]
    fn parse(&self, text: &str, options: Option<PyRef<'_, PyParseOptions>>) -> PyNode {
        let options = options.map(|o| o.to_core()).unwrap_or_default();
        PyNode::wrap(self.inner.parse(text, &options))
    }

    #[pyo3(signature = (node, options=None, to=None))]
    fn calculate(
        &self,
        py: Python<'_>,
        node: PyRef<'_, PyNode>,
        options: Option<PyRef<'_, PyEvaluationOptions>>,
        to: Option<String>,
    ) -> PyResult<PyNode> {
        let options = options.map(|o| o.to_core()).unwrap_or_default();
        let input = node.inner.clone();
        drop(node);
        let calc = AssertSend(&self.inner);
        let input = AssertSend(input);
        let result = py.detach(move || {
            // Capture the whole wrappers; edition-2024 precise capture would
            // otherwise grab the non-Send fields directly.
            let (calc, input) = (calc, input);
            AssertSend(calc.0.calculate(&input.0, &options, to.as_deref()))
        });
        Ok(PyNode::wrap(result.0.map_err(calc_err)?))
    }

    #[pyo3(signature = (node, options=None))]
    fn print(&self, node: PyRef<'_, PyNode>, options: Option<PyRef<'_, PyPrintOptions>>) -> String {
        let options = options.map(|o| o.to_core()).unwrap_or_default();
        self.inner.print(&node.inner, &options)
    }

    #[pyo3(signature = (text, options=None, print_options=None, limit=-1))]
    fn calculate_and_print(
        &self,
        py: Python<'_>,
        text: &str,
        options: Option<PyRef<'_, PyEvaluationOptions>>,
        print_options: Option<PyRef<'_, PyPrintOptions>>,
        limit: i64,
    ) -> PyResult<String> {
        let options = options.map(|o| o.to_core()).unwrap_or_default();
        let print_options = print_options.map(|o| o.to_core()).unwrap_or_default();
        let calc = AssertSend(&self.inner);
        let text = text.to_string();
        let result = py.detach(move || {
            // Capture the whole wrapper (see `calculate` above).
            let calc = calc;
            AssertSend(calc.0.calculate_and_print(&text, &options, &print_options, limit))
        });
        result.0.map_err(calc_err)
    }
}

#[pymodule]
#[pyo3(name = "_sys")]
#[pyo3(submodule)]
fn mxpy_sys(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCalculator>()?;
    m.add_class::<PyNode>()?;
    m.add_class::<PyItem>()?;
    m.add_class::<PyNumber>()?;
    m.add_class::<PyMessage>()?;
    m.add_class::<PyParseOptions>()?;
    m.add_class::<PyEvaluationOptions>()?;
    m.add_class::<PyPrintOptions>()?;
    Ok(())
}
