//! Locale-aware infix printer.
//!
//! Role
//! - Renders expression trees back to calculator syntax, recognizing the
//!   parser's canonical lowered forms: `Multiplication(a, Power(b, -1))`
//!   prints as `a / b` and `Addition(a, Multiplication(-1, b))` as `a - b`.
//! - Pure and non-blocking; precision only affects float formatting.
use once_cell::sync::Lazy;

use mxexpr::node::{ComparisonOp, NodeKind, NodeRef};
use mxexpr::number::Number;

use crate::calculator::Calculator;
use crate::options::PrintOptions;

/// Options used when no explicit record is supplied (node `__str__` at the
/// binding layer).
pub static DEFAULT_PRINT_OPTIONS: Lazy<PrintOptions> = Lazy::new(PrintOptions::default);

// Binding strength, loosest to tightest.
const PREC_COMPARISON: u8 = 0;
const PREC_BITWISE: u8 = 1;
const PREC_SUM: u8 = 2;
const PREC_PRODUCT: u8 = 3;
const PREC_UNARY: u8 = 4;
const PREC_POWER: u8 = 5;
const PREC_ATOM: u8 = 6;

/// Render `node` as infix calculator syntax.
pub fn print_node(node: &NodeRef, options: &PrintOptions) -> String {
    render(node, options, PREC_COMPARISON)
}

impl Calculator {
    /// [`print_node`] with the calculator's precision as the default.
    pub fn print(&self, node: &NodeRef, options: &PrintOptions) -> String {
        let mut options = options.clone();
        if options.precision.is_none() {
            options.precision = Some(self.precision());
        }
        print_node(node, &options)
    }
}

fn render(node: &NodeRef, options: &PrintOptions, parent_prec: u8) -> String {
    let (text, prec) = render_free(node, options);
    if prec < parent_prec {
        format!("({text})")
    } else {
        text
    }
}

fn render_free(node: &NodeRef, options: &PrintOptions) -> (String, u8) {
    match node.kind() {
        NodeKind::Number => {
            let value = node.number_value().unwrap_or_else(Number::zero);
            let prec = if value.is_negative() { PREC_UNARY } else { PREC_ATOM };
            (format_number(&value, options), prec)
        }
        NodeKind::Multiplication => {
            if let Some((num, den)) = as_division(node) {
                let text = format!(
                    "{} / {}",
                    render(&num, options, PREC_PRODUCT),
                    render(&den, options, PREC_UNARY),
                );
                return (text, PREC_PRODUCT);
            }
            if let Some(inner) = as_negation(node) {
                let text = format!("-{}", render(&inner, options, PREC_UNARY));
                return (text, PREC_UNARY);
            }
            (
                join_children(node, options, &options.multiplication_sign, PREC_PRODUCT),
                PREC_PRODUCT,
            )
        }
        NodeKind::Addition => {
            let mut out = String::new();
            for index in 0..node.child_count() {
                let child = match node.child(index) {
                    Ok(child) => child,
                    Err(_) => break,
                };
                if index == 0 {
                    out.push_str(&render(&child, options, PREC_SUM));
                    continue;
                }
                match as_negation(&child) {
                    Some(inner) => {
                        out.push_str(" - ");
                        out.push_str(&render(&inner, options, PREC_PRODUCT));
                    }
                    None => {
                        out.push_str(" + ");
                        out.push_str(&render(&child, options, PREC_SUM));
                    }
                }
            }
            (out, PREC_SUM)
        }
        NodeKind::Power => {
            let base = node.child(0).ok();
            let exponent = node.child(1).ok();
            let text = match (base, exponent) {
                (Some(base), Some(exponent)) => format!(
                    "{}^{}",
                    render(&base, options, PREC_ATOM),
                    render(&exponent, options, PREC_UNARY),
                ),
                _ => "undefined".to_string(),
            };
            (text, PREC_POWER)
        }
        kind @ (NodeKind::BitwiseAnd | NodeKind::BitwiseOr | NodeKind::BitwiseXor) => {
            let sep = match kind {
                NodeKind::BitwiseAnd => " and ",
                NodeKind::BitwiseOr => " or ",
                _ => " xor ",
            };
            (join_children(node, options, sep, PREC_BITWISE), PREC_BITWISE)
        }
        NodeKind::BitwiseNot | NodeKind::LogicalNot => {
            let text = match node.child(0) {
                Ok(inner) => format!("not {}", render(&inner, options, PREC_UNARY)),
                Err(_) => "undefined".to_string(),
            };
            (text, PREC_UNARY)
        }
        kind @ (NodeKind::LogicalAnd | NodeKind::LogicalOr | NodeKind::LogicalXor) => {
            let sep = match kind {
                NodeKind::LogicalAnd => " and ",
                NodeKind::LogicalOr => " or ",
                _ => " xor ",
            };
            (join_children(node, options, sep, PREC_BITWISE), PREC_BITWISE)
        }
        NodeKind::Comparison => {
            let symbol = match node.comparison_op() {
                Some(ComparisonOp::Equals) => "=",
                Some(ComparisonOp::NotEquals) => "!=",
                Some(ComparisonOp::Less) => "<",
                Some(ComparisonOp::Greater) => ">",
                Some(ComparisonOp::LessOrEqual) => "<=",
                Some(ComparisonOp::GreaterOrEqual) => ">=",
                None => "=",
            };
            let text = match (node.child(0), node.child(1)) {
                (Ok(left), Ok(right)) => format!(
                    "{} {symbol} {}",
                    render(&left, options, PREC_BITWISE),
                    render(&right, options, PREC_BITWISE),
                ),
                _ => "undefined".to_string(),
            };
            (text, PREC_COMPARISON)
        }
        NodeKind::Variable | NodeKind::Unit => {
            let text = match node.item() {
                Some(item) => item.name(),
                None => "undefined".to_string(),
            };
            (text, PREC_ATOM)
        }
        NodeKind::Function => {
            let name = match node.item() {
                Some(item) => item.name(),
                None => "undefined".to_string(),
            };
            let args: Vec<String> = (0..node.child_count())
                .filter_map(|index| node.child(index).ok())
                .map(|arg| render(&arg, options, PREC_COMPARISON))
                .collect();
            (format!("{name}({})", args.join(", ")), PREC_ATOM)
        }
        NodeKind::Vector => {
            let elements: Vec<String> = (0..node.child_count())
                .filter_map(|index| node.child(index).ok())
                .map(|e| render(&e, options, PREC_COMPARISON))
                .collect();
            (format!("[{}]", elements.join(", ")), PREC_ATOM)
        }
        NodeKind::Undefined => ("undefined".to_string(), PREC_ATOM),
        _ => (format!("{:?}", &**node), PREC_ATOM),
    }
}

fn join_children(node: &NodeRef, options: &PrintOptions, sep: &str, prec: u8) -> String {
    (0..node.child_count())
        .filter_map(|index| node.child(index).ok())
        .map(|child| render(&child, options, prec))
        .collect::<Vec<_>>()
        .join(sep)
}

fn format_number(value: &Number, options: &PrintOptions) -> String {
    if let Ok(float) = value.try_to_f64() {
        let precision = options.precision.unwrap_or(10);
        let mut text = format!("{float:.precision$}");
        if text.contains('.') {
            while text.ends_with('0') {
                text.pop();
            }
            if text.ends_with('.') {
                text.pop();
            }
        }
        return text;
    }
    value.to_string()
}

/// `Multiplication(a, Power(b, Number(-1)))` is the lowered form of `a / b`.
fn as_division(node: &NodeRef) -> Option<(NodeRef, NodeRef)> {
    if node.child_count() != 2 {
        return None;
    }
    let numerator = node.child(0).ok()?;
    let power = node.child(1).ok()?;
    if power.kind() != NodeKind::Power {
        return None;
    }
    let exponent = power.child(1).ok()?;
    if exponent.number_value()? == Number::from(-1) {
        Some((numerator, power.child(0).ok()?))
    } else {
        None
    }
}

/// `Multiplication(Number(-1), a)` is the lowered form of `-a`.
fn as_negation(node: &NodeRef) -> Option<NodeRef> {
    if node.kind() != NodeKind::Multiplication || node.child_count() != 2 {
        return None;
    }
    let first = node.child(0).ok()?;
    if first.number_value()? == Number::from(-1) {
        node.child(1).ok()
    } else {
        None
    }
}
