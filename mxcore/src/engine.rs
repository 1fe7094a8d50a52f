//! Evaluation engine: a pure recursive fold over expression trees.
//!
//! Role
//! - Evaluation never mutates its input; it builds a new tree. Numeric
//!   subtrees fold to Number nodes, everything else keeps its symbolic
//!   structure with evaluated children.
//! - Every visited node spends one step of the budget; exhaustion surfaces as
//!   a typed [`CalcError::Aborted`], never a crash.
use log::debug;

use mxexpr::node::{ComparisonOp, Node, NodeKind, NodeRef};
use mxexpr::number::Number;

use crate::calculator::Calculator;
use crate::error::{CalcError, CalcResult};
use crate::options::EvaluationOptions;

// A tree deeper than this is cyclic or corrupted; the guard stops the
// recursion before the stack does.
const MAX_DEPTH: usize = 512;

struct Budget {
    remaining: Option<u64>,
    spent: u64,
    depth: usize,
}

impl Budget {
    fn new(max_steps: Option<u64>) -> Budget {
        Budget {
            remaining: max_steps,
            spent: 0,
            depth: 0,
        }
    }

    fn spend(&mut self) -> CalcResult<()> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(CalcError::Aborted { steps: self.spent });
            }
            *remaining -= 1;
        }
        self.spent += 1;
        Ok(())
    }
}

impl Calculator {
    /// Evaluate `node` into a new tree.
    ///
    /// `to` names a target unit for the result; the name must resolve but no
    /// unit conversion is applied here. Reentrant calls on one calculator are
    /// an invariant violation and panic.
    pub fn calculate(
        &self,
        node: &NodeRef,
        options: &EvaluationOptions,
        to: Option<&str>,
    ) -> CalcResult<NodeRef> {
        let _guard = self
            .engine
            .try_lock()
            .expect("reentrant engine call on this calculator");
        if let Some(name) = to {
            let unit = self.resolve_target_unit(name)?;
            debug!("conversion target resolved to unit '{}'", unit.name());
        }
        let mut budget = Budget::new(options.max_steps);
        let result = self.eval(node, &mut budget)?;
        debug!("calculation finished in {} steps", budget.spent);
        Ok(result)
    }

    fn eval(&self, node: &NodeRef, budget: &mut Budget) -> CalcResult<NodeRef> {
        budget.spend()?;
        budget.depth += 1;
        assert!(
            budget.depth <= MAX_DEPTH,
            "expression tree deeper than {MAX_DEPTH} levels; cyclic or corrupted"
        );
        let result = self.eval_kind(node, budget);
        budget.depth -= 1;
        result
    }

    fn eval_kind(&self, node: &NodeRef, budget: &mut Budget) -> CalcResult<NodeRef> {
        let kind = node.kind();
        match kind {
            NodeKind::Number => Ok(Node::number(node.number_value().unwrap_or_else(Number::zero))),

            NodeKind::Addition => self.eval_fold(node, budget, kind, |a, b| Some(a + b)),
            NodeKind::Multiplication => self.eval_fold(node, budget, kind, |a, b| Some(a * b)),
            NodeKind::BitwiseAnd => self.eval_fold(node, budget, kind, |a, b| a.bit_and(&b)),
            NodeKind::BitwiseOr => self.eval_fold(node, budget, kind, |a, b| a.bit_or(&b)),
            NodeKind::BitwiseXor => self.eval_fold(node, budget, kind, |a, b| a.bit_xor(&b)),
            NodeKind::BitwiseNot => self.eval_bitwise_not(node, budget),

            NodeKind::LogicalAnd => self.eval_logical(node, budget, kind, |a, b| a && b),
            NodeKind::LogicalOr => self.eval_logical(node, budget, kind, |a, b| a || b),
            NodeKind::LogicalXor => self.eval_logical(node, budget, kind, |a, b| a != b),
            NodeKind::LogicalNot => self.eval_logical_not(node, budget),

            NodeKind::Power => self.eval_power(node, budget),
            NodeKind::Comparison => self.eval_comparison(node, budget),
            NodeKind::Variable => self.eval_variable(node, budget),
            NodeKind::Function => self.eval_function(node, budget),

            NodeKind::Unit => match node.item() {
                Some(item) => Node::unit(item).map_err(CalcError::from),
                None => Ok(Node::undefined()),
            },
            NodeKind::Vector => {
                let children = self.eval_children(node, budget)?;
                Ok(Node::vector(children))
            }
            NodeKind::Undefined => Ok(Node::undefined()),
            kind => Ok(Node::marker(kind)),
        }
    }

    fn eval_children(&self, node: &NodeRef, budget: &mut Budget) -> CalcResult<Vec<NodeRef>> {
        let mut out = Vec::with_capacity(node.child_count());
        for index in 0..node.child_count() {
            let child = node.child(index)?;
            out.push(self.eval(&child, budget)?);
        }
        Ok(out)
    }

    /// N-ary numeric fold; any non-numeric operand or fold failure keeps the
    /// operator symbolic over the evaluated children.
    fn eval_fold(
        &self,
        node: &NodeRef,
        budget: &mut Budget,
        kind: NodeKind,
        fold: impl Fn(Number, Number) -> Option<Number>,
    ) -> CalcResult<NodeRef> {
        let children = self.eval_children(node, budget)?;
        let mut acc: Option<Number> = None;
        for index in 0..children.len() {
            let value = match children[index].number_value() {
                Some(value) => value,
                None => return rebuild(kind, children),
            };
            acc = match acc {
                None => Some(value),
                Some(acc) => match fold(acc, value) {
                    Some(folded) => Some(folded),
                    None => return rebuild(kind, children),
                },
            };
        }
        match acc {
            Some(value) => Ok(Node::number(value)),
            None => rebuild(kind, children),
        }
    }

    fn eval_bitwise_not(&self, node: &NodeRef, budget: &mut Budget) -> CalcResult<NodeRef> {
        let children = self.eval_children(node, budget)?;
        if let [child] = children.as_slice() {
            if let Some(value) = child.number_value() {
                if value.is_integer() {
                    // Two's complement: not x = -x - 1.
                    return Ok(Node::number(-value - Number::from(1)));
                }
            }
        }
        rebuild(NodeKind::BitwiseNot, children)
    }

    fn eval_logical(
        &self,
        node: &NodeRef,
        budget: &mut Budget,
        kind: NodeKind,
        fold: impl Fn(bool, bool) -> bool,
    ) -> CalcResult<NodeRef> {
        let children = self.eval_children(node, budget)?;
        let mut acc: Option<bool> = None;
        for index in 0..children.len() {
            let truth = match children[index].number_value() {
                Some(value) => !value.is_zero(),
                None => return rebuild(kind, children),
            };
            acc = Some(match acc {
                None => truth,
                Some(acc) => fold(acc, truth),
            });
        }
        match acc {
            Some(truth) => Ok(Node::number(truth as i64)),
            None => rebuild(kind, children),
        }
    }

    fn eval_logical_not(&self, node: &NodeRef, budget: &mut Budget) -> CalcResult<NodeRef> {
        let children = self.eval_children(node, budget)?;
        if let [child] = children.as_slice() {
            if let Some(value) = child.number_value() {
                return Ok(Node::number(value.is_zero() as i64));
            }
        }
        rebuild(NodeKind::LogicalNot, children)
    }

    fn eval_power(&self, node: &NodeRef, budget: &mut Budget) -> CalcResult<NodeRef> {
        let base = self.eval(&node.child(0)?, budget)?;
        let exponent = self.eval(&node.child(1)?, budget)?;
        if let (Some(base_value), Some(exp_value)) = (base.number_value(), exponent.number_value()) {
            if let Some(result) = base_value.checked_pow(&exp_value) {
                return Ok(Node::number(result));
            }
        }
        Ok(Node::power(Some(base), Some(exponent)))
    }

    /// Decidable numeric comparisons fold to logical 0/1; everything else
    /// stays a Comparison over evaluated operands.
    fn eval_comparison(&self, node: &NodeRef, budget: &mut Budget) -> CalcResult<NodeRef> {
        let op = match node.comparison_op() {
            Some(op) => op,
            None => return Ok(Node::undefined()),
        };
        let left = self.eval(&node.child(0)?, budget)?;
        let right = self.eval(&node.child(1)?, budget)?;
        if let (Some(a), Some(b)) = (left.number_value(), right.number_value()) {
            let verdict = match op {
                ComparisonOp::Equals => Some(a == b),
                ComparisonOp::NotEquals => Some(a != b),
                ComparisonOp::Less => a.partial_cmp(&b).map(|ord| ord.is_lt()),
                ComparisonOp::Greater => a.partial_cmp(&b).map(|ord| ord.is_gt()),
                ComparisonOp::LessOrEqual => a.partial_cmp(&b).map(|ord| ord.is_le()),
                ComparisonOp::GreaterOrEqual => a.partial_cmp(&b).map(|ord| ord.is_ge()),
            };
            if let Some(verdict) = verdict {
                return Ok(Node::number(verdict as i64));
            }
        }
        Ok(Node::comparison(Some(left), op, Some(right)))
    }

    /// Known variables substitute their value tree (which is evaluated in
    /// turn); unknown variables stay symbolic.
    fn eval_variable(&self, node: &NodeRef, budget: &mut Budget) -> CalcResult<NodeRef> {
        let item = match node.item() {
            Some(item) => item,
            None => return Ok(Node::undefined()),
        };
        match item.value() {
            Some(value) => self.eval(&value, budget),
            None => Node::variable(item).map_err(CalcError::from),
        }
    }

    fn eval_function(&self, node: &NodeRef, budget: &mut Budget) -> CalcResult<NodeRef> {
        let item = match node.item() {
            Some(item) => item,
            None => return Ok(Node::undefined()),
        };
        let args = self.eval_children(node, budget)?;
        if let Some(builtin) = item.builtin() {
            let numeric: Option<Vec<Number>> = args.iter().map(|a| a.number_value()).collect();
            if let Some(numeric) = numeric {
                if let Some(result) = builtin(&numeric) {
                    return Ok(Node::number(result));
                }
            }
        }
        Node::function(item, args).map_err(CalcError::from)
    }
}

impl Calculator {
    /// Parse, evaluate, and render in one call.
    ///
    /// `limit` caps evaluation steps on top of `options.max_steps`; a
    /// negative limit means unbounded.
    pub fn calculate_and_print(
        &self,
        text: &str,
        options: &EvaluationOptions,
        print_options: &crate::options::PrintOptions,
        limit: i64,
    ) -> CalcResult<String> {
        let parsed = self.parse(text, &crate::options::ParseOptions::default());
        let mut options = options.clone();
        if limit >= 0 {
            let limit = limit as u64;
            options.max_steps = Some(options.max_steps.map_or(limit, |max| max.min(limit)));
        }
        let result = self.calculate(&parsed, &options, None)?;
        Ok(self.print(&result, print_options))
    }
}

fn rebuild(kind: NodeKind, children: Vec<NodeRef>) -> CalcResult<NodeRef> {
    Node::operation(kind, children).map_err(CalcError::from)
}
