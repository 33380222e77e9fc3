//! Expression AST and evaluator.
//!
//! Expressions come in two arities: boolean-valued ([`BoolExpr`]) and
//! metadata-valued ([`ValueExpr`]). Both evaluate as pure functions of a
//! variable assignment and the downlink queue under consideration. The
//! evaluator is stateless and re-entrant.
//!
//! Failure semantics are value-level: a boolean expression that cannot be
//! evaluated yields `false`, a value expression yields `Float(NaN)`, and a
//! warning is logged. Nothing here returns `Err`.

use tracing::warn;
use triage_core::{AsdpAssignments, AsdpList, MetadataValue};

/// A boolean-valued expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr {
    /// Literal `true` or `false`.
    Constant(bool),
    /// Logical negation.
    Not(Box<BoolExpr>),
    /// Short-circuit `AND` / `OR`.
    Logical {
        op: String,
        left: Box<BoolExpr>,
        right: Box<BoolExpr>,
    },
    /// Comparison of two value expressions.
    Compare {
        op: String,
        left: Box<ValueExpr>,
        right: Box<ValueExpr>,
    },
    /// Existential quantification over the full ASDP list.
    Exists { variable: String, body: Box<BoolExpr> },
}

/// A metadata-valued expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// Numeric constant.
    Const(f64),
    /// String constant.
    Text(String),
    /// Numeric negation.
    Neg(Box<ValueExpr>),
    /// Binary arithmetic (`*`, `+`, `-`).
    Arith {
        op: String,
        left: Box<ValueExpr>,
        right: Box<ValueExpr>,
    },
    /// Field access on a bound variable, e.g. `x.size`.
    Field { variable: String, field: String },
}

impl BoolExpr {
    /// Evaluate against the given variable bindings and ASDP list.
    pub fn eval(&self, assignments: &AsdpAssignments, asdps: &AsdpList) -> bool {
        match self {
            BoolExpr::Constant(value) => *value,

            BoolExpr::Not(inner) => !inner.eval(assignments, asdps),

            BoolExpr::Logical { op, left, right } => {
                let left_value = left.eval(assignments, asdps);
                match op.as_str() {
                    // Right side is evaluated only when the left side does
                    // not decide the result.
                    "AND" => left_value && right.eval(assignments, asdps),
                    "OR" => left_value || right.eval(assignments, asdps),
                    other => {
                        warn!("unknown logical operator '{}'", other);
                        false
                    }
                }
            }

            BoolExpr::Compare { op, left, right } => {
                let left_value = left.eval(assignments, asdps);
                let right_value = right.eval(assignments, asdps);
                compare(op, &left_value, &right_value)
            }

            BoolExpr::Exists { variable, body } => {
                for asdp in asdps {
                    // Clone so outer bindings are preserved; an inner
                    // variable of the same name shadows for this iteration
                    // only.
                    let mut bound = assignments.clone();
                    bound.insert(variable.clone(), asdp.clone());
                    if body.eval(&bound, asdps) {
                        return true;
                    }
                }
                false
            }
        }
    }
}

impl ValueExpr {
    /// Evaluate against the given variable bindings and ASDP list.
    pub fn eval(&self, assignments: &AsdpAssignments, asdps: &AsdpList) -> MetadataValue {
        match self {
            ValueExpr::Const(value) => MetadataValue::Float(*value),

            ValueExpr::Text(value) => MetadataValue::Text(value.clone()),

            ValueExpr::Neg(inner) => {
                let value = inner.eval(assignments, asdps);
                if value.is_numeric() {
                    MetadataValue::Float(-value.as_numeric())
                } else {
                    warn!("negation of non-numeric value");
                    MetadataValue::Float(f64::NAN)
                }
            }

            ValueExpr::Arith { op, left, right } => {
                let left_value = left.eval(assignments, asdps);
                let right_value = right.eval(assignments, asdps);
                if !(left_value.is_numeric() && right_value.is_numeric()) {
                    warn!("arithmetic on non-numeric operand");
                    return MetadataValue::Float(f64::NAN);
                }
                let l = left_value.as_numeric();
                let r = right_value.as_numeric();
                match op.as_str() {
                    "*" => MetadataValue::Float(l * r),
                    "+" => MetadataValue::Float(l + r),
                    "-" => MetadataValue::Float(l - r),
                    other => {
                        warn!("unsupported arithmetic operator '{}'", other);
                        MetadataValue::Float(f64::NAN)
                    }
                }
            }

            ValueExpr::Field { variable, field } => match assignments.get(variable) {
                Some(entry) => match entry.get(field) {
                    Some(value) => value.clone(),
                    None => {
                        warn!("field '{}' not found on variable '{}'", field, variable);
                        MetadataValue::Float(f64::NAN)
                    }
                },
                None => {
                    warn!("variable '{}' not bound", variable);
                    MetadataValue::Float(f64::NAN)
                }
            },
        }
    }
}

/// Comparator semantics: numeric comparison when both sides are numeric,
/// string equality/inequality when both are strings, `false` with a logged
/// type mismatch otherwise.
fn compare(op: &str, left: &MetadataValue, right: &MetadataValue) -> bool {
    if left.is_numeric() != right.is_numeric() {
        warn!("comparator type mismatch (numeric vs. string)");
        return false;
    }
    if left.is_numeric() {
        let l = left.as_numeric();
        let r = right.as_numeric();
        match op {
            "==" => l == r,
            "!=" => l != r,
            ">" => l > r,
            ">=" => l >= r,
            "<" => l < r,
            "<=" => l <= r,
            other => {
                warn!("unknown comparator '{}'", other);
                false
            }
        }
    } else {
        let l = left.as_text();
        let r = right.as_text();
        match op {
            "==" => l == r,
            "!=" => l != r,
            other => {
                warn!("comparator '{}' not supported for strings", other);
                false
            }
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
