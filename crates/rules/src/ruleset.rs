//! Rules, constraints, and their bin-keyed collection.
//!
//! A [`Rule`] contributes an additive science-utility adjustment when its
//! application predicate holds; a [`Constraint`] bounds an aggregate over
//! the queue. A [`RuleSet`] groups both per priority bin with default lists
//! for bins that have no explicit entry.

use std::collections::BTreeMap;

use tracing::{debug, error, warn};
use triage_core::{AsdpAssignments, AsdpList};

use crate::expr::{BoolExpr, ValueExpr};

/// An additive utility adjustment over one or two quantified ASDP variables.
#[derive(Debug, Clone)]
pub struct Rule {
    variables: Vec<String>,
    application: BoolExpr,
    adjustment: ValueExpr,
    /// Maximum number of adjustment accumulations; negative means unbounded.
    max_applications: i64,
}

impl Rule {
    pub fn new(
        variables: Vec<String>,
        application: BoolExpr,
        adjustment: ValueExpr,
        max_applications: i64,
    ) -> Rule {
        Rule {
            variables,
            application,
            adjustment,
            max_applications,
        }
    }

    fn capped(&self, applications: i64) -> bool {
        self.max_applications >= 0 && applications >= self.max_applications
    }

    /// Total utility adjustment from applying this rule to the queue.
    ///
    /// With one variable the queue is iterated once; with two variables all
    /// ordered pairs are considered (including self-pairs). Both loops
    /// observe the application cap. Any other arity is inert.
    pub fn apply(&self, asdps: &AsdpList) -> f64 {
        let mut applications = 0i64;
        let mut total = 0.0;

        match self.variables.len() {
            1 => {
                for asdp in asdps {
                    if self.capped(applications) {
                        break;
                    }
                    let mut assignments = AsdpAssignments::new();
                    assignments.insert(self.variables[0].clone(), asdp.clone());
                    if self.application.eval(&assignments, asdps) {
                        let adj = self.adjustment.eval(&assignments, asdps);
                        if adj.is_numeric() {
                            total += adj.as_numeric();
                            applications += 1;
                        } else {
                            warn!("rule adjustment is non-numeric; skipped");
                        }
                    }
                }
                total
            }

            2 => {
                'outer: for a in asdps {
                    for b in asdps {
                        if self.capped(applications) {
                            break 'outer;
                        }
                        let mut assignments = AsdpAssignments::new();
                        assignments.insert(self.variables[0].clone(), a.clone());
                        assignments.insert(self.variables[1].clone(), b.clone());
                        if self.application.eval(&assignments, asdps) {
                            let adj = self.adjustment.eval(&assignments, asdps);
                            if adj.is_numeric() {
                                total += adj.as_numeric();
                                applications += 1;
                            } else {
                                warn!("rule adjustment is non-numeric; skipped");
                            }
                        }
                    }
                }
                total
            }

            n => {
                error!("rule with {} variables is not supported; ignored", n);
                0.0
            }
        }
    }
}

/// A bound on an aggregate computed over applicable queue entries.
///
/// When `sum_field` is present its numeric value is summed over entries for
/// which the application predicate holds; otherwise the applicable entries
/// are counted. The constraint is satisfied while the aggregate stays
/// strictly below the bound.
#[derive(Debug, Clone)]
pub struct Constraint {
    variables: Vec<String>,
    application: BoolExpr,
    sum_field: Option<ValueExpr>,
    bound: f64,
}

impl Constraint {
    pub fn new(
        variables: Vec<String>,
        application: BoolExpr,
        sum_field: Option<ValueExpr>,
        bound: f64,
    ) -> Constraint {
        Constraint {
            variables,
            application,
            sum_field,
            bound,
        }
    }

    /// Whether the constraint is satisfied for the given queue.
    pub fn apply(&self, asdps: &AsdpList) -> bool {
        if self.variables.len() != 1 {
            warn!(
                "constraint with {} variables is not supported; vacuously satisfied",
                self.variables.len()
            );
            return true;
        }

        let mut aggregate = 0.0;
        for asdp in asdps {
            let mut assignments = AsdpAssignments::new();
            assignments.insert(self.variables[0].clone(), asdp.clone());
            if self.application.eval(&assignments, asdps) {
                match &self.sum_field {
                    Some(expr) => {
                        let value = expr.eval(&assignments, asdps);
                        if value.is_numeric() {
                            aggregate += value.as_numeric();
                        } else {
                            warn!("constraint sum field is non-numeric; not aggregated");
                        }
                    }
                    None => aggregate += 1.0,
                }
            }
        }

        aggregate < self.bound
    }
}

/// All rules and constraints across priority bins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<i64, Vec<Rule>>,
    constraints: BTreeMap<i64, Vec<Constraint>>,
    default_rules: Vec<Rule>,
    default_constraints: Vec<Constraint>,
}

impl RuleSet {
    pub fn new(
        rules: BTreeMap<i64, Vec<Rule>>,
        constraints: BTreeMap<i64, Vec<Constraint>>,
        default_rules: Vec<Rule>,
        default_constraints: Vec<Constraint>,
    ) -> RuleSet {
        RuleSet {
            rules,
            constraints,
            default_rules,
            default_constraints,
        }
    }

    /// Rules for a bin, falling back to the default list.
    pub fn rules_for(&self, bin: i64) -> &[Rule] {
        self.rules.get(&bin).unwrap_or(&self.default_rules)
    }

    /// Constraints for a bin, falling back to the default list.
    pub fn constraints_for(&self, bin: i64) -> &[Constraint] {
        self.constraints
            .get(&bin)
            .unwrap_or(&self.default_constraints)
    }

    /// Apply all constraints then all rules for the bin to the queue.
    ///
    /// Returns `(satisfied, utility_adjustment)`. Constraints are checked in
    /// declared order; the first violation rejects the queue with a zero
    /// adjustment.
    pub fn apply(&self, bin: i64, queue: &AsdpList) -> (bool, f64) {
        for (index, constraint) in self.constraints_for(bin).iter().enumerate() {
            if !constraint.apply(queue) {
                debug!("bin {}: constraint {} violated", bin, index);
                return (false, 0.0);
            }
        }

        let adjustment = self
            .rules_for(bin)
            .iter()
            .map(|rule| rule.apply(queue))
            .sum();

        (true, adjustment)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
