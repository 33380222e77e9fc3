//! Prioritization rule and constraint language.
//!
//! Rules and constraints are small typed expressions over ASDP metadata,
//! parsed from an external JSON AST representation. A rule contributes an
//! additive utility adjustment to a candidate downlink queue; a constraint
//! is a predicate that must hold for a candidate queue to be admissible.
//!
//! Evaluation failures never propagate as errors: boolean expressions fall
//! back to `false` and value expressions to `NaN`, with a log event.

pub mod config;
pub mod expr;
pub mod ruleset;

pub use config::{load_rule_config, parse_rule_config};
pub use expr::{BoolExpr, ValueExpr};
pub use ruleset::{Constraint, Rule, RuleSet};
