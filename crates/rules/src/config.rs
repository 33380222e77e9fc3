//! Rule configuration decoding.
//!
//! The external representation is a JSON AST: every node is an object with a
//! `__type__` tag and a `__contents__` map of named arguments, decoded
//! recursively. A malformed rule or constraint is dropped with a logged
//! error; its siblings survive. A structurally invalid root yields an empty
//! rule set.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{error, warn};

use crate::expr::{BoolExpr, ValueExpr};
use crate::ruleset::{Constraint, Rule, RuleSet};

/// Load a rule set from a JSON configuration file.
///
/// An unreadable or unparseable file is treated like a structurally invalid
/// root: the error is logged and the empty rule set is returned.
pub fn load_rule_config(path: &Path) -> RuleSet {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            error!("cannot read rule config {}: {}", path.display(), err);
            return RuleSet::default();
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(root) => parse_rule_config(&root),
        Err(err) => {
            error!("cannot parse rule config {}: {}", path.display(), err);
            RuleSet::default()
        }
    }
}

/// Decode a rule set from its JSON representation.
///
/// Top-level keys are decimal bin numbers or the literal `"default"`; any
/// other key is logged and skipped.
pub fn parse_rule_config(root: &Value) -> RuleSet {
    let Some(bins) = root.as_object() else {
        error!("rule config root is not an object");
        return RuleSet::default();
    };

    let mut rules = std::collections::BTreeMap::new();
    let mut constraints = std::collections::BTreeMap::new();
    let mut default_rules = Vec::new();
    let mut default_constraints = Vec::new();

    for (key, value) in bins {
        let (bin_rules, bin_constraints) = parse_bin(key, value);
        if key == "default" {
            default_rules = bin_rules;
            default_constraints = bin_constraints;
        } else {
            match key.parse::<i64>() {
                Ok(bin) => {
                    rules.insert(bin, bin_rules);
                    constraints.insert(bin, bin_constraints);
                }
                Err(_) => {
                    error!("rule config key '{}' is not a bin number; skipped", key);
                }
            }
        }
    }

    RuleSet::new(rules, constraints, default_rules, default_constraints)
}

fn parse_bin(key: &str, value: &Value) -> (Vec<Rule>, Vec<Constraint>) {
    let mut rules = Vec::new();
    let mut constraints = Vec::new();

    if let Some(entries) = value.get("rules").and_then(Value::as_array) {
        for (index, entry) in entries.iter().enumerate() {
            match parse_rule(entry) {
                Some(rule) => rules.push(rule),
                None => error!("bin '{}': rule {} is malformed; dropped", key, index),
            }
        }
    }

    if let Some(entries) = value.get("constraints").and_then(Value::as_array) {
        for (index, entry) in entries.iter().enumerate() {
            match parse_constraint(entry) {
                Some(constraint) => constraints.push(constraint),
                None => error!("bin '{}': constraint {} is malformed; dropped", key, index),
            }
        }
    }

    (rules, constraints)
}

// ── AST node decoding ───────────────────────────────────────────────

fn node_type(value: &Value) -> Option<&str> {
    value.get("__type__")?.as_str()
}

fn argument<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.get("__contents__")?.as_object()?.get(name)
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

fn parse_rule(value: &Value) -> Option<Rule> {
    if node_type(value)? != "Rule" {
        warn!("expected a Rule node");
        return None;
    }

    let variables = string_list(argument(value, "variables")?)?;
    let application = parse_bool_expr(argument(value, "application")?)?;
    let adjustment = parse_value_expr(argument(value, "adjustment")?)?;

    // A missing or malformed cap means unbounded.
    let max_applications = argument(value, "max_applications")
        .and_then(Value::as_i64)
        .unwrap_or(-1);

    Some(Rule::new(variables, application, adjustment, max_applications))
}

fn parse_constraint(value: &Value) -> Option<Constraint> {
    if node_type(value)? != "Constraint" {
        warn!("expected a Constraint node");
        return None;
    }

    let variables = string_list(argument(value, "variables")?)?;
    let application = parse_bool_expr(argument(value, "application")?)?;

    // `sum_field: null` (or an absent key) selects count mode.
    let sum_field = match argument(value, "sum_field") {
        None => None,
        Some(Value::Null) => None,
        Some(node) => Some(parse_value_expr(node)?),
    };

    let bound = argument(value, "constraint_value")?.as_f64()?;

    Some(Constraint::new(variables, application, sum_field, bound))
}

fn parse_bool_expr(value: &Value) -> Option<BoolExpr> {
    match node_type(value)? {
        "LogicalConstant" => {
            let constant = argument(value, "value")?.as_bool()?;
            Some(BoolExpr::Constant(constant))
        }
        "LogicalNot" => {
            let inner = parse_bool_expr(argument(value, "expression")?)?;
            Some(BoolExpr::Not(Box::new(inner)))
        }
        "BinaryLogicalExpression" => {
            let op = argument(value, "operator")?.as_str()?.to_string();
            let left = parse_bool_expr(argument(value, "left_expression")?)?;
            let right = parse_bool_expr(argument(value, "right_expression")?)?;
            Some(BoolExpr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        "ComparatorExpression" => {
            let op = argument(value, "comparator")?.as_str()?.to_string();
            let left = parse_value_expr(argument(value, "left_expression")?)?;
            let right = parse_value_expr(argument(value, "right_expression")?)?;
            Some(BoolExpr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        "ExistentialExpression" => {
            let variable = argument(value, "variable")?.as_str()?.to_string();
            let body = parse_bool_expr(argument(value, "expression")?)?;
            Some(BoolExpr::Exists {
                variable,
                body: Box::new(body),
            })
        }
        other => {
            warn!("unknown boolean expression type '{}'", other);
            None
        }
    }
}

fn parse_value_expr(value: &Value) -> Option<ValueExpr> {
    match node_type(value)? {
        "ConstExpression" => {
            let constant = argument(value, "value")?.as_f64()?;
            Some(ValueExpr::Const(constant))
        }
        "StringConstant" => {
            let constant = argument(value, "value")?.as_str()?.to_string();
            Some(ValueExpr::Text(constant))
        }
        "MinusExpression" => {
            let inner = parse_value_expr(argument(value, "expression")?)?;
            Some(ValueExpr::Neg(Box::new(inner)))
        }
        "BinaryExpression" => {
            let op = argument(value, "operator")?.as_str()?.to_string();
            let left = parse_value_expr(argument(value, "left_expression")?)?;
            let right = parse_value_expr(argument(value, "right_expression")?)?;
            Some(ValueExpr::Arith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        "Field" => {
            let variable = argument(value, "variable_name")?.as_str()?.to_string();
            let field = argument(value, "field_name")?.as_str()?.to_string();
            Some(ValueExpr::Field { variable, field })
        }
        other => {
            warn!("unknown value expression type '{}'", other);
            None
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use triage_core::{AsdpEntry, MetadataValue};

    fn node(kind: &str, contents: Value) -> Value {
        json!({ "__type__": kind, "__contents__": contents })
    }

    fn sized(size: i64) -> AsdpEntry {
        let mut entry = AsdpEntry::new();
        entry.insert("size".to_string(), MetadataValue::Int(size));
        entry
    }

    fn true_node() -> Value {
        node("LogicalConstant", json!({ "value": true }))
    }

    fn size_field() -> Value {
        node(
            "Field",
            json!({ "variable_name": "x", "field_name": "size" }),
        )
    }

    #[test]
    fn parses_rules_and_constraints_per_bin() {
        let config = json!({
            "1": {
                "rules": [node("Rule", json!({
                    "variables": ["x"],
                    "application": true_node(),
                    "adjustment": node("ConstExpression", json!({ "value": 2.0 })),
                    "max_applications": -1,
                }))],
                "constraints": [node("Constraint", json!({
                    "variables": ["x"],
                    "application": true_node(),
                    "sum_field": size_field(),
                    "constraint_value": 100.0,
                }))],
            },
            "default": { "rules": [], "constraints": [] },
        });

        let ruleset = parse_rule_config(&config);
        assert_eq!(ruleset.rules_for(1).len(), 1);
        assert_eq!(ruleset.constraints_for(1).len(), 1);
        assert!(ruleset.rules_for(9).is_empty());

        let queue = vec![sized(10), sized(20)];
        assert_eq!(ruleset.apply(1, &queue), (true, 4.0));
    }

    #[test]
    fn nested_expression_tree_round_trips_through_eval() {
        // size > 5 AND NOT (type == "zoom")
        let application = node(
            "BinaryLogicalExpression",
            json!({
                "operator": "AND",
                "left_expression": node("ComparatorExpression", json!({
                    "comparator": ">",
                    "left_expression": size_field(),
                    "right_expression": node("ConstExpression", json!({ "value": 5.0 })),
                })),
                "right_expression": node("LogicalNot", json!({
                    "expression": node("ComparatorExpression", json!({
                        "comparator": "==",
                        "left_expression": node("Field", json!({
                            "variable_name": "x", "field_name": "type",
                        })),
                        "right_expression": node("StringConstant", json!({ "value": "zoom" })),
                    })),
                })),
            }),
        );
        let config = json!({
            "default": {
                "rules": [node("Rule", json!({
                    "variables": ["x"],
                    "application": application,
                    "adjustment": node("MinusExpression", json!({
                        "expression": node("ConstExpression", json!({ "value": 1.0 })),
                    })),
                    "max_applications": -1,
                }))],
                "constraints": [],
            },
        });

        let ruleset = parse_rule_config(&config);
        let mut cntx = sized(10);
        cntx.insert("type".to_string(), MetadataValue::Text("cntx".to_string()));
        let mut zoom = sized(10);
        zoom.insert("type".to_string(), MetadataValue::Text("zoom".to_string()));

        // Only the cntx entry matches, contributing -1.
        assert_eq!(ruleset.apply(0, &vec![cntx, zoom]), (true, -1.0));
    }

    #[test]
    fn existential_expression_parses() {
        let config = json!({
            "default": {
                "rules": [node("Rule", json!({
                    "variables": ["x"],
                    "application": node("ExistentialExpression", json!({
                        "variable": "y",
                        "expression": node("ComparatorExpression", json!({
                            "comparator": ">",
                            "left_expression": node("Field", json!({
                                "variable_name": "y", "field_name": "size",
                            })),
                            "right_expression": size_field(),
                        })),
                    })),
                    "adjustment": node("ConstExpression", json!({ "value": 1.0 })),
                    "max_applications": -1,
                }))],
                "constraints": [],
            },
        });

        let ruleset = parse_rule_config(&config);
        // Every entry except the largest has a strictly larger witness.
        let queue = vec![sized(1), sized(2), sized(3)];
        assert_eq!(ruleset.apply(0, &queue), (true, 2.0));
    }

    #[test]
    fn malformed_rule_is_dropped_but_siblings_survive() {
        let config = json!({
            "default": {
                "rules": [
                    node("Rule", json!({
                        "variables": ["x"],
                        "application": node("LogicalConstant", json!({ "value": "not-a-bool" })),
                        "adjustment": node("ConstExpression", json!({ "value": 1.0 })),
                    })),
                    node("Rule", json!({
                        "variables": ["x"],
                        "application": true_node(),
                        "adjustment": node("ConstExpression", json!({ "value": 3.0 })),
                    })),
                ],
                "constraints": [],
            },
        });

        let ruleset = parse_rule_config(&config);
        assert_eq!(ruleset.rules_for(0).len(), 1);
        assert_eq!(ruleset.apply(0, &vec![sized(1)]), (true, 3.0));
    }

    #[test]
    fn unknown_node_type_rejects_the_enclosing_rule() {
        let config = json!({
            "default": {
                "rules": [node("Rule", json!({
                    "variables": ["x"],
                    "application": node("TernaryMaybe", json!({})),
                    "adjustment": node("ConstExpression", json!({ "value": 1.0 })),
                }))],
                "constraints": [],
            },
        });
        assert!(parse_rule_config(&config).rules_for(0).is_empty());
    }

    #[test]
    fn missing_max_applications_means_unbounded() {
        let config = json!({
            "default": {
                "rules": [node("Rule", json!({
                    "variables": ["x"],
                    "application": true_node(),
                    "adjustment": node("ConstExpression", json!({ "value": 1.0 })),
                }))],
                "constraints": [],
            },
        });
        let ruleset = parse_rule_config(&config);
        let queue: Vec<AsdpEntry> = (0..5).map(|_| sized(1)).collect();
        assert_eq!(ruleset.apply(0, &queue), (true, 5.0));
    }

    #[test]
    fn null_sum_field_selects_count_mode() {
        let config = json!({
            "default": {
                "rules": [],
                "constraints": [node("Constraint", json!({
                    "variables": ["x"],
                    "application": true_node(),
                    "sum_field": null,
                    "constraint_value": 2.0,
                }))],
            },
        });
        let ruleset = parse_rule_config(&config);
        assert!(ruleset.apply(0, &vec![sized(1)]).0);
        assert!(!ruleset.apply(0, &vec![sized(1), sized(2)]).0);
    }

    #[test]
    fn non_integer_bin_key_is_skipped() {
        let config = json!({
            "first": {
                "rules": [node("Rule", json!({
                    "variables": ["x"],
                    "application": true_node(),
                    "adjustment": node("ConstExpression", json!({ "value": 1.0 })),
                }))],
                "constraints": [],
            },
        });
        let ruleset = parse_rule_config(&config);
        assert!(ruleset.rules_for(0).is_empty());
    }

    #[test]
    fn non_object_root_yields_empty_rule_set() {
        for root in [json!([1, 2, 3]), json!("nope"), json!(null)] {
            let ruleset = parse_rule_config(&root);
            assert!(ruleset.rules_for(0).is_empty());
            assert!(ruleset.constraints_for(0).is_empty());
        }
    }
}
