//! Similarity configuration decoding.
//!
//! The external representation is a JSON object with an `alphas` map and a
//! `functions` map, both keyed by decimal bin numbers or the literal
//! `"default"`. Malformed entries are dropped with a logged error; siblings
//! survive. A structurally invalid root yields the default configuration
//! (α = 1.0, no functions).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{error, warn};

use crate::engine::{FunctionKey, FunctionMap, Similarity};
use crate::function::SimilarityFunction;

/// Load a similarity configuration from a JSON file.
///
/// An unreadable or unparseable file logs an error and yields the default
/// configuration.
pub fn load_similarity_config(path: &Path) -> Similarity {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            error!("cannot read similarity config {}: {}", path.display(), err);
            return Similarity::default();
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(root) => parse_similarity_config(&root),
        Err(err) => {
            error!("cannot parse similarity config {}: {}", path.display(), err);
            Similarity::default()
        }
    }
}

/// Decode a similarity configuration from its JSON representation.
pub fn parse_similarity_config(root: &Value) -> Similarity {
    let mut alphas = BTreeMap::new();
    let mut default_alpha = 1.0;

    match root.get("alphas") {
        Some(Value::Object(entries)) => {
            for (key, value) in entries {
                let Some(alpha) = value.as_f64() else {
                    error!("alpha for '{}' is not a number; skipped", key);
                    continue;
                };
                if key == "default" {
                    default_alpha = alpha;
                } else {
                    match key.parse::<i64>() {
                        Ok(bin) => {
                            alphas.insert(bin, alpha);
                        }
                        Err(_) => error!("alpha key '{}' is not a bin number; skipped", key),
                    }
                }
            }
        }
        Some(_) => error!("'alphas' is not an object; ignored"),
        None => {}
    }

    let mut functions = BTreeMap::new();
    let mut default_functions = FunctionMap::new();

    match root.get("functions") {
        Some(Value::Object(entries)) => {
            for (key, value) in entries {
                let Some(list) = value.as_array() else {
                    error!("function list for '{}' is not an array; skipped", key);
                    continue;
                };
                let parsed = parse_function_list(list);
                if key == "default" {
                    default_functions = parsed;
                } else {
                    match key.parse::<i64>() {
                        Ok(bin) => {
                            functions.insert(bin, parsed);
                        }
                        Err(_) => error!("function key '{}' is not a bin number; skipped", key),
                    }
                }
            }
        }
        Some(_) => error!("'functions' is not an object; ignored"),
        None => {}
    }

    Similarity::new(alphas, default_alpha, functions, default_functions)
}

fn parse_function_list(list: &[Value]) -> FunctionMap {
    let mut functions = FunctionMap::new();
    for entry in list {
        match parse_function_entry(entry) {
            Some((key, function)) => {
                functions.insert(key, function);
            }
            None => error!("malformed similarity function entry; dropped"),
        }
    }
    functions
}

fn parse_function_entry(entry: &Value) -> Option<(FunctionKey, SimilarityFunction)> {
    let key_array = entry.get("key")?.as_array()?;
    if key_array.len() != 2 {
        warn!("similarity function key must be [instrument, type]");
        return None;
    }
    let key = (
        key_array[0].as_str()?.to_string(),
        key_array[1].as_str()?.to_string(),
    );

    let function = entry.get("function")?.as_object()?;
    let descriptor_names = function.get("diversity_descriptor")?.as_array()?;
    let weight_values = function.get("weights")?.as_array()?;
    let kernel = function.get("similarity_type")?.as_str()?.to_string();
    let param_entries = function.get("similarity_parameters")?.as_object()?;

    if descriptor_names.len() != weight_values.len() {
        warn!(
            "diversity descriptor count {} does not match weight count {}",
            descriptor_names.len(),
            weight_values.len()
        );
        return None;
    }

    let mut descriptors = Vec::with_capacity(descriptor_names.len());
    let mut weights = Vec::with_capacity(weight_values.len());
    for (name, weight) in descriptor_names.iter().zip(weight_values) {
        let (Some(name), Some(weight)) = (name.as_str(), weight.as_f64()) else {
            warn!("non-string descriptor or non-numeric weight; skipped");
            continue;
        };
        descriptors.push(name.to_string());
        weights.push(weight);
    }

    let mut params = BTreeMap::new();
    for (name, value) in param_entries {
        match value.as_f64() {
            Some(value) => {
                params.insert(name.clone(), value);
            }
            None => error!("similarity parameter '{}' is not a number; skipped", name),
        }
    }

    Some((key, SimilarityFunction::new(descriptors, weights, kernel, params)))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use triage_core::{fields, AsdpEntry, MetadataValue};

    fn asdp(id: i64, x: f64) -> AsdpEntry {
        let mut entry = AsdpEntry::new();
        entry.insert(fields::ID.to_string(), MetadataValue::Int(id));
        entry.insert(
            fields::INSTRUMENT_NAME.to_string(),
            MetadataValue::Text("acme".to_string()),
        );
        entry.insert(
            fields::TYPE.to_string(),
            MetadataValue::Text("cntx".to_string()),
        );
        entry.insert("x".to_string(), MetadataValue::Float(x));
        entry
    }

    fn example_config() -> Value {
        json!({
            "alphas": { "default": 0.5, "2": 0.9 },
            "functions": {
                "default": [{
                    "key": ["acme", "cntx"],
                    "function": {
                        "diversity_descriptor": ["x"],
                        "weights": [1.0],
                        "similarity_type": "gaussian",
                        "similarity_parameters": { "sigma": 1.0 },
                    },
                }],
            },
        })
    }

    #[test]
    fn parses_alphas_with_default() {
        let similarity = parse_similarity_config(&example_config());
        assert_eq!(similarity.alpha(2), 0.9);
        assert_eq!(similarity.alpha(7), 0.5);
    }

    #[test]
    fn parses_default_function_map() {
        let mut similarity = parse_similarity_config(&example_config());
        let a = asdp(1, 0.0);
        let b = asdp(2, 0.0);
        assert_eq!(similarity.max_similarity(0, &vec![b], &a), 1.0);
    }

    #[test]
    fn missing_sections_yield_defaults() {
        let similarity = parse_similarity_config(&json!({}));
        assert_eq!(similarity.alpha(0), 1.0);
    }

    #[test]
    fn non_object_root_yields_default_config() {
        let mut similarity = parse_similarity_config(&json!([]));
        assert_eq!(similarity.alpha(0), 1.0);
        let a = asdp(1, 0.0);
        let b = asdp(2, 0.0);
        assert_eq!(similarity.max_similarity(0, &vec![b], &a), 0.0);
    }

    #[test]
    fn bad_alpha_entries_are_skipped() {
        let similarity = parse_similarity_config(&json!({
            "alphas": { "default": "high", "3": 0.3, "three": 0.4 },
        }));
        assert_eq!(similarity.alpha(3), 0.3);
        // The malformed default falls back to 1.0.
        assert_eq!(similarity.alpha(9), 1.0);
    }

    #[test]
    fn mismatched_descriptor_and_weight_lengths_drop_the_entry() {
        let mut similarity = parse_similarity_config(&json!({
            "functions": {
                "default": [{
                    "key": ["acme", "cntx"],
                    "function": {
                        "diversity_descriptor": ["x", "y"],
                        "weights": [1.0],
                        "similarity_type": "gaussian",
                        "similarity_parameters": {},
                    },
                }],
            },
        }));
        let a = asdp(1, 0.0);
        let b = asdp(2, 0.0);
        assert_eq!(similarity.max_similarity(0, &vec![b], &a), 0.0);
    }

    #[test]
    fn bad_function_entry_does_not_poison_siblings() {
        let mut similarity = parse_similarity_config(&json!({
            "functions": {
                "default": [
                    { "key": ["only-one-part"] },
                    {
                        "key": ["acme", "cntx"],
                        "function": {
                            "diversity_descriptor": ["x"],
                            "weights": [1.0],
                            "similarity_type": "gaussian",
                            "similarity_parameters": { "sigma": 2.0 },
                        },
                    },
                ],
            },
        }));
        let a = asdp(1, 0.0);
        let b = asdp(2, 1.0);
        let expected = (-(1.0 / 4.0f64)).exp();
        assert!((similarity.max_similarity(0, &vec![b], &a) - expected).abs() < 1e-12);
    }
}
