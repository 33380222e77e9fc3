//! Per-(instrument, type) similarity functions.

use std::collections::BTreeMap;

use tracing::warn;
use triage_core::{AsdpEntry, MetadataValue};

/// A configured similarity function: which metadata fields form the
/// diversity descriptor, optional per-field weights, and the kernel applied
/// to a pair of descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityFunction {
    diversity_descriptors: Vec<String>,
    weights: Vec<f64>,
    kernel: String,
    params: BTreeMap<String, f64>,
}

impl SimilarityFunction {
    pub fn new(
        diversity_descriptors: Vec<String>,
        weights: Vec<f64>,
        kernel: String,
        params: BTreeMap<String, f64>,
    ) -> SimilarityFunction {
        SimilarityFunction {
            diversity_descriptors,
            weights,
            kernel,
            params,
        }
    }

    /// Extract the numeric descriptor vector from an entry, applying the
    /// weight at each index where one is provided. A missing or non-numeric
    /// field contributes 0.0 and logs a warning.
    fn extract_descriptor(&self, asdp: &AsdpEntry) -> Vec<f64> {
        let mut descriptor = Vec::with_capacity(self.diversity_descriptors.len());
        for (index, name) in self.diversity_descriptors.iter().enumerate() {
            let mut component = match asdp.get(name) {
                Some(value) if value.is_numeric() => value.as_numeric(),
                Some(_) => {
                    warn!("diversity descriptor '{}' is not numeric; using 0", name);
                    0.0
                }
                None => {
                    warn!("diversity descriptor '{}' is missing; using 0", name);
                    0.0
                }
            };
            if let Some(weight) = self.weights.get(index) {
                component *= weight;
            }
            descriptor.push(component);
        }
        descriptor
    }

    /// Kernel similarity of two entries' descriptors, in `[0, 1]`.
    ///
    /// `gaussian` is the only defined kernel; an unknown kernel name logs
    /// and scores 0.0 (no diversity effect).
    pub fn similarity(&self, asdp1: &AsdpEntry, asdp2: &AsdpEntry) -> f64 {
        let dd1 = self.extract_descriptor(asdp1);
        let dd2 = self.extract_descriptor(asdp2);

        match self.kernel.as_str() {
            "gaussian" => {
                let sigma = self.params.get("sigma").copied().unwrap_or(1.0);
                gaussian(sigma, &dd1, &dd2)
            }
            other => {
                warn!("unknown similarity kernel '{}'", other);
                0.0
            }
        }
    }
}

/// Squared Euclidean distance, truncated to the shorter vector.
fn sq_euclidean(dd1: &[f64], dd2: &[f64]) -> f64 {
    dd1.iter()
        .zip(dd2.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
}

fn gaussian(sigma: f64, dd1: &[f64], dd2: &[f64]) -> f64 {
    (-(sq_euclidean(dd1, dd2) / (sigma * sigma))).exp()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
