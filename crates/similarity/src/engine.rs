//! The similarity engine: per-bin mixing coefficients, function lookup, and
//! the memoized pairwise similarity cache.

use std::collections::{BTreeMap, HashMap};

use triage_core::{fields, AsdpEntry, AsdpList};

use crate::function::SimilarityFunction;

/// Similarity functions are keyed by (instrument name, ASDP type).
pub type FunctionKey = (String, String);

/// Mapping from (instrument, type) to the configured similarity function.
pub type FunctionMap = BTreeMap<FunctionKey, SimilarityFunction>;

/// Similarity configuration plus the per-invocation memo cache.
///
/// The cache is keyed by the unordered pair of ASDP ids, so lookups commute
/// in argument order. It is never evicted; its lifetime is the lifetime of
/// this value.
#[derive(Debug, Clone)]
pub struct Similarity {
    alphas: BTreeMap<i64, f64>,
    default_alpha: f64,
    functions: BTreeMap<i64, FunctionMap>,
    default_functions: FunctionMap,
    cache: HashMap<(i64, i64), f64>,
}

impl Default for Similarity {
    /// No per-bin entries, no functions, α = 1.0.
    fn default() -> Similarity {
        Similarity::new(BTreeMap::new(), 1.0, BTreeMap::new(), FunctionMap::new())
    }
}

impl Similarity {
    pub fn new(
        alphas: BTreeMap<i64, f64>,
        default_alpha: f64,
        functions: BTreeMap<i64, FunctionMap>,
        default_functions: FunctionMap,
    ) -> Similarity {
        Similarity {
            alphas,
            default_alpha,
            functions,
            default_functions,
            cache: HashMap::new(),
        }
    }

    /// Mixing coefficient for a bin; the default α (initially 1.0) unless
    /// configured otherwise.
    pub fn alpha(&self, bin: i64) -> f64 {
        self.alphas.get(&bin).copied().unwrap_or(self.default_alpha)
    }

    fn functions_for(&self, bin: i64) -> &FunctionMap {
        self.functions.get(&bin).unwrap_or(&self.default_functions)
    }

    fn cached_similarity(
        cache: &mut HashMap<(i64, i64), f64>,
        function: &SimilarityFunction,
        asdp1: &AsdpEntry,
        asdp2: &AsdpEntry,
    ) -> f64 {
        let id1 = asdp1.get(fields::ID).map(|v| v.as_int()).unwrap_or(0);
        let id2 = asdp2.get(fields::ID).map(|v| v.as_int()).unwrap_or(0);
        let key = if id1 < id2 { (id1, id2) } else { (id2, id1) };

        match cache.get(&key) {
            Some(similarity) => *similarity,
            None => {
                let similarity = function.similarity(asdp1, asdp2);
                cache.insert(key, similarity);
                similarity
            }
        }
    }

    /// Maximum similarity between a candidate and the queued ASDPs sharing
    /// its (instrument, type). Returns 0.0 for an empty queue or when no
    /// similarity function applies.
    pub fn max_similarity(&mut self, bin: i64, queue: &AsdpList, asdp: &AsdpEntry) -> f64 {
        if queue.is_empty() {
            return 0.0;
        }

        let key: FunctionKey = (
            asdp.get(fields::INSTRUMENT_NAME)
                .map(|v| v.as_text().to_string())
                .unwrap_or_default(),
            asdp.get(fields::TYPE)
                .map(|v| v.as_text().to_string())
                .unwrap_or_default(),
        );

        let Some(function) = self.functions_for(bin).get(&key) else {
            return 0.0;
        };
        // Clone so the cache can be borrowed mutably alongside the function.
        let function = function.clone();

        let mut max_similarity = 0.0;
        for queued in queue {
            let queued_key = (
                queued
                    .get(fields::INSTRUMENT_NAME)
                    .map(|v| v.as_text().to_string())
                    .unwrap_or_default(),
                queued
                    .get(fields::TYPE)
                    .map(|v| v.as_text().to_string())
                    .unwrap_or_default(),
            );
            if queued_key != key {
                continue;
            }
            let similarity = Self::cached_similarity(&mut self.cache, &function, asdp, queued);
            if similarity > max_similarity {
                max_similarity = similarity;
            }
        }

        max_similarity
    }

    /// Diversity discount `(1 − α) + α · (1 − max_similarity)` for the
    /// candidate against the current queue.
    pub fn discount_factor(&mut self, bin: i64, queue: &AsdpList, asdp: &AsdpEntry) -> f64 {
        let max_similarity = self.max_similarity(bin, queue, asdp);
        let alpha = self.alpha(bin);
        (1.0 - alpha) + alpha * (1.0 - max_similarity)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
