//! Greedy selection within a single priority bin.
//!
//! Each step appends the remaining candidate with the highest rate of
//! utility gain (candidate cumulative utility over candidate cumulative
//! size), where a candidate's utility is its similarity-discounted science
//! utility plus the rule adjustment for the whole candidate queue, and
//! candidates violating any constraint are rejected for that step.

use tracing::debug;
use triage_core::{fields, AsdpList, MetadataValue};
use triage_rules::RuleSet;
use triage_similarity::Similarity;

/// Order one bin's candidate pool; returns the selected ids in queue order.
pub(crate) fn prioritize_bin(
    bin: i64,
    mut pool: AsdpList,
    ruleset: &RuleSet,
    similarity: &mut Similarity,
) -> Vec<i64> {
    let mut queue: AsdpList = Vec::new();
    let mut cumulative_size: i64 = 0;
    let mut cumulative_sue: f64 = 0.0;

    let rounds = pool.len();
    for _ in 0..rounds {
        let mut best: Option<(usize, f64)> = None;

        for index in 0..pool.len() {
            // Discount is computed against the queue before the candidate
            // is added.
            let discount = similarity.discount_factor(bin, &queue, &pool[index]);
            let sue = pool[index]
                .get(fields::SCIENCE_UTILITY_ESTIMATE)
                .map(|v| v.as_float())
                .unwrap_or(0.0);
            let final_sue = discount * sue;
            pool[index].insert(
                fields::FINAL_SCIENCE_UTILITY_ESTIMATE.to_string(),
                MetadataValue::Float(final_sue),
            );

            let candidate_utility = cumulative_sue + final_sue;
            let candidate_size = cumulative_size
                + pool[index]
                    .get(fields::SIZE)
                    .map(|v| v.as_int())
                    .unwrap_or(0);

            let mut candidate_queue = queue.clone();
            candidate_queue.push(pool[index].clone());

            let (satisfied, adjustment) = ruleset.apply(bin, &candidate_queue);
            if !satisfied {
                continue;
            }

            // Zero-size candidates score as if they were one byte.
            let score = (candidate_utility + adjustment) / candidate_size.max(1) as f64;

            // Ties go to the first-encountered candidate.
            if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
                best = Some((index, score));
            }
        }

        // No admissible successor remains.
        let Some((best_index, _)) = best else {
            break;
        };

        let chosen = pool.remove(best_index);
        cumulative_size += chosen.get(fields::SIZE).map(|v| v.as_int()).unwrap_or(0);
        cumulative_sue += chosen
            .get(fields::FINAL_SCIENCE_UTILITY_ESTIMATE)
            .map(|v| v.as_float())
            .unwrap_or(0.0);
        queue.push(chosen);
    }

    debug!("bin {}: selected {} of {} candidates", bin, queue.len(), rounds);

    queue
        .iter()
        .map(|asdp| asdp.get(fields::ID).map(|v| v.as_int()).unwrap_or(0))
        .collect()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
