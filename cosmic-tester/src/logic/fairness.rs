//! Distribution check for first-round picks across many seeds.

use cosmic_game::numbers::usize_to_f64;
use cosmic_game::pick_next;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::scenarios::build_pool;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FairnessConfig {
    pub simulations: usize,
    pub pool_size: usize,
    /// Allowed relative deviation of each count from the expected count.
    pub tolerance: f64,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            simulations: 10_000,
            pool_size: 3,
            tolerance: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessAnalysis {
    pub simulations: usize,
    pub pool_size: usize,
    pub tolerance: f64,
    pub distribution: BTreeMap<String, usize>,
    pub expected: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub coefficient_of_variation: f64,
    /// `1 - cv`; 1.0 is a perfectly even spread.
    pub fairness_score: f64,
    pub max_deviation: f64,
    pub within_tolerance: bool,
}

/// Pick round 0 for seeds `sim-0 .. sim-(simulations-1)` and measure how
/// evenly the pool is covered.
#[must_use]
pub fn run_fairness_analysis(cfg: &FairnessConfig) -> FairnessAnalysis {
    let pool = build_pool(cfg.pool_size);
    let mut distribution: BTreeMap<String, usize> =
        pool.iter().map(|a| (a.id.clone(), 0)).collect();

    for i in 0..cfg.simulations {
        let seed = format!("sim-{i}");
        if let Some(pick) = pick_next(&seed, &pool, &[], 0) {
            *distribution.entry(pick.activity_id).or_insert(0) += 1;
        }
    }

    let buckets = usize_to_f64(distribution.len().max(1));
    let expected = usize_to_f64(cfg.simulations) / buckets;
    let variance = distribution
        .values()
        .map(|&count| (usize_to_f64(count) - expected).powi(2))
        .sum::<f64>()
        / buckets;
    let std_dev = variance.sqrt();
    let coefficient_of_variation = if expected > 0.0 { std_dev / expected } else { 0.0 };
    let max_deviation = if expected > 0.0 {
        distribution
            .values()
            .map(|&count| (usize_to_f64(count) - expected).abs() / expected)
            .fold(0.0, f64::max)
    } else {
        0.0
    };

    log::info!(
        "fairness over {} simulations: cv {coefficient_of_variation:.4}, max deviation {max_deviation:.4}",
        cfg.simulations
    );

    FairnessAnalysis {
        simulations: cfg.simulations,
        pool_size: cfg.pool_size,
        tolerance: cfg.tolerance,
        distribution,
        expected,
        variance,
        std_dev,
        coefficient_of_variation,
        fairness_score: 1.0 - coefficient_of_variation,
        max_deviation,
        within_tolerance: max_deviation <= cfg.tolerance,
    }
}
