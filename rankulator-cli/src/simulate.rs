/// Simulate command: measures how well a schedule recovers a known order.
///
/// Each trial draws hidden strengths for a synthetic pool, answers every
/// batch with a noisy chooser, and compares the final ranking against the
/// hidden order with Spearman rank correlation.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rankulator_core::{BatchConfig, EngineError, Item, RankingSession, Selection, TierBand};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub items: usize,
    pub trials: usize,
    /// Standard deviation of the perception noise added to each hidden strength.
    pub noise: f64,
    pub config: BatchConfig,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    pub correlation: f64,
    /// Items per tier, highest tier first.
    pub tier_counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub trials: Vec<TrialResult>,
    pub tier_labels: Vec<String>,
}

impl SimulationReport {
    pub fn mean_correlation(&self) -> f64 {
        if self.trials.is_empty() {
            return 0.0;
        }
        self.trials.iter().map(|t| t.correlation).sum::<f64>() / self.trials.len() as f64
    }

    pub fn min_correlation(&self) -> f64 {
        self.trials.iter().map(|t| t.correlation).fold(f64::INFINITY, f64::min)
    }

    pub fn max_correlation(&self) -> f64 {
        self.trials.iter().map(|t| t.correlation).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Average number of items landing in each tier.
    pub fn mean_tier_counts(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.tier_labels.len()];
        for trial in &self.trials {
            for (sum, &count) in sums.iter_mut().zip(&trial.tier_counts) {
                *sum += count as f64;
            }
        }
        let n = self.trials.len().max(1) as f64;
        sums.into_iter().map(|s| s / n).collect()
    }
}

/// Standard normal sample via Box-Muller.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-10);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Pick every item whose perceived strength beats the batch average.
fn noisy_pick<R: Rng + ?Sized>(
    item_ids: &[String],
    strengths: &HashMap<String, f64>,
    noise: f64,
    rng: &mut R,
) -> Selection {
    let perceived: Vec<f64> = item_ids
        .iter()
        .map(|id| strengths.get(id).copied().unwrap_or(0.0) + noise * standard_normal(rng))
        .collect();
    let mean = perceived.iter().sum::<f64>() / perceived.len().max(1) as f64;

    Selection::from_ids(
        item_ids
            .iter()
            .zip(&perceived)
            .filter(|&(_, &p)| p > mean)
            .map(|(id, _)| id.clone()),
    )
}

/// 1-based ranks, ties share the average of the positions they span.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Spearman rank correlation. Returns 0 when either side has no spread.
pub fn spearman(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "spearman: inputs differ in length");
    let n = a.len();
    if n < 2 {
        return 0.0;
    }

    let ra = average_ranks(a);
    let rb = average_ranks(b);
    let mean = (n as f64 + 1.0) / 2.0;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in ra.iter().zip(&rb) {
        cov += (x - mean) * (y - mean);
        var_a += (x - mean).powi(2);
        var_b += (y - mean).powi(2);
    }
    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    cov / (var_a * var_b).sqrt()
}

/// Run one full session against hidden strengths drawn from `seed`.
pub fn run_trial(options: &SimulationOptions, bands: &[TierBand], seed: u64) -> Result<TrialResult, EngineError> {
    let mut rng = SmallRng::seed_from_u64(seed);

    let strengths: HashMap<String, f64> = (0..options.items)
        .map(|i| (format!("sim-{}", i + 1), standard_normal(&mut rng)))
        .collect();
    let items: Vec<Item> = (0..options.items)
        .map(|i| Item::new(format!("sim-{}", i + 1), format!("Item {}", i + 1)))
        .collect();

    let session_rng = SmallRng::seed_from_u64(rng.random());
    let mut session = RankingSession::new(items, options.config, session_rng)?;

    while !session.is_complete() {
        let ids = session.next_batch()?.item_ids.clone();
        let selection = noisy_pick(&ids, &strengths, options.noise, &mut rng);
        session.submit(&selection)?;
    }

    let results = session.results(bands)?;
    let (hidden, scores): (Vec<f64>, Vec<f64>) = results
        .iter()
        .map(|r| (strengths.get(&r.id).copied().unwrap_or(0.0), r.score as f64))
        .unzip();

    let mut tier_counts = vec![0; bands.len()];
    for r in &results {
        tier_counts[r.tier - 1] += 1;
    }

    let correlation = spearman(&hidden, &scores);
    debug!(seed, correlation, "Trial finished");
    Ok(TrialResult { correlation, tier_counts })
}

pub fn run_simulation(options: &SimulationOptions, bands: &[TierBand]) -> Result<SimulationReport, EngineError> {
    info!(
        items = options.items,
        trials = options.trials,
        noise = options.noise,
        total_batches = options.config.total_batches(),
        "Starting simulation"
    );

    let trials = (0..options.trials)
        .map(|t| run_trial(options, bands, options.seed.wrapping_add(t as u64 * 7919)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SimulationReport {
        trials,
        tier_labels: bands.iter().map(|b| b.label.clone()).collect(),
    })
}

pub fn print_report(report: &SimulationReport, options: &SimulationOptions) {
    let config = &options.config;
    println!(
        "Simulated {} trials of {} items ({} batches of {}: {} exploration, {} mixed, {} refinement)",
        report.trials.len(),
        options.items,
        config.total_batches(),
        config.batch_size,
        config.exploration_batches,
        config.mixed_batches,
        config.refinement_batches,
    );
    println!("Perception noise: {:.2}\n", options.noise);

    println!("Spearman correlation with hidden order:");
    println!("  mean {:.3} | min {:.3} | max {:.3}", report.mean_correlation(), report.min_correlation(), report.max_correlation());

    println!("\nAverage tier sizes:");
    for (label, count) in report.tier_labels.iter().zip(report.mean_tier_counts()) {
        println!("  {label:<10} {count:>6.1}");
    }
}
