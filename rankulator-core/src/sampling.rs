/// Batch scheduling: which items to show next.
///
/// Public functions accept a `Pool` and return item IDs.
/// Internal functions work on `usize` pool indices.
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};

use crate::config::BatchConfig;
use crate::constants::{MIXED_EXPLORATION_PROBABILITY, REFINEMENT_EXPLORATION_PROBABILITY};
use crate::error::{EngineError, Result};
use crate::types::{Batch, Pool};

/// Session phase, derived from how many batches have been submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Phase {
    Exploration,
    Mixed,
    Refinement,
    Complete,
}

impl Phase {
    /// Chance that a batch in this phase is drawn uniformly at random instead
    /// of from a score window. `None` once the session is complete.
    pub fn exploration_probability(self) -> Option<f64> {
        match self {
            Phase::Exploration => Some(1.0),
            Phase::Mixed => Some(MIXED_EXPLORATION_PROBABILITY),
            Phase::Refinement => Some(REFINEMENT_EXPLORATION_PROBABILITY),
            Phase::Complete => None,
        }
    }

    /// Roll the sampling strategy for one batch. `None` once complete.
    pub fn choose_sampling<R: Rng + ?Sized>(self, rng: &mut R) -> Option<Sampling> {
        let p = self.exploration_probability()?;
        if p >= 1.0 || rng.random::<f64>() < p {
            Some(Sampling::Random)
        } else {
            Some(Sampling::ScoreWindow)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Exploration => "exploration",
            Phase::Mixed => "mixed",
            Phase::Refinement => "refinement",
            Phase::Complete => "complete",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Phase::Exploration => "Building initial rankings",
            Phase::Mixed => "Comparing similar items",
            Phase::Refinement => "Finalizing close rankings",
            Phase::Complete => "Rankings finalized",
        }
    }
}

/// How a batch's members were drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Sampling {
    /// Uniform shuffle of the whole pool.
    Random,
    /// Contiguous window of the score-sorted pool.
    ScoreWindow,
}

/// Produces the next batch for a session.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    config: BatchConfig,
}

impl BatchScheduler {
    pub fn new(config: BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(BatchScheduler { config })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn phase(&self, batch_index: usize) -> Phase {
        self.config.phase(batch_index)
    }

    /// Draw the batch for `batch_index`.
    ///
    /// Errors with `SessionComplete` past the final batch and with `EmptyPool`
    /// when there is nothing to draw from.
    pub fn next_batch<R: Rng + ?Sized>(
        &self,
        pool: &Pool,
        batch_index: usize,
        rng: &mut R,
    ) -> Result<Batch> {
        let phase = self.phase(batch_index);
        if phase == Phase::Complete {
            return Err(EngineError::SessionComplete {
                total: self.config.total_batches(),
            });
        }
        if pool.is_empty() {
            return Err(EngineError::EmptyPool);
        }

        let sampling = phase.choose_sampling(rng).unwrap_or(Sampling::Random);
        let batch_size = self.config.batch_size;
        let indices = match sampling {
            Sampling::Random => random_batch_indexed(pool.len(), batch_size, rng),
            Sampling::ScoreWindow => score_window_batch_indexed(&pool.scores(), batch_size, rng),
        };

        debug!(
            batch = batch_index,
            phase = phase.label(),
            ?sampling,
            size = indices.len(),
            "Scheduled batch"
        );

        Ok(Batch::new(batch_index, phase, sampling, to_ids(pool, &indices)))
    }
}

// ---------------------------------------------------------------------------
// Public sampling functions (work with item IDs)
// ---------------------------------------------------------------------------

/// Shuffle the whole pool and take the first `min(batch_size, |pool|)` items.
pub fn generate_random_batch<R: Rng + ?Sized>(
    pool: &Pool,
    batch_size: usize,
    rng: &mut R,
) -> Result<Vec<String>> {
    check_batch_request(pool, batch_size)?;
    let indices = random_batch_indexed(pool.len(), batch_size, rng);
    Ok(to_ids(pool, &indices))
}

/// Pick a random contiguous window of `batch_size` items from the pool sorted
/// by score descending, then shuffle its display order.
pub fn generate_score_based_batch<R: Rng + ?Sized>(
    pool: &Pool,
    batch_size: usize,
    rng: &mut R,
) -> Result<Vec<String>> {
    check_batch_request(pool, batch_size)?;
    let indices = score_window_batch_indexed(&pool.scores(), batch_size, rng);
    Ok(to_ids(pool, &indices))
}

fn check_batch_request(pool: &Pool, batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(EngineError::InvalidConfig("batch_size must be at least 1".to_string()));
    }
    if pool.is_empty() {
        return Err(EngineError::EmptyPool);
    }
    Ok(())
}

fn to_ids(pool: &Pool, indices: &[usize]) -> Vec<String> {
    indices.iter().map(|&idx| pool.item(idx).id.clone()).collect()
}

// ---------------------------------------------------------------------------
// Internal indexed sampling functions (work with usize indices)
// ---------------------------------------------------------------------------

pub(crate) fn random_batch_indexed<R: Rng + ?Sized>(
    num_items: usize,
    batch_size: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..num_items).collect();
    order.shuffle(rng);
    order.truncate(batch_size.min(num_items));
    order
}

/// Pool indices sorted by score descending. Ties keep pool order.
pub(crate) fn sort_by_score_desc(scores: &[i64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].cmp(&scores[a]));
    order
}

pub(crate) fn score_window_batch_indexed<R: Rng + ?Sized>(
    scores: &[i64],
    batch_size: usize,
    rng: &mut R,
) -> Vec<usize> {
    let sorted = sort_by_score_desc(scores);
    let num_items = sorted.len();

    let mut batch = if num_items <= batch_size {
        sorted.clone()
    } else {
        let start = rng.random_range(0..=num_items - batch_size);
        trace!(start, end = start + batch_size, "Score window");
        sorted[start..(start + batch_size).min(num_items)].to_vec()
    };

    let target = batch_size.min(num_items);
    if batch.len() < target {
        fill_from_pool(&mut batch, &sorted, target, rng);
    }

    batch.shuffle(rng);
    batch
}

/// Top up `batch` to `target` members with random pool items not already in it.
fn fill_from_pool<R: Rng + ?Sized>(
    batch: &mut Vec<usize>,
    pool_order: &[usize],
    target: usize,
    rng: &mut R,
) {
    let mut available: Vec<usize> = pool_order
        .iter()
        .copied()
        .filter(|idx| !batch.contains(idx))
        .collect();
    available.shuffle(rng);
    let missing = target.saturating_sub(batch.len());
    batch.extend(available.into_iter().take(missing));
}
