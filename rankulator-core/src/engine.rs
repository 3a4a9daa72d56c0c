/// Ranking session orchestrator.
///
/// Pure computation with no IO and no blocking. The caller presents each batch
/// externally, collects a selection, and feeds it back.
///
/// Items are identified by caller-provided string IDs.
use rand::Rng;
use tracing::{debug, info};

use crate::config::BatchConfig;
use crate::constants::INITIAL_SCORE;
use crate::error::{EngineError, Result};
use crate::sampling::{BatchScheduler, Phase};
use crate::scoring::apply_batch;
use crate::tiering::assign_tiers;
use crate::types::{Batch, Item, Pool, RankedResult, ScoreDelta, Selection, TierBand};

/// Where a session stands in its schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Progress {
    /// Batches submitted so far.
    pub batch_index: usize,
    pub total_batches: usize,
    pub phase: Phase,
    /// Batch index where the mixed phase starts.
    pub mixed_start: usize,
    /// Batch index where the refinement phase starts.
    pub refinement_start: usize,
}

impl Progress {
    /// Completed share of the schedule, 0.0 to 1.0.
    pub fn fraction_complete(&self) -> f64 {
        if self.total_batches == 0 {
            return 1.0;
        }
        (self.batch_index as f64 / self.total_batches as f64).min(1.0)
    }
}

/// One ranking session: a pool, a schedule, and the single live batch.
///
/// The session exclusively owns its pool; concurrent sessions need their own
/// copies of the catalog.
pub struct RankingSession<R: Rng> {
    pool: Pool,
    scheduler: BatchScheduler,
    batch_index: usize,
    live_batch: Option<Batch>,
    rng: R,
}

impl<R: Rng> RankingSession<R> {
    /// Start a session. Scores are reset to the initial value.
    pub fn new(items: Vec<Item>, config: BatchConfig, rng: R) -> Result<Self> {
        let scheduler = BatchScheduler::new(config)?;
        if items.is_empty() {
            return Err(EngineError::EmptyPool);
        }
        let items = items
            .into_iter()
            .map(|item| item.with_score(INITIAL_SCORE))
            .collect();
        let pool = Pool::new(items)?;

        info!(
            items = pool.len(),
            batch_size = config.batch_size,
            total_batches = config.total_batches(),
            "Ranking session started"
        );

        Ok(RankingSession {
            pool,
            scheduler,
            batch_index: 0,
            live_batch: None,
            rng,
        })
    }

    pub fn config(&self) -> &BatchConfig {
        self.scheduler.config()
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn into_pool(self) -> Pool {
        self.pool
    }

    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    pub fn total_batches(&self) -> usize {
        self.config().total_batches()
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase(self.batch_index)
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == Phase::Complete
    }

    pub fn progress(&self) -> Progress {
        let (mixed_start, refinement_start) = self.config().phase_boundaries();
        Progress {
            batch_index: self.batch_index,
            total_batches: self.total_batches(),
            phase: self.phase(),
            mixed_start,
            refinement_start,
        }
    }

    /// The batch awaiting a selection, if any.
    pub fn live_batch(&self) -> Option<&Batch> {
        self.live_batch.as_ref()
    }

    /// Draw a fresh batch for the current phase and make it live.
    ///
    /// Any previously live batch is discarded unsubmitted.
    pub fn next_batch(&mut self) -> Result<&Batch> {
        let batch = self
            .scheduler
            .next_batch(&self.pool, self.batch_index, &mut self.rng)?;
        if self.live_batch.is_some() {
            debug!(batch = self.batch_index, "Replacing unsubmitted batch");
        }
        Ok(&*self.live_batch.insert(batch))
    }

    /// Apply `selection` to the live batch and advance the schedule.
    ///
    /// On error nothing changes: the batch stays live and no score moves.
    pub fn submit(&mut self, selection: &Selection) -> Result<Vec<ScoreDelta>> {
        let batch = self.live_batch.as_ref().ok_or(EngineError::NoLiveBatch)?;
        let deltas = apply_batch(&mut self.pool, batch, selection)?;

        self.live_batch = None;
        self.batch_index += 1;

        if self.is_complete() {
            info!(batches = self.batch_index, "All batches submitted");
        } else if self.phase() != self.scheduler.phase(self.batch_index - 1) {
            info!(phase = self.phase().label(), batch = self.batch_index, "Entering new phase");
        }

        Ok(deltas)
    }

    /// Submit an empty selection.
    pub fn skip(&mut self) -> Result<Vec<ScoreDelta>> {
        self.submit(&Selection::none())
    }

    /// Tier the final scores. Only available once every batch is submitted.
    pub fn results(&self, bands: &[TierBand]) -> Result<Vec<RankedResult>> {
        if !self.is_complete() {
            return Err(EngineError::SessionIncomplete {
                submitted: self.batch_index,
                total: self.total_batches(),
            });
        }
        assign_tiers(&self.pool, bands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn items(n: usize) -> Vec<Item> {
        (0..n).map(|i| Item::new(format!("id{i}"), format!("Item {i}"))).collect()
    }

    fn config(batch_size: usize, e: usize, m: usize, r: usize) -> BatchConfig {
        BatchConfig {
            batch_size,
            exploration_batches: e,
            mixed_batches: m,
            refinement_batches: r,
        }
    }

    fn session(n: usize, cfg: BatchConfig, seed: u64) -> RankingSession<SmallRng> {
        RankingSession::new(items(n), cfg, SmallRng::seed_from_u64(seed)).unwrap()
    }

    /// Always pick the item with the lowest numeric suffix.
    fn pick_lowest_id(batch: &Batch) -> Selection {
        let best = batch
            .item_ids
            .iter()
            .min_by_key(|id| id[2..].parse::<usize>().unwrap())
            .unwrap();
        Selection::from_ids([best.clone()])
    }

    #[test]
    fn test_session_basic_workflow() {
        let mut s = session(8, config(4, 2, 2, 2), 1);
        assert_eq!(s.phase(), Phase::Exploration);

        while !s.is_complete() {
            let batch = s.next_batch().unwrap();
            assert_eq!(batch.len(), 4);
            let selection = pick_lowest_id(batch);
            let deltas = s.submit(&selection).unwrap();
            assert_eq!(deltas.iter().map(|d| d.delta).sum::<i64>(), 0);
        }

        assert_eq!(s.batch_index(), 6);
        assert_eq!(s.pool().scores().iter().sum::<i64>(), 0);
        let results = s.results(&TierBand::default_bands()).unwrap();
        assert_eq!(results.len(), 8);
        let top_score = s.pool().scores().into_iter().max().unwrap();
        assert_eq!(results[0].score, top_score);
    }

    #[test]
    fn test_scores_reset_on_start() {
        let scored = vec![Item::new("a", "A").with_score(40), Item::new("b", "B").with_score(-3)];
        let s = RankingSession::new(scored, config(2, 1, 0, 0), SmallRng::seed_from_u64(0)).unwrap();
        assert_eq!(s.pool().scores(), vec![0, 0]);
    }

    #[test]
    fn test_rejects_invalid_input() {
        let rng = || SmallRng::seed_from_u64(0);
        assert!(matches!(
            RankingSession::new(items(3), config(0, 1, 1, 1), rng()),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            RankingSession::new(items(3), config(3, 0, 0, 0), rng()),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            RankingSession::new(Vec::new(), config(3, 1, 0, 0), rng()),
            Err(EngineError::EmptyPool)
        ));
        let dupes = vec![Item::new("x", "X"), Item::new("x", "X again")];
        assert!(matches!(
            RankingSession::new(dupes, config(2, 1, 0, 0), rng()),
            Err(EngineError::DuplicateItemId(id)) if id == "x"
        ));
    }

    #[test]
    fn test_submit_requires_live_batch() {
        let mut s = session(4, config(2, 1, 0, 0), 2);
        assert_eq!(s.submit(&Selection::none()), Err(EngineError::NoLiveBatch));

        s.next_batch().unwrap();
        s.skip().unwrap();
        assert!(s.live_batch().is_none());
    }

    #[test]
    fn test_scheduling_after_completion_is_an_error() {
        let mut s = session(4, config(2, 1, 0, 0), 3);
        s.next_batch().unwrap();
        s.skip().unwrap();
        assert!(s.is_complete());
        assert_eq!(s.next_batch().unwrap_err(), EngineError::SessionComplete { total: 1 });
    }

    #[test]
    fn test_results_before_completion_is_an_error() {
        let s = session(4, config(2, 1, 1, 0), 4);
        assert_eq!(
            s.results(&TierBand::default_bands()),
            Err(EngineError::SessionIncomplete { submitted: 0, total: 2 })
        );
    }

    #[test]
    fn test_rejected_selection_keeps_batch_live() {
        let mut s = session(6, config(3, 2, 0, 0), 5);
        let batch_ids = s.next_batch().unwrap().item_ids.clone();
        let outsider = (0..6)
            .map(|i| format!("id{i}"))
            .find(|id| !batch_ids.contains(id))
            .unwrap();

        let err = s.submit(&Selection::from_ids([outsider.clone()])).unwrap_err();
        assert_eq!(err, EngineError::SelectionOutsideBatch(outsider));
        assert_eq!(s.batch_index(), 0);
        assert_eq!(s.live_batch().unwrap().item_ids, batch_ids);
        assert_eq!(s.pool().version(), 0);
    }

    #[test]
    fn test_new_batch_replaces_live_batch() {
        let mut s = session(10, config(3, 2, 0, 0), 6);
        s.next_batch().unwrap();
        let second = s.next_batch().unwrap().clone();
        assert_eq!(s.live_batch(), Some(&second));
        assert_eq!(s.batch_index(), 0);
    }

    #[test]
    fn test_progress_tracks_phases() {
        let mut s = session(6, config(2, 1, 2, 1), 7);
        let p = s.progress();
        assert_eq!((p.mixed_start, p.refinement_start, p.total_batches), (1, 3, 4));
        assert_eq!(p.fraction_complete(), 0.0);

        let mut phases = Vec::new();
        while !s.is_complete() {
            phases.push(s.next_batch().unwrap().phase);
            s.skip().unwrap();
        }
        assert_eq!(phases, vec![Phase::Exploration, Phase::Mixed, Phase::Mixed, Phase::Refinement]);
        assert_eq!(s.progress().fraction_complete(), 1.0);
    }

    #[test]
    fn test_batch_equals_pool_when_pool_is_small() {
        let mut s = session(3, config(8, 1, 1, 1), 8);
        while !s.is_complete() {
            let batch = s.next_batch().unwrap();
            assert_eq!(batch.len(), 3);
            s.skip().unwrap();
        }
    }

    #[test]
    fn test_consistent_preference_recovers_order() {
        let n = 12;
        let mut s = session(n, config(4, 10, 15, 15), 99);
        while !s.is_complete() {
            let selection = pick_lowest_id(s.next_batch().unwrap());
            s.submit(&selection).unwrap();
        }
        let pool = s.pool();
        let best = pool.get("id0").unwrap().score;
        let worst = pool.get(&format!("id{}", n - 1)).unwrap().score;
        assert!(best > 0, "favorite should gain score, got {best}");
        assert!(worst <= 0, "least favorite should not gain score, got {worst}");
        assert!(best > worst);
    }
}
