/// rankulator-core: Pure-computation batch ranking engine.
///
/// Pick favorites from small batches → pairwise credit scores → z-score tiers.
/// No IO or persistence here, only the ranking math. Bring your own UI.
///
/// Items are identified by caller-provided string IDs. Every source of
/// randomness is an injected `rand::Rng`, so seeded generators make sessions
/// reproducible.
///
/// # Quick start
///
/// ```rust
/// use rand::rngs::SmallRng;
/// use rand::SeedableRng;
/// use rankulator_core::{BatchConfig, Item, RankingSession, Selection, TierBand};
///
/// let items: Vec<Item> = ["Mahomes", "Allen", "Hurts", "Burrow", "Jackson", "Stroud"]
///     .iter()
///     .enumerate()
///     .map(|(i, name)| Item::new(format!("qb{i}"), *name))
///     .collect();
///
/// let config = BatchConfig {
///     batch_size: 3,
///     exploration_batches: 2,
///     mixed_batches: 2,
///     refinement_batches: 2,
/// };
///
/// let mut session = RankingSession::new(items, config, SmallRng::seed_from_u64(7)).unwrap();
///
/// while !session.is_complete() {
///     let batch = session.next_batch().unwrap();
///     // Present the batch; here we always pick the first item shown.
///     let pick = Selection::from_ids([batch.item_ids[0].clone()]);
///     session.submit(&pick).unwrap();
/// }
///
/// for r in session.results(&TierBand::default_bands()).unwrap() {
///     println!("{:>2}. {} [{}] z={:.2}", r.rank, r.name, r.tier_label, r.z_score);
/// }
/// ```

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod sampling;
pub mod scoring;
pub mod statistics;
pub mod tiering;
pub mod types;

// Re-export primary public API at crate root.
pub use config::{BatchConfig, Preset};
pub use engine::{Progress, RankingSession};
pub use error::{EngineError, Result};
pub use sampling::{
    generate_random_batch, generate_score_based_batch, BatchScheduler, Phase, Sampling,
};
pub use scoring::{apply_batch, score_delta};
pub use statistics::{compute_z_scores, compute_z_scores_i64, ZScores};
pub use tiering::{
    assign_tiers, assign_tiers_with, group_by_tier, validate_bands, TierGroup, TieringOptions,
};
pub use types::{Batch, Item, Pool, RankedResult, ScoreDelta, Selection, TierBand};
