/// Score accumulation: turns "pick some, skip the rest" into pairwise credit.
///
/// Treats a batch as a round-robin where every selected item beats every
/// unselected item once (+1 to the winner, -1 to the loser) and items with the
/// same selection state never meet. Deltas are integers and always sum to zero.
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::types::{Batch, Pool, ScoreDelta, Selection};

/// Delta for one batch member given how many of the batch were selected.
pub fn score_delta(is_selected: bool, selected_count: usize, batch_len: usize) -> i64 {
    let not_selected_count = batch_len.saturating_sub(selected_count);
    if is_selected {
        not_selected_count as i64
    } else {
        -(selected_count as i64)
    }
}

/// Apply one batch outcome to `pool`.
///
/// Only members of `batch` change. The whole submission is validated before
/// any score is touched, so a rejected selection leaves the pool as it was.
/// Returns one `ScoreDelta` per batch member, in batch order.
pub fn apply_batch(pool: &mut Pool, batch: &Batch, selection: &Selection) -> Result<Vec<ScoreDelta>> {
    for id in selection.iter() {
        if !batch.contains(id) {
            return Err(EngineError::SelectionOutsideBatch(id.to_string()));
        }
    }

    let indices = batch
        .item_ids
        .iter()
        .map(|id| pool.index_of(id))
        .collect::<Result<Vec<usize>>>()?;

    let selected_count = selection.len();
    let batch_len = batch.len();

    let mut deltas = Vec::with_capacity(batch_len);
    for (id, idx) in batch.item_ids.iter().zip(indices) {
        let delta = score_delta(selection.contains(id), selected_count, batch_len);
        pool.add_score(idx, delta);
        deltas.push(ScoreDelta {
            id: id.clone(),
            delta,
            score: pool.item(idx).score,
        });
    }
    pool.bump_version();

    debug!(
        batch = batch.number,
        selected = selected_count,
        size = batch_len,
        version = pool.version(),
        "Applied batch outcome"
    );

    Ok(deltas)
}
