/// Tiering: final scores -> z-scores -> tier bands.
///
/// Three passes over the items sorted by z-score descending:
///   1. Threshold: each item goes to the first band whose `[min_z, max_z)` holds it.
///   2. Soft caps: from the highest band down, the lowest-z excess of an
///      over-full band overflows into the band below. The lowest band absorbs
///      whatever reaches it.
///   3. Fuzzy boundaries: an item sitting just above its band's lower threshold
///      that trails its local neighborhood mean is nudged one band down.
///
/// Pure function of the score vector; repeated calls give identical output.
use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::constants::{FUZZY_NEIGHBORHOOD_RADIUS, FUZZY_THRESHOLD};
use crate::error::{EngineError, Result};
use crate::statistics::compute_z_scores;
use crate::types::{Pool, RankedResult, TierBand};

/// Tunables for the boundary smoothing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TieringOptions {
    /// Proximity to a lower threshold that triggers reconsideration, and the
    /// margin below the local mean needed for a nudge. `None` disables the pass.
    pub fuzzy_threshold: Option<f64>,
    /// Neighbors on each side averaged for the local mean.
    pub neighborhood_radius: usize,
}

impl Default for TieringOptions {
    fn default() -> Self {
        TieringOptions {
            fuzzy_threshold: Some(FUZZY_THRESHOLD),
            neighborhood_radius: FUZZY_NEIGHBORHOOD_RADIUS,
        }
    }
}

/// Check that bands are non-empty, ordered from highest to lowest, and tile
/// the real line with no gaps or overlaps.
pub fn validate_bands(bands: &[TierBand]) -> Result<()> {
    let invalid = |msg: String| -> Result<()> { Err(EngineError::InvalidTierBands(msg)) };

    let (Some(first), Some(last)) = (bands.first(), bands.last()) else {
        return invalid("at least one band is required".to_string());
    };
    if first.max_z != f64::INFINITY {
        return invalid(format!("highest band \"{}\" must extend to +infinity", first.label));
    }
    if last.min_z != f64::NEG_INFINITY {
        return invalid(format!("lowest band \"{}\" must extend to -infinity", last.label));
    }
    for band in bands {
        if band.min_z.is_nan() || band.max_z.is_nan() || band.min_z >= band.max_z {
            return invalid(format!(
                "band \"{}\" has an empty range [{}, {})",
                band.label, band.min_z, band.max_z
            ));
        }
    }
    for pair in bands.windows(2) {
        if pair[0].min_z != pair[1].max_z {
            return invalid(format!(
                "bands \"{}\" and \"{}\" do not meet ({} vs {})",
                pair[0].label, pair[1].label, pair[0].min_z, pair[1].max_z
            ));
        }
    }
    Ok(())
}

/// Assign every pool item to a tier using the default smoothing options.
///
/// Output is sorted by tier ascending, then z-score descending.
pub fn assign_tiers(pool: &Pool, bands: &[TierBand]) -> Result<Vec<RankedResult>> {
    assign_tiers_with(pool, bands, &TieringOptions::default())
}

pub fn assign_tiers_with(
    pool: &Pool,
    bands: &[TierBand],
    options: &TieringOptions,
) -> Result<Vec<RankedResult>> {
    validate_bands(bands)?;
    if pool.is_empty() {
        return Ok(Vec::new());
    }

    let scores: Vec<f64> = pool.items().iter().map(|item| item.score as f64).collect();
    let stats = compute_z_scores(&scores);
    debug!(
        items = pool.len(),
        mean = stats.mean,
        std_dev = stats.std_dev,
        "Computing tiers"
    );

    // sorted[pos] = pool index, by z-score descending (stable on pool order).
    let mut sorted: Vec<usize> = (0..pool.len()).collect();
    sorted.sort_by(|&a, &b| {
        stats.z_scores[b]
            .partial_cmp(&stats.z_scores[a])
            .unwrap_or(Ordering::Equal)
    });
    let sorted_z: Vec<f64> = sorted.iter().map(|&idx| stats.z_scores[idx]).collect();

    // tiers[pos] = 0-based band index for sorted position `pos`.
    let mut tiers: Vec<usize> = sorted_z.iter().map(|&z| initial_band(bands, z)).collect();
    enforce_soft_caps(&mut tiers, bands);
    if let Some(threshold) = options.fuzzy_threshold {
        smooth_boundaries(&mut tiers, &sorted_z, bands, threshold, options.neighborhood_radius);
    }

    // Stable sort on tier keeps z-descending order within each tier.
    let mut output_order: Vec<usize> = (0..sorted.len()).collect();
    output_order.sort_by_key(|&pos| tiers[pos]);

    let results = output_order
        .into_iter()
        .enumerate()
        .map(|(i, pos)| {
            let item = pool.item(sorted[pos]);
            let band = &bands[tiers[pos]];
            RankedResult {
                rank: i + 1,
                id: item.id.clone(),
                name: item.name.clone(),
                score: item.score,
                z_score: sorted_z[pos],
                tier: tiers[pos] + 1,
                tier_label: band.label.clone(),
            }
        })
        .collect();

    Ok(results)
}

/// First band (highest first) whose range holds `z`; the lowest band otherwise.
fn initial_band(bands: &[TierBand], z: f64) -> usize {
    bands
        .iter()
        .position(|band| band.contains(z))
        .unwrap_or(bands.len() - 1)
}

/// `tiers` is indexed by z-sorted position, so each band's members are listed
/// from highest to lowest z and the excess is always the tail.
pub(crate) fn enforce_soft_caps(tiers: &mut [usize], bands: &[TierBand]) {
    let lowest = bands.len() - 1;
    for (band_idx, band) in bands.iter().enumerate().take(lowest) {
        let members: Vec<usize> = tiers
            .iter()
            .enumerate()
            .filter(|&(_, &tier)| tier == band_idx)
            .map(|(pos, _)| pos)
            .collect();

        if members.len() > band.soft_cap {
            let excess = &members[band.soft_cap..];
            debug!(
                band = %band.label,
                cap = band.soft_cap,
                overflow = excess.len(),
                "Soft cap exceeded, overflowing to next band"
            );
            for &pos in excess {
                tiers[pos] = band_idx + 1;
            }
        }
    }
}

/// At most one nudge per item; neighborhoods are read from z-scores only, so
/// earlier nudges never influence later ones.
pub(crate) fn smooth_boundaries(
    tiers: &mut [usize],
    sorted_z: &[f64],
    bands: &[TierBand],
    threshold: f64,
    radius: usize,
) {
    let lowest = bands.len() - 1;
    let n = sorted_z.len();

    for pos in 0..n {
        let tier = tiers[pos];
        if tier >= lowest {
            continue;
        }
        let z = sorted_z[pos];
        if (z - bands[tier].min_z).abs() > threshold {
            continue;
        }

        let start = pos.saturating_sub(radius);
        let end = (pos + radius + 1).min(n);
        let neighborhood = &sorted_z[start..end];
        let local_mean = neighborhood.iter().sum::<f64>() / neighborhood.len() as f64;

        if local_mean - z > threshold {
            trace!(position = pos, z, local_mean, from = tier, "Fuzzy boundary nudge");
            tiers[pos] = tier + 1;
        }
    }
}

/// One tier's slice of a tiered result list.
#[derive(Debug, Clone, PartialEq)]
pub struct TierGroup<'a> {
    pub tier: usize,
    pub label: &'a str,
    pub results: &'a [RankedResult],
}

/// Split output of `assign_tiers` into consecutive per-tier groups.
pub fn group_by_tier(results: &[RankedResult]) -> Vec<TierGroup<'_>> {
    results
        .chunk_by(|a, b| a.tier == b.tier)
        .map(|chunk| TierGroup {
            tier: chunk[0].tier,
            label: &chunk[0].tier_label,
            results: chunk,
        })
        .collect()
}
