use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::constants::INITIAL_SCORE;
use crate::error::{EngineError, Result};
use crate::sampling::{Phase, Sampling};

/// A ranked entity.
///
/// Everything except `score` is identity or display data that the engine
/// never reads. `score` is only changed by the score accumulator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    pub id: String,
    pub name: String,
    /// Category the item belongs to (e.g. a player position).
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: Option<String>,
    /// Free-form descriptive fields (team, college, age...).
    #[cfg_attr(feature = "serde", serde(default))]
    pub metadata: BTreeMap<String, String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub score: i64,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Item {
            id: id.into(),
            name: name.into(),
            position: None,
            metadata: BTreeMap::new(),
            score: INITIAL_SCORE,
        }
    }

    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }
}

/// The fixed set of items being ranked in one session.
///
/// Membership never changes after construction. Items keep their insertion
/// order, which is also the tie-break order wherever the engine sorts.
/// `version` increases by one every time a batch outcome is applied.
#[derive(Debug, Clone)]
pub struct Pool {
    items: Vec<Item>,
    id_to_idx: HashMap<String, usize>,
    version: u64,
}

impl Pool {
    pub fn new(items: Vec<Item>) -> Result<Self> {
        let mut id_to_idx = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if id_to_idx.insert(item.id.clone(), idx).is_some() {
                return Err(EngineError::DuplicateItemId(item.id.clone()));
            }
        }
        Ok(Pool {
            items,
            id_to_idx,
            version: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.id_to_idx.get(id).map(|&idx| &self.items[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_idx.contains_key(id)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Current scores, in pool order.
    pub fn scores(&self) -> Vec<i64> {
        self.items.iter().map(|item| item.score).collect()
    }

    /// Set every score back to the initial value.
    pub fn reset_scores(&mut self) {
        for item in &mut self.items {
            item.score = INITIAL_SCORE;
        }
        self.version += 1;
    }

    pub(crate) fn index_of(&self, id: &str) -> Result<usize> {
        self.id_to_idx
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::UnknownItemId(id.to_string()))
    }

    pub(crate) fn item(&self, idx: usize) -> &Item {
        &self.items[idx]
    }

    pub(crate) fn add_score(&mut self, idx: usize, delta: i64) {
        self.items[idx].score += delta;
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

/// One group of distinct items presented together, in display order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Batch {
    /// 0-based index of this batch within the session.
    pub number: usize,
    pub phase: Phase,
    /// How the members were drawn.
    pub sampling: Sampling,
    pub item_ids: Vec<String>,
}

impl Batch {
    pub fn new(number: usize, phase: Phase, sampling: Sampling, item_ids: Vec<String>) -> Self {
        Batch {
            number,
            phase,
            sampling,
            item_ids,
        }
    }

    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.item_ids.iter().any(|b| b == id)
    }
}

/// Ids the user picked from the live batch. Empty means "skip".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    /// An empty selection (explicit skip).
    pub fn none() -> Self {
        Selection::default()
    }

    /// Select every member of `batch`.
    pub fn all(batch: &Batch) -> Self {
        Selection::from_ids(batch.item_ids.iter().cloned())
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Score change applied to one batch member.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreDelta {
    pub id: String,
    pub delta: i64,
    /// Score after the delta was applied.
    pub score: i64,
}

/// A z-score band. Bands are ordered from highest `min_z` to lowest and
/// together cover the whole real line.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierBand {
    pub label: String,
    /// Inclusive lower bound.
    pub min_z: f64,
    /// Exclusive upper bound.
    pub max_z: f64,
    /// Target maximum population, enforced by overflowing into the next band.
    pub soft_cap: usize,
}

impl TierBand {
    pub fn new(label: impl Into<String>, min_z: f64, max_z: f64, soft_cap: usize) -> Self {
        TierBand {
            label: label.into(),
            min_z,
            max_z,
            soft_cap,
        }
    }

    pub fn contains(&self, z: f64) -> bool {
        z >= self.min_z && z < self.max_z
    }

    /// Five bands: Elite, then Tiers 1-4.
    pub fn default_bands() -> Vec<TierBand> {
        vec![
            TierBand::new("Elite", 1.0, f64::INFINITY, 4),
            TierBand::new("Tier 1", 0.3, 1.0, 8),
            TierBand::new("Tier 2", -0.3, 0.3, 10),
            TierBand::new("Tier 3", -1.0, -0.3, 10),
            TierBand::new("Tier 4", f64::NEG_INFINITY, -1.0, 12),
        ]
    }
}

/// Final placement of one item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedResult {
    /// 1-based overall position in the output order.
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub score: i64,
    pub z_score: f64,
    /// 1-based band number; 1 is the highest band.
    pub tier: usize,
    pub tier_label: String,
}
