/// Initial score assigned to every item when a session starts.
pub const INITIAL_SCORE: i64 = 0;

/// Probability that a mixed-phase batch ignores scores and is drawn uniformly at random.
///
/// The mixed phase interleaves exploratory noise with targeted comparisons,
/// so roughly one batch in three still samples the whole pool.
pub const MIXED_EXPLORATION_PROBABILITY: f64 = 0.3;

/// Probability that a refinement-phase batch is drawn uniformly at random.
///
/// Refinement leans almost entirely on score windows to resolve close calls.
pub const REFINEMENT_EXPLORATION_PROBABILITY: f64 = 0.1;

/// Distance (in z-score units) from a band's lower threshold within which an
/// item is reconsidered by the fuzzy boundary pass. Also the margin by which it
/// must trail its neighborhood mean before it is nudged down.
pub const FUZZY_THRESHOLD: f64 = 0.1;

/// Number of neighbors on each side (in z-sorted order) averaged by the fuzzy
/// boundary pass.
pub const FUZZY_NEIGHBORHOOD_RADIUS: usize = 2;
