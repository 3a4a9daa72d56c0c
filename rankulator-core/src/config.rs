/// Batch schedule configuration and the built-in presets.
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};
use crate::sampling::Phase;

/// How many items each batch shows and how many batches each phase runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchConfig {
    pub batch_size: usize,
    pub exploration_batches: usize,
    pub mixed_batches: usize,
    pub refinement_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Preset::Normal.config()
    }
}

impl BatchConfig {
    pub fn total_batches(&self) -> usize {
        self.exploration_batches + self.mixed_batches + self.refinement_batches
    }

    /// Reject configurations the scheduler cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EngineError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.total_batches() == 0 {
            return Err(EngineError::InvalidConfig(
                "total number of batches must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Phase governing the batch at `batch_index` (0-based count of batches
    /// already submitted).
    pub fn phase(&self, batch_index: usize) -> Phase {
        let mixed_end = self.exploration_batches + self.mixed_batches;
        if batch_index < self.exploration_batches {
            Phase::Exploration
        } else if batch_index < mixed_end {
            Phase::Mixed
        } else if batch_index < mixed_end + self.refinement_batches {
            Phase::Refinement
        } else {
            Phase::Complete
        }
    }

    /// Batch indices at which the mixed and refinement phases begin.
    pub fn phase_boundaries(&self) -> (usize, usize) {
        let mixed_start = self.exploration_batches;
        (mixed_start, mixed_start + self.mixed_batches)
    }
}

/// Named schedules, from a quick pass to an exhaustive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Preset {
    Quick,
    #[default]
    Normal,
    Extensive,
    Psycho,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Quick, Preset::Normal, Preset::Extensive, Preset::Psycho];

    pub fn config(self) -> BatchConfig {
        let (batch_size, exploration_batches, mixed_batches, refinement_batches) = match self {
            Preset::Quick => (6, 3, 2, 3),
            Preset::Normal => (6, 5, 5, 5),
            Preset::Extensive => (6, 8, 8, 8),
            Preset::Psycho => (20, 20, 20, 20),
        };
        BatchConfig {
            batch_size,
            exploration_batches,
            mixed_batches,
            refinement_batches,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Quick => "quick",
            Preset::Normal => "normal",
            Preset::Extensive => "extensive",
            Preset::Psycho => "psycho",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                EngineError::InvalidConfig(format!(
                    "unknown preset \"{s}\" (expected quick, normal, extensive or psycho)"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(e: usize, m: usize, r: usize) -> BatchConfig {
        BatchConfig {
            batch_size: 4,
            exploration_batches: e,
            mixed_batches: m,
            refinement_batches: r,
        }
    }

    #[test]
    fn test_phase_progression() {
        let cfg = config(2, 3, 1);
        let phases: Vec<Phase> = (0..7).map(|i| cfg.phase(i)).collect();
        assert_eq!(
            phases,
            vec![
                Phase::Exploration,
                Phase::Exploration,
                Phase::Mixed,
                Phase::Mixed,
                Phase::Mixed,
                Phase::Refinement,
                Phase::Complete,
            ]
        );
    }

    #[test]
    fn test_empty_phases_are_skipped() {
        let cfg = config(0, 0, 2);
        assert_eq!(cfg.phase(0), Phase::Refinement);
        assert_eq!(cfg.phase(2), Phase::Complete);
    }

    #[test]
    fn test_validate() {
        assert!(config(1, 0, 0).validate().is_ok());
        assert!(matches!(config(0, 0, 0).validate(), Err(EngineError::InvalidConfig(_))));

        let zero_size = BatchConfig { batch_size: 0, ..config(1, 1, 1) };
        assert!(matches!(zero_size.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_presets() {
        assert_eq!(Preset::Quick.config().total_batches(), 8);
        assert_eq!(Preset::Normal.config().total_batches(), 15);
        assert_eq!(Preset::Psycho.config().batch_size, 20);
        assert_eq!(BatchConfig::default(), Preset::Normal.config());
        for preset in Preset::ALL {
            assert!(preset.config().validate().is_ok());
        }
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("Extensive".parse::<Preset>().unwrap(), Preset::Extensive);
        assert_eq!(" quick ".parse::<Preset>().unwrap(), Preset::Quick);
        assert!("ludicrous".parse::<Preset>().is_err());
    }
}
