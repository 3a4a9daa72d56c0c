/// Config file loading and creation for the rankulator CLI.
///
/// Config lives at ~/.config/rankulator/config.toml.
/// All fields are optional; CLI args override config values.
use rankulator_core::{BatchConfig, Preset, TierBand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default, Debug)]
pub struct RankulatorConfig {
    pub preset: Option<String>,
    pub batch_size: Option<usize>,
    pub exploration_batches: Option<usize>,
    pub mixed_batches: Option<usize>,
    pub refinement_batches: Option<usize>,
    pub seed: Option<u64>,
    pub tiers: Option<Vec<TierBand>>,
}

/// Per-field schedule overrides, typically from CLI flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchOverrides {
    pub batch_size: Option<usize>,
    pub exploration_batches: Option<usize>,
    pub mixed_batches: Option<usize>,
    pub refinement_batches: Option<usize>,
}

impl BatchOverrides {
    fn apply(&self, config: &mut BatchConfig) {
        if let Some(v) = self.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = self.exploration_batches {
            config.exploration_batches = v;
        }
        if let Some(v) = self.mixed_batches {
            config.mixed_batches = v;
        }
        if let Some(v) = self.refinement_batches {
            config.refinement_batches = v;
        }
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# rankulator configuration
# All values here can be overridden by CLI flags.

# Named schedule: quick, normal, extensive or psycho
# preset = \"normal\"

# Individual schedule values (ignored when --preset is passed on the command line)
# batch_size = 6
# exploration_batches = 5
# mixed_batches = 5
# refinement_batches = 5

# Fixed RNG seed for reproducible batches
# seed = 42

# Custom tier bands, highest first. Bands must cover the whole z-score range
# with no gaps: the first max_z is inf, the last min_z is -inf, and each
# min_z equals the next band's max_z.
# [[tiers]]
# label = \"Elite\"
# min_z = 1.0
# max_z = inf
# soft_cap = 4
#
# [[tiers]]
# label = \"Everyone else\"
# min_z = -inf
# max_z = 1.0
# soft_cap = 100
";

/// Returns the default config path: ~/.config/rankulator/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("rankulator").join("config.toml")
}

pub fn parse_config(content: &str) -> Result<RankulatorConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> RankulatorConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => RankulatorConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config(path: &Path) {
    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));
}

/// Combine the schedule sources.
///
/// A preset passed on the command line replaces the file's schedule entirely;
/// otherwise the file's preset (or Normal) is refined by the file's individual
/// values. Per-field flag overrides always win.
pub fn resolve_batch_config(
    file: &RankulatorConfig,
    preset_flag: Option<Preset>,
    flags: BatchOverrides,
) -> Result<BatchConfig, rankulator_core::EngineError> {
    let mut config = match preset_flag {
        Some(preset) => preset.config(),
        None => {
            let preset = match &file.preset {
                Some(name) => name.parse::<Preset>()?,
                None => Preset::default(),
            };
            let mut config = preset.config();
            BatchOverrides {
                batch_size: file.batch_size,
                exploration_batches: file.exploration_batches,
                mixed_batches: file.mixed_batches,
                refinement_batches: file.refinement_batches,
            }
            .apply(&mut config);
            config
        }
    };
    flags.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses_to_empty_config() {
        let cfg = parse_config(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(cfg.preset.is_none());
        assert!(cfg.tiers.is_none());
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn test_custom_tiers_with_infinities() {
        let cfg = parse_config(
            r#"
            [[tiers]]
            label = "Top"
            min_z = 0.5
            max_z = inf
            soft_cap = 3

            [[tiers]]
            label = "Rest"
            min_z = -inf
            max_z = 0.5
            soft_cap = 50
            "#,
        )
        .unwrap();
        let tiers = cfg.tiers.unwrap();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].max_z, f64::INFINITY);
        assert_eq!(tiers[1].min_z, f64::NEG_INFINITY);
        assert!(rankulator_core::validate_bands(&tiers).is_ok());
    }

    #[test]
    fn test_resolution_defaults_to_normal() {
        let cfg = RankulatorConfig::default();
        let resolved = resolve_batch_config(&cfg, None, BatchOverrides::default()).unwrap();
        assert_eq!(resolved, Preset::Normal.config());
    }

    #[test]
    fn test_file_values_refine_file_preset() {
        let cfg = parse_config("preset = \"quick\"\nbatch_size = 4\n").unwrap();
        let resolved = resolve_batch_config(&cfg, None, BatchOverrides::default()).unwrap();
        assert_eq!(resolved.batch_size, 4);
        assert_eq!(resolved.total_batches(), Preset::Quick.config().total_batches());
    }

    #[test]
    fn test_preset_flag_replaces_file_schedule() {
        let cfg = parse_config("batch_size = 4\nmixed_batches = 0\n").unwrap();
        let flags = BatchOverrides {
            refinement_batches: Some(1),
            ..BatchOverrides::default()
        };
        let resolved = resolve_batch_config(&cfg, Some(Preset::Extensive), flags).unwrap();
        assert_eq!(resolved.batch_size, 6);
        assert_eq!(resolved.mixed_batches, 8);
        assert_eq!(resolved.refinement_batches, 1);
    }

    #[test]
    fn test_invalid_results_rejected() {
        let cfg = parse_config("preset = \"warp\"").unwrap();
        assert!(resolve_batch_config(&cfg, None, BatchOverrides::default()).is_err());

        let flags = BatchOverrides {
            batch_size: Some(0),
            ..BatchOverrides::default()
        };
        assert!(resolve_batch_config(&RankulatorConfig::default(), None, flags).is_err());
    }
}
