mod catalog;
mod config;
mod interactive;
mod output;
mod simulate;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rankulator_core::{validate_bands, Preset, RankingSession, TierBand};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::info;

use crate::catalog::CatalogFilter;
use crate::config::BatchOverrides;
use crate::interactive::Outcome;
use crate::output::ReportOptions;
use crate::simulate::SimulationOptions;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "rankulator", version, about = "Rank items by picking favorites from small batches")]
struct Cli {
    /// Log engine decisions to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run an interactive ranking session
    Rank(RankArgs),
    /// Measure how well a schedule recovers a hidden order
    Simulate(SimulateArgs),
    /// Create a default config file at ~/.config/rankulator/config.toml
    Init {
        /// Write somewhere other than the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the built-in schedule presets
    Presets,
}

/// Schedule flags shared by `rank` and `simulate`.
#[derive(clap::Args)]
struct ScheduleArgs {
    /// Named schedule: quick, normal, extensive or psycho
    #[arg(long)]
    preset: Option<Preset>,

    /// Items shown per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Batches in the exploration phase
    #[arg(long)]
    exploration: Option<usize>,

    /// Batches in the mixed phase
    #[arg(long)]
    mixed: Option<usize>,

    /// Batches in the refinement phase
    #[arg(long)]
    refinement: Option<usize>,

    /// RNG seed for reproducible batches
    #[arg(long)]
    seed: Option<u64>,

    /// Path to config file (default: ~/.config/rankulator/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ScheduleArgs {
    fn overrides(&self) -> BatchOverrides {
        BatchOverrides {
            batch_size: self.batch_size,
            exploration_batches: self.exploration,
            mixed_batches: self.mixed,
            refinement_batches: self.refinement,
        }
    }
}

#[derive(clap::Args)]
struct RankArgs {
    /// Catalog file: JSON array of items or names, or one name per line
    #[arg(long)]
    items: Option<PathBuf>,

    /// Inline item (repeatable)
    #[arg(long = "item")]
    inline_items: Vec<String>,

    /// Only rank catalog items with this position
    #[arg(long)]
    position: Option<String>,

    /// Keep only the N most prominent catalog items (default per position: QB 16, RB 20, WR 30, TE 12)
    #[arg(long)]
    limit: Option<usize>,

    /// Keep catalog entries marked inactive
    #[arg(long)]
    include_inactive: bool,

    #[command(flatten)]
    schedule: ScheduleArgs,

    /// Output JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Write results as CSV to this path
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print a plain-text summary for sharing
    #[arg(long)]
    share: bool,

    /// Title used in shared and JSON output
    #[arg(long, default_value = "Custom")]
    title: String,
}

#[derive(clap::Args)]
struct SimulateArgs {
    /// Synthetic pool size
    #[arg(long, default_value_t = 30)]
    items: usize,

    /// Independent sessions to run
    #[arg(long, default_value_t = 20)]
    trials: usize,

    /// Perception noise as a fraction of the strength spread
    #[arg(long, default_value_t = 0.5)]
    noise: f64,

    #[command(flatten)]
    schedule: ScheduleArgs,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "rankulator=debug,rankulator_core=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Everything a session needs from config file and flags combined.
struct Resolved {
    batch: rankulator_core::BatchConfig,
    bands: Vec<TierBand>,
    seed: u64,
}

fn resolve(args: &ScheduleArgs) -> Resolved {
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let batch = config::resolve_batch_config(&cfg, args.preset, args.overrides())
        .unwrap_or_else(|e| bail(e));

    let bands = cfg.tiers.clone().unwrap_or_else(TierBand::default_bands);
    validate_bands(&bands)
        .unwrap_or_else(|e| bail(format!("{e} (in {})", config_path.display())));

    let seed = args.seed.or(cfg.seed).unwrap_or_else(|| rand::rng().random());
    info!(seed, "Using RNG seed");

    Resolved { batch, bands, seed }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Rank(args) => run_rank(args),
        Commands::Simulate(args) => run_simulate(args),
        Commands::Init { config } => {
            let path = config.unwrap_or_else(config::config_path);
            config::create_default_config(&path);
            println!("Created config at {}", path.display());
            println!("Edit it to set your default preset, seed or tier bands.");
        }
        Commands::Presets => {
            for preset in Preset::ALL {
                let c = preset.config();
                println!(
                    "{:<10} batch size {:>2} | {:>2} exploration, {:>2} mixed, {:>2} refinement ({} batches)",
                    preset.name(),
                    c.batch_size,
                    c.exploration_batches,
                    c.mixed_batches,
                    c.refinement_batches,
                    c.total_batches(),
                );
            }
        }
    }
}

fn run_rank(args: RankArgs) {
    // Stdin carries the picks, so items must come from flags.
    if args.items.is_none() && args.inline_items.is_empty() {
        bail("No items provided. Use --items <file> or --item <name>.");
    }
    if !io::stdin().is_terminal() {
        info!("stdin is not a terminal; reading picks from piped input");
    }

    let filter = CatalogFilter {
        position: args.position.clone(),
        limit: args.limit,
        active_only: !args.include_inactive,
    };
    let items = catalog::load_items(args.items.as_deref(), &args.inline_items, &filter)
        .unwrap_or_else(|e| bail(e));

    let resolved = resolve(&args.schedule);
    let item_count = items.len();
    let mut session = RankingSession::new(items, resolved.batch, StdRng::seed_from_u64(resolved.seed))
        .unwrap_or_else(|e| bail(e));

    eprintln!(
        "Ranking {} items over {} batches of up to {} (seed {})",
        item_count,
        session.total_batches(),
        session.config().batch_size,
        resolved.seed,
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut prompt_out = io::stderr();
    let outcome = interactive::run_session(&mut session, &mut input, &mut prompt_out)
        .unwrap_or_else(|e| bail(format!("Session failed: {e}")));

    if outcome == Outcome::Aborted {
        bail(format!(
            "Session ended after {} of {} batches; no results written",
            session.batch_index(),
            session.total_batches(),
        ));
    }

    let results = session.results(&resolved.bands).unwrap_or_else(|e| bail(e));
    let total_batches = session.total_batches();
    let pool = session.into_pool();

    let report_options = ReportOptions {
        json: args.json,
        share: args.share,
        title: args.title.clone(),
        seed: resolved.seed,
    };
    let report = output::render_report(&results, &pool, total_batches, &report_options)
        .unwrap_or_else(|e| bail(format!("Failed to serialize results: {e}")));
    print!("{}", report.stdout);
    eprint!("{}", report.stderr);

    if let Some(path) = &args.csv {
        std::fs::write(path, output::csv_content(&results, &pool))
            .unwrap_or_else(|e| bail(format!("Failed to write CSV to {}: {e}", path.display())));
        eprintln!("Wrote CSV to {}", path.display());
    }
}

fn run_simulate(args: SimulateArgs) {
    if args.items == 0 || args.trials == 0 {
        bail("--items and --trials must both be at least 1");
    }
    if !(args.noise.is_finite() && args.noise >= 0.0) {
        bail("--noise must be a non-negative number");
    }

    let resolved = resolve(&args.schedule);
    let options = SimulationOptions {
        items: args.items,
        trials: args.trials,
        noise: args.noise,
        config: resolved.batch,
        seed: resolved.seed,
    };

    let report = simulate::run_simulation(&options, &resolved.bands).unwrap_or_else(|e| bail(e));
    simulate::print_report(&report, &options);
}
