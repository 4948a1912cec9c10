//! FWorld - headless entry point
//!
//! Runs the instinct policy against a generated or loaded world and prints a
//! JSON summary, or writes world and pattern files for later runs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use fworld::core::config::FWorldConfig;
use fworld::core::error::Result;
use fworld::simulation::env::{generate_patterns, FWorld};
use fworld::simulation::output::run_instinct;
use fworld::spatial::grid::WorldGrid;
use fworld::world::generation::generate_world;
use fworld::world::materials::MaterialPalette;
use fworld::world::snapshot;

#[derive(Parser, Debug)]
#[command(name = "fworld")]
#[command(about = "Grid-world environment with an instinctive agent")]
struct Cli {
    /// TOML config file; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the world seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the instinct policy headless and print a summary
    Run {
        /// Decision ticks per run
        #[arg(long, default_value_t = 1000)]
        steps: u64,

        /// Number of runs, each reseeded with seed + run
        #[arg(long, default_value_t = 1)]
        runs: u64,

        /// Output format: json or text
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Generate a world and save it as a snapshot
    GenWorld {
        #[arg(long, default_value = "world.tsv")]
        out: PathBuf,
    },
    /// Generate material and action patterns and save them as JSON
    GenPatterns {
        #[arg(long, default_value = "patterns.json")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => FWorldConfig::load(path)?,
        None => FWorldConfig::new(),
    };
    if let Some(seed) = cli.seed {
        config.world.seed = seed;
    }

    match cli.command {
        Command::Run { steps, runs, format } => {
            let mut world = FWorld::new(config)?;
            for run in 0..runs {
                let summary = run_instinct(&mut world, run, steps);
                match format.as_str() {
                    "text" => println!("{}", summary.summary()),
                    _ => println!("{}", summary.to_json()),
                }
            }
        }
        Command::GenWorld { out } => {
            config.validate()?;
            let palette = MaterialPalette::from_config(&config.world)?;
            let mut rng = ChaCha8Rng::seed_from_u64(config.world.seed);
            let mut grid = WorldGrid::new(config.world.width, config.world.height);
            generate_world(&mut grid, &palette, &config.world, &mut rng);
            snapshot::save_text(&grid, &palette, &out)?;
            tracing::info!("Wrote {}x{} world to {}", grid.width, grid.height, out.display());
        }
        Command::GenPatterns { out } => {
            config.validate()?;
            let palette = MaterialPalette::from_config(&config.world)?;
            let mut rng = ChaCha8Rng::seed_from_u64(config.world.seed);
            let patterns = generate_patterns(&config, &palette, &mut rng);
            patterns.save(&out)?;
            tracing::info!("Wrote {} patterns to {}", patterns.len(), out.display());
        }
    }

    Ok(())
}
