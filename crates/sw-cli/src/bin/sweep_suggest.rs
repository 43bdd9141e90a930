use anyhow::{Context, Result};
use clap::Parser;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use sw_optimizer::{strategy_for, GridSearchOptions};
use sw_types::{Method, SweepConfig, SweepRun};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sweep-suggest")]
#[command(about = "Suggest the next runs of a grid sweep")]
#[command(version)]
struct Cli {
    /// Sweep description (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Runs already suggested or evaluated (JSON array); empty when omitted
    #[arg(short, long)]
    runs: Option<PathBuf>,

    /// Number of runs to suggest
    #[arg(short = 'n', long, default_value = "1")]
    count: usize,

    /// Shuffle the unexplored grid points
    #[arg(long)]
    randomize: bool,

    /// Seed for the shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Check the sweep description against the schema first
    #[arg(long)]
    validate: bool,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn options(&self) -> GridSearchOptions {
        GridSearchOptions {
            validate: self.validate,
            count: self.count,
            randomize_order: self.randomize,
        }
    }

    fn rng(&self) -> Box<dyn RngCore> {
        match self.seed {
            Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
            None => Box::new(rand::rng()),
        }
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Suggest `count` runs, with `None` standing for an exhausted grid.
fn suggest(
    config: &SweepConfig,
    runs: &[SweepRun],
    options: &GridSearchOptions,
    rng: &mut dyn RngCore,
) -> Result<Vec<Option<SweepRun>>> {
    let method = config.method().unwrap_or(Method::Grid);
    let strategy = strategy_for(method, options)
        .with_context(|| format!("no search strategy for method {}", method.as_str()))?;
    info!(
        "Suggesting {} runs with {} search from {} observed runs",
        options.count,
        strategy.name(),
        runs.len()
    );

    let suggestions = strategy.next_runs(runs, config, options.count, rng)?;
    Ok(suggestions.into_iter().map(Option::from).collect())
}

fn render(output: &[Option<SweepRun>], pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    Ok(rendered)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("SWEEP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = SweepConfig::from_value(read_json(&cli.config)?)?;
    let runs: Vec<SweepRun> = match &cli.runs {
        Some(path) => serde_json::from_value(read_json(path)?)
            .with_context(|| format!("{} is not a list of runs", path.display()))?,
        None => Vec::new(),
    };

    let mut rng = cli.rng();
    let output = suggest(&config, &runs, &cli.options(), rng.as_mut())?;
    println!("{}", render(&output, cli.pretty)?);
    Ok(())
}
