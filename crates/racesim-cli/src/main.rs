//! racesim - race DPS comparisons with SimulationCraft
//!
//! ## Commands
//!
//! - `run`: simulate every selected spec and write one result file per fight style
//! - `plan`: print the batches a run would submit, without simulating
//! - `example-config`: print an example settings file

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use racesim_core::telemetry::{init_tracing, level_for};
use racesim_core::{Catalog, FightStyle, RaceSimulation, ReportWriter, SimSettings};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = "racesim.toml";

#[derive(Parser)]
#[command(name = "racesim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compare race DPS for every class and spec with SimulationCraft", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run race simulations and write result documents
    Run(RunArgs),

    /// Show the batches a run would execute
    Plan(RunArgs),

    /// Print an example settings file
    ExampleConfig,
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Settings file (defaults to ./racesim.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Race and class catalog
    #[arg(long, default_value = "data/catalog.toml")]
    catalog: PathBuf,

    /// Fight style to simulate (repeatable, replaces the configured list)
    #[arg(long = "fight-style")]
    fight_styles: Vec<String>,

    /// Spec to simulate as <class>_<spec> (repeatable)
    #[arg(long = "spec")]
    specs: Vec<String>,

    /// Override the iteration count
    #[arg(long)]
    iterations: Option<u32>,

    /// Override the results directory
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Submit batches to Raidbots instead of running simc locally
    #[arg(long)]
    raidbots: bool,

    /// Raidbots API key
    #[arg(long, env = "RAIDBOTS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    init_tracing(cli.json, level_for(cli.verbose));

    match cli.command {
        Commands::Run(args) => cmd_run(&args).await,
        Commands::Plan(args) => cmd_plan(&args),
        Commands::ExampleConfig => {
            print!("{}", SimSettings::example_toml());
            Ok(())
        }
    }
}

/// Load settings and apply command-line overrides.
fn load_settings(args: &RunArgs) -> Result<SimSettings> {
    let mut settings = match &args.config {
        Some(path) => SimSettings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).is_file() => {
            SimSettings::from_file(Path::new(DEFAULT_CONFIG))
                .with_context(|| format!("Failed to load settings from {}", DEFAULT_CONFIG))?
        }
        None => SimSettings::default(),
    };

    if !args.fight_styles.is_empty() {
        settings.fight_styles = args.fight_styles.iter().map(FightStyle::new).collect();
    }
    if !args.specs.is_empty() {
        settings.specs = args.specs.clone();
    }
    if let Some(iterations) = args.iterations {
        settings.iterations = iterations;
    }
    if let Some(dir) = &args.results_dir {
        settings.results_dir = dir.clone();
    }
    if args.raidbots {
        settings.backend.use_raidbots = true;
    }
    if let Some(key) = &args.api_key {
        settings.backend.api_key = Some(key.clone());
    }

    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    Catalog::from_file(path).with_context(|| format!("Failed to load catalog {}", path.display()))
}

async fn cmd_run(args: &RunArgs) -> Result<()> {
    let settings = load_settings(args)?;
    let catalog = load_catalog(&args.catalog)?;
    if settings.backend.raidbots_unavailable() {
        warn!("Raidbots requested without an API key, using local simc");
    }

    let executor =
        racesim_simc::executor_for(&settings).context("Failed to set up simulation backend")?;
    let writer = ReportWriter::new(&settings.results_dir);

    let summary = RaceSimulation::new(&settings, &catalog)
        .run(executor.as_ref(), &writer)
        .await
        .context("Race simulation run aborted")?;

    info!(
        written = summary.documents_written(),
        skipped_specs = summary.skipped_specs.len(),
        failed_batches = summary.failed_batches.len(),
        "Done"
    );
    println!(
        "Wrote {} result file(s) to {}",
        summary.documents_written(),
        writer.root().display()
    );
    for spec in &summary.skipped_specs {
        println!("  skipped {} (no baseline profile)", spec);
    }
    for (fight_style, spec) in &summary.failed_batches {
        println!("  failed  {} {}", fight_style, spec);
    }
    Ok(())
}

fn cmd_plan(args: &RunArgs) -> Result<()> {
    let settings = load_settings(args)?;
    let catalog = load_catalog(&args.catalog)?;

    let batches = RaceSimulation::new(&settings, &catalog)
        .plan()
        .context("Failed to build batches")?;

    for batch in &batches {
        println!(
            "{} {} ({} tasks, {})",
            batch.fight_style(),
            batch.spec_id(),
            batch.len(),
            &batch.digest()[..12]
        );
        for task in batch.tasks() {
            let marker = if task.is_baseline() { "*" } else { " " };
            println!("  {} {:<28} {}", marker, task.name(), task.overrides().join(" "));
        }
    }
    println!("{} batch(es)", batches.len());
    Ok(())
}
