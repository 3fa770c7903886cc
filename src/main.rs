use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use simbench::{Benchmark, Distribution, HarnessConfig, HarnessError, Layout, Registry};

/// Time and cross-check the ways of computing simulated sample means
#[derive(Parser)]
#[command(name = "simbench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark the registered strategies and print the ranked report
    Run(RunArgs),

    /// List the registered strategies
    List,
}

#[derive(Args)]
struct RunArgs {
    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Draws per replication (n)
    #[arg(short = 'n', long)]
    sample_size: Option<usize>,

    /// Replications per run (N)
    #[arg(short = 'N', long)]
    replications: Option<usize>,

    /// Timed repetitions per strategy
    #[arg(short, long)]
    repetitions: Option<usize>,

    /// Untimed runs per strategy before timing starts
    #[arg(long)]
    warmup: Option<usize>,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Tolerance for the equivalence check
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// Strategy the others are checked against
    #[arg(long)]
    reference: Option<String>,

    /// Also time the growing-loop and concatenation-loop strategies
    #[arg(long)]
    include_anti_patterns: bool,

    /// Wall-clock cap per repetition, in milliseconds
    #[arg(long)]
    budget_ms: Option<u64>,

    /// Distribution each replication draws from (normal, uniform)
    #[arg(long)]
    distribution: Option<Distribution>,

    /// Grid layout for the matrix strategies (column-major, row-major)
    #[arg(long)]
    layout: Option<Layout>,

    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl RunArgs {
    fn config(&self) -> Result<HarnessConfig, HarnessError> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };
        if let Some(sample_size) = self.sample_size {
            config.sample_size = sample_size;
        }
        if let Some(replications) = self.replications {
            config.replications = replications;
        }
        if let Some(repetitions) = self.repetitions {
            config.repetitions = repetitions;
        }
        if let Some(warmup) = self.warmup {
            config.warmup = warmup;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if let Some(reference) = &self.reference {
            config.reference = reference.clone();
        }
        if self.include_anti_patterns {
            config.include_anti_patterns = true;
        }
        if self.budget_ms.is_some() {
            config.budget_ms = self.budget_ms;
        }
        if let Some(distribution) = self.distribution {
            config.distribution = distribution;
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        Ok(config)
    }
}

fn run(args: &RunArgs) -> Result<ExitCode, HarnessError> {
    let config = args.config()?;
    debug!(?config, "resolved configuration");
    let report = Benchmark::new(config)?.run(&Registry::with_defaults())?;
    let rendered = match args.format {
        Format::Text => Ok(report.render_text()),
        Format::Json => report.to_json(),
    };
    Ok(emit(rendered))
}

fn emit(rendered: serde_json::Result<String>) -> ExitCode {
    match rendered {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(why) => {
            error!(%why, "cannot serialize report");
            ExitCode::FAILURE
        }
    }
}

fn list() {
    for strategy in Registry::with_defaults().list() {
        let note = if strategy.is_anti_pattern() {
            "  (anti-pattern, excluded by default)"
        } else {
            ""
        };
        println!("{}{note}", strategy.name());
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Run(args) => run(&args).unwrap_or_else(|why| {
            error!(%why, "benchmark aborted");
            ExitCode::FAILURE
        }),
        Commands::List => {
            list();
            ExitCode::SUCCESS
        }
    }
}
