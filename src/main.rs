use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use stochmap::config::RunConfig;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Sample ancestral states at the MRCAs of clades and write them as a tab-separated log
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML run configuration
    config: PathBuf,

    /// Seed of the random generator, overrides the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Number of samples to draw, overrides the configuration
    #[arg(short = 'n', long)]
    samples: Option<u64>,

    /// Output file for the log (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = RunConfig::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(samples) = args.samples {
        config.samples = samples;
    }

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let summary = stochmap::run::run(&config, &mut out)
        .with_context(|| format!("Run of {} failed", args.config.display()))?;
    tracing::info!(seed = summary.seed, samples = summary.samples, "done");
    Ok(())
}
