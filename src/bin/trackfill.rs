use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use trackfill::store::{JsonLinesSink, JsonLinesSource};
use trackfill::{Config, Interpolator};

/// Fills frame gaps in vehicle/plate tracks stored as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "trackfill")]
struct Args {
    /// Detection records, one JSON object per line
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Where to write the reconciled records
    #[arg(long, value_name = "PATH")]
    output: PathBuf,
    /// YAML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long)]
    parallel: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if args.parallel {
        config.parallel = true;
    }

    let input = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let mut source = JsonLinesSource::new(BufReader::new(input));

    let output = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut sink = JsonLinesSink::new(BufWriter::new(output));

    let report = Interpolator::new(config).run(&mut source, &mut sink)?;

    info!(
        "done: {} rows written to {}",
        report.output_rows(),
        args.output.display()
    );

    Ok(())
}
