//! ChainTab CLI entry point
//!
//! Converts a pairwise genome-alignment chain file into a coordinate-sorted
//! table of ungapped alignment blocks.

use anyhow::Context;
use chaintab::table::convert_chain;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "chaintab")]
#[command(about = "Convert a chain file into a sorted alignment-block table")]
#[command(version)]
#[command(author = "ChainTab Contributors")]
struct Cli {
    /// Input chain file (plain, .gz, or .bz2)
    chain: PathBuf,
    /// Output table file
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Wrong argument shapes print usage on stdout and exit 1; help and
    // version keep clap's default behavior.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                println!("Usage: chaintab <chain-file> <output-file>");
                std::process::exit(1);
            }
        },
    };

    let start = Instant::now();
    eprintln!("Converting chain file: {:?} -> {:?}", cli.chain, cli.output);

    let stats = convert_chain(&cli.chain, &cli.output)
        .with_context(|| format!("Failed to convert chain file {:?}", cli.chain))?;

    eprintln!("\n=== Conversion Statistics ===");
    eprintln!("Chains:          {}", stats.chains);
    eprintln!("Blocks:          {}", stats.blocks);
    eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
