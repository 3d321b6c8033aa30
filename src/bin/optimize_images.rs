use assetprep::{OptimizationBatch, OptimizeCli};
use clap::Parser;
use log::LevelFilter;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = OptimizeCli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let batch = OptimizationBatch::new(cli.into_config());
    let summary = batch.run()?;

    Ok(ExitCode::from(summary.exit_code()))
}
