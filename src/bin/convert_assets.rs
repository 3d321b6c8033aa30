use assetprep::{ConversionBatch, ConvertCli};
use clap::Parser;
use log::LevelFilter;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = ConvertCli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let batch = ConversionBatch::new(cli.into_config());
    let summary = batch.run()?;

    Ok(ExitCode::from(summary.exit_code()))
}
