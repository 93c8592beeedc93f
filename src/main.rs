mod configuration;
mod pipeline;

use clap::Parser;
use configuration::{Configuration, Switches};
use log::info;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let configuration = Configuration::try_from(Switches::parse())?;
    let time = Instant::now();
    let report = pipeline::run(&configuration)?;
    info!(
        "{} files written in {} ({} issues in the source), elapsed: {:.2}s",
        report.files_written.len(),
        report.output,
        report.issues.len(),
        time.elapsed().as_secs_f32()
    );
    Ok(())
}
