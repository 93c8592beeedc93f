use crate::configuration::{Configuration, Seeds};
use anyhow::{bail, Context, Result};
use gtfs_feed::{
    filter_routes, filter_stops, normalize_calendars, validate, Feed, GtfsReader, GtfsWriter,
    InMemory, Issue, NormalizationSummary, SqliteStorage, Storage,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;

/// Summary of a run, written as JSON with `--report`
#[derive(Debug, Serialize)]
pub struct Report {
    pub input: String,
    pub output: String,
    pub before: BTreeMap<&'static str, usize>,
    pub after: BTreeMap<&'static str, usize>,
    pub issues: Vec<Issue>,
    pub normalization: Option<NormalizationSummary>,
    pub files_written: Vec<&'static str>,
}

pub fn run(configuration: &Configuration) -> Result<Report> {
    let reader = GtfsReader::default();
    let input = configuration.input.display().to_string();
    let report = match &configuration.database {
        Some(database) => {
            if database.exists() {
                if !configuration.overwrite {
                    bail!(
                        "{} already exists, use --overwrite to replace it",
                        database.display()
                    );
                }
                log::warn!("{} already exists, it is replaced", database.display());
                std::fs::remove_file(database)
                    .with_context(|| format!("impossible to remove {}", database.display()))?;
            }
            let storage = SqliteStorage::open(database)
                .with_context(|| format!("impossible to open {}", database.display()))?;
            let source = reader
                .read_into(&input, &storage)
                .with_context(|| format!("impossible to read {input}"))?;
            process(configuration, source)?
        }
        None => {
            let source: Feed<InMemory> = reader
                .read(&input)
                .with_context(|| format!("impossible to read {input}"))?;
            process(configuration, source)?
        }
    };

    if let Some(path) = &configuration.report {
        let file = File::create(path)
            .with_context(|| format!("impossible to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)
            .with_context(|| format!("impossible to write the report {}", path.display()))?;
        log::info!("report written in {}", path.display());
    }
    Ok(report)
}

pub fn process<S: Storage>(configuration: &Configuration, source: Feed<S>) -> Result<Report> {
    let before = source.counts()?;

    let issues = validate(&source).context("impossible to check the source feed")?;
    for issue in &issues {
        log::warn!("{}", issue);
    }
    if configuration.strict && !issues.is_empty() {
        bail!("{} inconsistencies in the source feed", issues.len());
    }

    let time = Instant::now();
    let seeds = &configuration.seeds;
    let mut pruned = match seeds {
        Seeds::Routes(_) => filter_routes(&source, |r| seeds.keeps_route(r)),
        _ => filter_stops(&source, |s| seeds.keeps_stop(s)),
    }
    .context("impossible to filter the feed")?;
    log::info!("feed filtered in {:.2}s", time.elapsed().as_secs_f32());

    let normalization = if configuration.normalize_calendars {
        Some(normalize_calendars(&mut pruned).context("impossible to normalize the calendars")?)
    } else {
        None
    };

    let after = pruned.counts()?;
    for (file_name, count) in &after {
        log::info!("  {}: {} -> {}", file_name, before[file_name], count);
    }
    let files_written = GtfsWriter::new(&configuration.output)
        .write(&pruned)
        .with_context(|| format!("impossible to write {}", configuration.output.display()))?;

    Ok(Report {
        input: configuration.input.display().to_string(),
        output: configuration.output.display().to_string(),
        before,
        after,
        issues,
        normalization,
        files_written,
    })
}
