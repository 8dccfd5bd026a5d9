//! The end-to-end run: find FASTQs, group them into samples, check the mates,
//! run fastp on every valid sample and build the final report.

use crate::config::RunConfig;
use crate::outputs::OutputLayout;
use crate::scheduler::{JobScheduler, SampleResult};
use crate::summary::RunSummary;
use crate::tasks::{build_tasks, check_groups};
use crate::tools::ToolInvoker;
use anyhow::Result;
use fastq_groups::{
    find_fastq_files, flowcell_id, group_samples, BarcodeSource, FastqGroupError, SampleKey,
};
use log::{error, info};
use std::collections::HashMap;

/// Run the whole pipeline for `config`. An `Err` is a fatal configuration
/// problem; per-sample problems are reported in the returned summary.
pub fn run(config: &RunConfig, invoker: &dyn ToolInvoker) -> Result<RunSummary> {
    let input_dir = &config.input_dir;
    let files = find_fastq_files(input_dir)?;
    let flowcell = flowcell_id(input_dir)?;
    info!(
        "Found {} FASTQ file(s) for flowcell {flowcell} under {}",
        files.len(),
        input_dir.display()
    );

    let barcodes = match &config.sample_list {
        Some(path) => BarcodeSource::SampleList(path),
        None => BarcodeSource::Inferred(&files),
    }
    .resolve()?;

    let groups = group_samples(&flowcell, &files, &barcodes);
    if groups.is_empty() {
        return Err(FastqGroupError::NoSamples {
            path: input_dir.clone(),
            n_files: files.len(),
            n_barcodes: barcodes.len(),
        }
        .into());
    }
    info!("Grouped FASTQs into {} sample(s)", groups.len());

    let layout = OutputLayout::new(config.output_root(&flowcell));
    layout.create()?;

    let checked = check_groups(groups.into_groups(), config.workers())?;
    let order: Vec<SampleKey> = checked.iter().map(|(key, _)| key.clone()).collect();
    let (tasks, not_run) = build_tasks(checked, config, &layout)?;
    let any_tasks = !tasks.is_empty();

    let schedule = JobScheduler::new(config.workers(), invoker, &config.programs)
        .run(tasks, layout.root())?;

    let mut by_key: HashMap<SampleKey, SampleResult> = schedule
        .results
        .into_iter()
        .chain(not_run)
        .map(|r| (r.sample.clone(), r))
        .collect();
    let samples = order
        .iter()
        .filter_map(|key| by_key.remove(key))
        .collect();

    let mut summary = RunSummary::new(
        flowcell,
        layout.root().to_path_buf(),
        samples,
        schedule.aggregate,
    );
    summary.log();
    if any_tasks {
        let path = layout.summary_path();
        // Not fatal: every tool has already run.
        match summary.write_json(&path) {
            Ok(()) => summary.summary_file = Some(path),
            Err(err) => error!("Could not write run summary {}: {err:#}", path.display()),
        }
    }
    Ok(summary)
}
