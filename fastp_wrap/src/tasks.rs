//! Turn sample groups into fastp tasks.

use crate::config::RunConfig;
use crate::outputs::{OutputLayout, OutputPaths};
use crate::scheduler::{Failure, RunResult, SampleResult};
use anyhow::Result;
use fastq_groups::{check_pair, PairCheck, RawFile, SampleGroup, SampleKey};
use log::{error, info, warn};
use par_proc::{process_with_pool, Proc};
use std::path::PathBuf;

/// Everything needed to run fastp on one sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub key: SampleKey,
    pub forward: RawFile,
    pub reverse: RawFile,
    pub read_pairs: u64,
    pub outputs: OutputPaths,
    pub adapter_fasta: Option<PathBuf>,
    pub threads: u32,
}

/// Runs the pair check on indexed sample groups.
struct PairCheckProc {
    checked: Vec<(usize, SampleKey, PairCheck)>,
}

impl Proc for PairCheckProc {
    type Item = (usize, SampleGroup);
    type Err = anyhow::Error;

    fn process(&mut self, (idx, group): Self::Item) -> Result<()> {
        let check = check_pair(&group.files);
        self.checked.push((idx, group.key, check));
        Ok(())
    }
}

/// Check the mates of every group, using `workers` threads. The results are
/// in the order of `groups`.
pub fn check_groups(
    groups: Vec<SampleGroup>,
    workers: usize,
) -> Result<Vec<(SampleKey, PairCheck)>> {
    let processors = (0..workers.max(1))
        .map(|_| PairCheckProc {
            checked: Vec::new(),
        })
        .collect();
    let mut checked: Vec<_> = process_with_pool(groups.into_iter().enumerate(), processors)?
        .into_iter()
        .flat_map(|p| p.checked)
        .collect();
    checked.sort_by_key(|(idx, _, _)| *idx);
    Ok(checked
        .into_iter()
        .map(|(_, key, check)| (key, check))
        .collect())
}

/// Build a task for every sample that passed the pair check, creating its
/// lane output folder. Samples that did not pass are logged and returned as
/// results. Failing to create an output folder is fatal.
pub fn build_tasks(
    checked: Vec<(SampleKey, PairCheck)>,
    config: &RunConfig,
    layout: &OutputLayout,
) -> Result<(Vec<Task>, Vec<SampleResult>)> {
    let adapter_fasta: Option<PathBuf> = config.adapter_fasta.clone().map(PathBuf::from);
    let mut tasks = Vec::new();
    let mut not_run = Vec::new();

    for (key, check) in checked {
        let result = match check {
            PairCheck::Valid(pair) => {
                layout.create_lane_dir(&key.lane)?;
                info!("{key}: {} read pairs", pair.read_pairs);
                tasks.push(Task {
                    outputs: layout.sample_outputs(&key),
                    key,
                    forward: pair.forward,
                    reverse: pair.reverse,
                    read_pairs: pair.read_pairs,
                    adapter_fasta: adapter_fasta.clone(),
                    threads: config.threads,
                });
                continue;
            }
            PairCheck::Skipped(reason) => {
                warn!("Skipping {key}: {reason}");
                RunResult::Skipped(reason)
            }
            PairCheck::Failed(reason) => {
                error!("Error for sample {key}: {reason}");
                RunResult::Failed(Failure::PairCheck(reason))
            }
        };
        not_run.push(SampleResult {
            sample: key,
            result,
        });
    }
    Ok((tasks, not_run))
}
