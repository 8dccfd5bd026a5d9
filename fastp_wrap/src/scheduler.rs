//! Run fastp for every task on a fixed pool of workers, then run the report
//! step once.

use crate::config::ToolPrograms;
use crate::tasks::Task;
use crate::tools::{fastp_command, multiqc_command, ToolInvoker};
use crate::utils::tail_lines;
use anyhow::Result;
use fastq_groups::{FailReason, SampleKey, SkipReason};
use log::{debug, error, info, warn};
use par_proc::{decipher_panic, process_with_pool, Proc};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

/// Lines of tool stderr kept in a failure report.
const STDERR_TAIL_LINES: usize = 20;

/// Why a sample failed.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error(transparent)]
    PairCheck(FailReason),

    #[error("{program} exited with {}: {stderr}", exit_code_str(.code))]
    ToolExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("could not run {program}: {message}")]
    ToolLaunch { program: String, message: String },

    #[error("worker panicked: {message}")]
    Panicked { message: String },
}

fn exit_code_str(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (killed by a signal)".to_string(),
    }
}

/// The outcome of one sample.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RunResult {
    Succeeded,
    Skipped(SkipReason),
    Failed(Failure),
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SampleResult {
    pub sample: SampleKey,
    pub result: RunResult,
}

/// The outcome of the report step.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum AggregateResult {
    Succeeded,
    Failed(Failure),
}

/// Runs fastp tasks through one worker.
struct FastpProc<'a> {
    invoker: &'a dyn ToolInvoker,
    program: &'a str,
    results: Vec<(usize, SampleResult)>,
}

impl FastpProc<'_> {
    fn run_task(&self, task: &Task) -> RunResult {
        let command = fastp_command(self.program, task);
        info!("Running fastp for sample {}...", task.key);
        debug!("{command}");

        match self.invoker.invoke(&command) {
            Ok(output) if output.success() => {
                info!("Finished fastp for sample {}", task.key);
                RunResult::Succeeded
            }
            Ok(output) => RunResult::Failed(Failure::ToolExit {
                program: command.program,
                code: output.code,
                stderr: tail_lines(&output.stderr, STDERR_TAIL_LINES),
            }),
            Err(err) => RunResult::Failed(Failure::ToolLaunch {
                program: command.program,
                message: format!("{err:#}"),
            }),
        }
    }
}

impl Proc for FastpProc<'_> {
    type Item = (usize, Task);
    type Err = anyhow::Error;

    fn process(&mut self, (idx, task): Self::Item) -> Result<()> {
        // A panic in one task must not take down the worker or its siblings.
        let result = catch_unwind(AssertUnwindSafe(|| self.run_task(&task))).unwrap_or_else(|p| {
            RunResult::Failed(Failure::Panicked {
                message: decipher_panic(p),
            })
        });
        if let RunResult::Failed(failure) = &result {
            error!(
                "Error for sample {} ({} / {}): {failure}",
                task.key,
                task.forward.path.display(),
                task.reverse.path.display()
            );
        }
        self.results.push((
            idx,
            SampleResult {
                sample: task.key,
                result,
            },
        ));
        Ok(())
    }
}

/// Results of running the tasks.
#[derive(Debug)]
pub struct Schedule {
    /// One result per task, in task order
    pub results: Vec<SampleResult>,
    /// `None` if the report step was not run
    pub aggregate: Option<AggregateResult>,
}

/// Runs fastp tasks with a fixed number of workers, then the report step.
/// There is no timeout or cancellation: a hung fastp process holds its
/// worker until it exits.
pub struct JobScheduler<'a> {
    workers: usize,
    invoker: &'a dyn ToolInvoker,
    programs: &'a ToolPrograms,
}

impl<'a> JobScheduler<'a> {
    pub fn new(workers: usize, invoker: &'a dyn ToolInvoker, programs: &'a ToolPrograms) -> Self {
        JobScheduler {
            workers: workers.max(1),
            invoker,
            programs,
        }
    }

    /// Run every task, isolating failures per task. Once all tasks have
    /// finished, the report step runs once over `output_root`, unless there
    /// were no tasks at all.
    pub fn run(&self, tasks: Vec<Task>, output_root: &Path) -> Result<Schedule> {
        if tasks.is_empty() {
            warn!("No samples to process; not running {}", self.programs.multiqc);
            return Ok(Schedule {
                results: Vec::new(),
                aggregate: None,
            });
        }

        let workers = self.workers.min(tasks.len());
        info!("Processing {} sample(s) with {workers} worker(s)", tasks.len());
        let processors = (0..workers)
            .map(|_| FastpProc {
                invoker: self.invoker,
                program: &self.programs.fastp,
                results: Vec::new(),
            })
            .collect();

        // Returns only after every worker has been joined.
        let mut results: Vec<_> = process_with_pool(tasks.into_iter().enumerate(), processors)?
            .into_iter()
            .flat_map(|p| p.results)
            .collect();
        results.sort_by_key(|(idx, _)| *idx);
        let results = results.into_iter().map(|(_, r)| r).collect();

        Ok(Schedule {
            results,
            aggregate: Some(self.run_aggregate(output_root)),
        })
    }

    fn run_aggregate(&self, output_root: &Path) -> AggregateResult {
        let command = multiqc_command(&self.programs.multiqc, output_root);
        info!("Running MultiQC for {}...", output_root.display());
        debug!("{command}");

        let failure = match self.invoker.invoke(&command) {
            Ok(output) if output.success() => return AggregateResult::Succeeded,
            Ok(output) => Failure::ToolExit {
                program: command.program,
                code: output.code,
                stderr: tail_lines(&output.stderr, STDERR_TAIL_LINES),
            },
            Err(err) => Failure::ToolLaunch {
                program: command.program,
                message: format!("{err:#}"),
            },
        };
        warn!("Report step failed: {failure}");
        AggregateResult::Failed(failure)
    }
}
