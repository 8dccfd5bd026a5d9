//! Per-run report of what happened to each sample.

use crate::scheduler::{AggregateResult, RunResult, SampleResult};
use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub flowcell: String,
    pub output_dir: PathBuf,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// In sample group order
    pub samples: Vec<SampleResult>,
    /// `None` if no sample was processed
    pub aggregate: Option<AggregateResult>,
    /// Where this summary was written, if it was
    #[serde(skip)]
    pub summary_file: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(
        flowcell: String,
        output_dir: PathBuf,
        samples: Vec<SampleResult>,
        aggregate: Option<AggregateResult>,
    ) -> Self {
        let count = |f: fn(&RunResult) -> bool| samples.iter().filter(|s| f(&s.result)).count();
        RunSummary {
            succeeded: count(|r| matches!(r, RunResult::Succeeded)),
            skipped: count(|r| matches!(r, RunResult::Skipped(_))),
            failed: count(|r| matches!(r, RunResult::Failed(_))),
            flowcell,
            output_dir,
            samples,
            aggregate,
            summary_file: None,
        }
    }

    /// True if no sample failed and the report step did not fail.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && !matches!(self.aggregate, Some(AggregateResult::Failed(_)))
    }

    pub fn log(&self) {
        info!(
            "{}: {} sample(s) succeeded, {} skipped, {} failed",
            self.flowcell, self.succeeded, self.skipped, self.failed
        );
        for s in &self.samples {
            match &s.result {
                RunResult::Succeeded => {}
                RunResult::Skipped(reason) => warn!("  {} skipped: {reason}", s.sample),
                RunResult::Failed(failure) => error!("  {} failed: {failure}", s.sample),
            }
        }
        match &self.aggregate {
            Some(AggregateResult::Succeeded) => {
                info!("MultiQC report written to {}", self.output_dir.display())
            }
            Some(AggregateResult::Failed(failure)) => error!("MultiQC failed: {failure}"),
            None => {}
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(
            File::create(path).with_context(|| format!("Creating {}", path.display()))?,
        );
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Failure;
    use fastq_groups::{Mate, SampleKey, SkipReason};
    use pretty_assertions::assert_eq;

    fn summary(aggregate: Option<AggregateResult>) -> RunSummary {
        let key = |bc: &str| SampleKey::new("FC001", "L01", bc);
        RunSummary::new(
            "FC001".to_string(),
            "FC001_fp".into(),
            vec![
                SampleResult {
                    sample: key("BC01"),
                    result: RunResult::Succeeded,
                },
                SampleResult {
                    sample: key("BC02"),
                    result: RunResult::Skipped(SkipReason::MissingMate {
                        mate: Mate::Reverse,
                    }),
                },
                SampleResult {
                    sample: key("BC03"),
                    result: RunResult::Failed(Failure::Panicked {
                        message: "oops".to_string(),
                    }),
                },
                SampleResult {
                    sample: key("BC04"),
                    result: RunResult::Succeeded,
                },
            ],
            aggregate,
        )
    }

    #[test]
    fn test_counts() {
        let s = summary(Some(AggregateResult::Succeeded));
        assert_eq!((s.succeeded, s.skipped, s.failed), (2, 1, 1));
        assert!(!s.is_clean());
    }

    #[test]
    fn test_write_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("run_summary.json");
        summary(None).write_json(&path)?;

        let json: serde_json::Value = serde_json::from_reader(File::open(&path)?)?;
        assert_eq!(json["flowcell"], "FC001");
        assert_eq!(json["succeeded"], 2);
        assert_eq!(json["aggregate"], serde_json::Value::Null);
        assert_eq!(json["samples"].as_array().unwrap().len(), 4);
        assert_eq!(json["samples"][0]["result"]["status"], "succeeded");
        assert_eq!(json["samples"][1]["result"]["status"], "skipped");
        Ok(())
    }
}
