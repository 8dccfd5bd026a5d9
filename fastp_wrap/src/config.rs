//! Run configuration, parsed once from the command line and passed to every
//! stage of the run.

use crate::utils::CliPath;
use clap::{self, Args, Parser};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Suffix of the default output folder, appended to the flowcell ID.
const DEFAULT_OUTPUT_SUFFIX: &str = "_fp";

/// Names of the external programs that are run.
#[derive(Args, Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolPrograms {
    /// Preprocessing program run once per sample
    #[clap(long, default_value = "fastp", value_name = "PROG")]
    pub fastp: String,

    /// Report program run once over the output folder
    #[clap(long, default_value = "multiqc", value_name = "PROG")]
    pub multiqc: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        ToolPrograms {
            fastp: "fastp".to_string(),
            multiqc: "multiqc".to_string(),
        }
    }
}

#[derive(Parser, Debug, Clone, Serialize)]
pub struct RunConfig {
    /// Folder containing the FASTQ files of one flowcell. FASTQs are found at
    /// any depth and must be named <flowcell>_<lane>_<barcode>..._1.fq.gz and
    /// _2.fq.gz. The folder name is used as the flowcell ID.
    #[clap(value_name = "PATH")]
    pub input_dir: PathBuf,

    /// File with the list of barcodes to process, one per line. By default
    /// the barcodes are taken from the FASTQ file names.
    #[clap(long = "sample", value_name = "FILE")]
    pub sample_list: Option<PathBuf>,

    /// Number of samples processed in parallel
    #[clap(long, default_value_t = 1, value_name = "NUM")]
    pub jobs: usize,

    /// Adapter FASTA passed to fastp
    #[clap(long, value_name = "PATH")]
    pub adapter_fasta: Option<CliPath>,

    /// Number of threads used by each fastp process
    #[clap(
        long = "thread",
        default_value_t = 3,
        value_name = "NUM",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub threads: u32,

    /// Output folder [default: <flowcell>_fp]
    #[clap(long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    #[clap(flatten)]
    pub programs: ToolPrograms,
}

impl RunConfig {
    /// A configuration with default settings for `input_dir`.
    pub fn new(input_dir: impl AsRef<Path>) -> Self {
        RunConfig {
            input_dir: input_dir.as_ref().to_path_buf(),
            sample_list: None,
            jobs: 1,
            adapter_fasta: None,
            threads: 3,
            output_dir: None,
            programs: ToolPrograms::default(),
        }
    }

    /// Number of worker threads; values below one mean sequential.
    pub fn workers(&self) -> usize {
        self.jobs.max(1)
    }

    /// The output folder for the run of `flowcell`.
    pub fn output_root(&self, flowcell: &str) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{flowcell}{DEFAULT_OUTPUT_SUFFIX}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let c = RunConfig::try_parse_from(["fastp_runner", "/data/FC001"]).unwrap();
        assert_eq!(c.input_dir, PathBuf::from("/data/FC001"));
        assert_eq!(c.sample_list, None);
        assert_eq!(c.jobs, 1);
        assert_eq!(c.threads, 3);
        assert_eq!(c.programs, ToolPrograms::default());
        assert_eq!(c.output_root("FC001"), PathBuf::from("FC001_fp"));
        assert_eq!(c.workers(), 1);
    }

    #[test]
    fn test_options() {
        let c = RunConfig::try_parse_from([
            "fastp_runner",
            "/data/FC001",
            "--sample",
            "samples.txt",
            "--jobs",
            "4",
            "--thread",
            "8",
            "--output-dir",
            "/out",
            "--fastp",
            "/opt/fastp",
        ])
        .unwrap();
        assert_eq!(c.sample_list, Some(PathBuf::from("samples.txt")));
        assert_eq!(c.workers(), 4);
        assert_eq!(c.threads, 8);
        assert_eq!(c.output_root("FC001"), PathBuf::from("/out"));
        assert_eq!(c.programs.fastp, "/opt/fastp");
        assert_eq!(c.programs.multiqc, "multiqc");
    }

    #[test]
    fn test_bad_options() {
        assert!(RunConfig::try_parse_from(["fastp_runner"]).is_err());
        assert!(RunConfig::try_parse_from(["fastp_runner", "in", "--thread", "0"]).is_err());
        assert!(RunConfig::try_parse_from(["fastp_runner", "in", "--jobs", "-1"]).is_err());
        assert!(RunConfig::try_parse_from([
            "fastp_runner",
            "in",
            "--adapter-fasta",
            "/no/such/adapters.fa"
        ])
        .is_err());
    }

    #[test]
    fn test_zero_jobs_is_sequential() {
        let c = RunConfig::try_parse_from(["fastp_runner", "in", "--jobs", "0"]).unwrap();
        assert_eq!(c.workers(), 1);
    }
}
