//! fastp_runner
#![deny(missing_docs)]

use anyhow::Result;
use clap::Parser;
use env_logger::Builder;
use fastp_wrap::utils::print_error_chain;
use fastp_wrap::{run, RunConfig, SystemInvoker};
use log::{warn, LevelFilter};
use std::io::Write;
use std::process::ExitCode;

/// Run fastp on every paired sample of a sequencing run folder, then MultiQC
/// over the output folder.
///
/// Samples are keyed by flowcell, lane and barcode. A sample is processed only
/// if it has exactly one _1 and one _2 FASTQ holding the same number of
/// reads; other samples are reported and skipped.
///
/// External programs are run without a timeout: a fastp process that hangs
/// holds its job slot until it exits.
#[derive(Parser, Debug)]
#[clap(name = "fastp_runner", version)]
struct FastpRunner {
    #[clap(flatten)]
    config: RunConfig,

    /// Log debug messages, including the command lines that are run
    #[clap(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .init();
}

fn inner_main() -> Result<ExitCode> {
    let opts = FastpRunner::parse();
    init_logging(opts.verbose);

    let summary = run(&opts.config, &SystemInvoker)?;
    if !summary.is_clean() {
        match &summary.summary_file {
            Some(path) => warn!("Some steps failed; see {} for details", path.display()),
            None => warn!("Some steps failed; see the messages above for details"),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match inner_main() {
        Ok(exit_code) => exit_code,
        Err(err) => {
            print_error_chain(&err);
            ExitCode::FAILURE
        }
    }
}
