//! Running the external programs.

use crate::tasks::Task;
use anyhow::{Context, Result};
use itertools::Itertools;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::process::{Command, Output};

/// Adapter sequence given to fastp for both reads when an adapter FASTA is used.
pub const ADAPTER_SEQUENCE: &str = "AAGTCGGAGGCCAAGCGGTCTTAGGAAGACAA";

/// A program and its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(program: &str) -> Self {
        ExternalCommand {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add an option followed by its value.
    pub fn opt(self, name: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(name).arg(value)
    }
}

/// Shell-quoted command line, for logs.
impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self
            .args
            .iter()
            .map(|a| shell_escape::escape(Cow::Owned(a.to_string_lossy().into_owned())));
        write!(
            f,
            "{}",
            std::iter::once(shell_escape::escape(Cow::Borrowed(self.program.as_str())))
                .chain(args)
                .join(" ")
        )
    }
}

/// Exit code and captured output of a finished process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<Output> for ToolOutput {
    fn from(output: Output) -> Self {
        ToolOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Runs an external command to completion. An `Err` means the process could
/// not be started; a process that ran and failed is an `Ok` with a non-zero
/// exit code.
pub trait ToolInvoker: Sync {
    fn invoke(&self, command: &ExternalCommand) -> Result<ToolOutput>;
}

/// Runs commands as child processes, capturing their output.
/// There is no timeout: the caller blocks until the process exits.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemInvoker;

impl ToolInvoker for SystemInvoker {
    fn invoke(&self, command: &ExternalCommand) -> Result<ToolOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .with_context(|| format!("Running {}", command.program))?;
        Ok(output.into())
    }
}

/// The fastp invocation for one sample.
pub fn fastp_command(program: &str, task: &Task) -> ExternalCommand {
    let cmd = ExternalCommand::new(program)
        .opt("-i", &task.forward.path)
        .opt("-I", &task.reverse.path)
        .opt("-o", &task.outputs.forward)
        .opt("-O", &task.outputs.reverse)
        .opt("--html", &task.outputs.html)
        .opt("--json", &task.outputs.json)
        .opt("--thread", task.threads.to_string());

    match &task.adapter_fasta {
        Some(fasta) => cmd
            .opt("--adapter_sequence", ADAPTER_SEQUENCE)
            .opt("--adapter_sequence_r2", ADAPTER_SEQUENCE)
            .opt("--adapter_fasta", fasta),
        None => cmd,
    }
}

/// The report invocation over the whole output folder.
pub fn multiqc_command(program: &str, output_root: &Path) -> ExternalCommand {
    ExternalCommand::new(program)
        .arg(output_root)
        .opt("-o", output_root)
}
