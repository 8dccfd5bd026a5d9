//! Helpers shared by the tests of this crate.

use crate::tools::{ExternalCommand, ToolInvoker, ToolOutput};
use anyhow::{anyhow, Result};
use fastq_groups::RawFile;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Write a gzipped FASTQ with `n_lines` lines (`n_lines / 4` records).
pub fn write_fastq(dir: &Path, name: &str, n_lines: usize) -> RawFile {
    create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let mut gz = GzEncoder::new(File::create(&path).unwrap(), Compression::fast());
    for i in 0..n_lines {
        let line = match i % 4 {
            0 => format!("@read{}", i / 4),
            1 => "ACGTACGT".to_string(),
            2 => "+".to_string(),
            _ => "IIIIIIII".to_string(),
        };
        writeln!(gz, "{line}").unwrap();
    }
    gz.finish().unwrap();
    RawFile::new(path).unwrap()
}

/// Write the `_1` and `_2` FASTQs of a sample.
pub fn write_pair(
    dir: &Path,
    flowcell: &str,
    lane: &str,
    barcode: &str,
    forward_lines: usize,
    reverse_lines: usize,
) -> (RawFile, RawFile) {
    let prefix = format!("{flowcell}_{lane}_{barcode}");
    (
        write_fastq(dir, &format!("{prefix}_1.fq.gz"), forward_lines),
        write_fastq(dir, &format!("{prefix}_2.fq.gz"), reverse_lines),
    )
}

enum Behavior {
    Exit(i32, String),
    Panic,
    Unlaunchable,
}

/// A `ToolInvoker` that records calls instead of running anything.
/// Commands whose command line contains a registered pattern misbehave.
#[derive(Default)]
pub struct FakeInvoker {
    rules: Vec<(String, Behavior)>,
    calls: Mutex<Vec<ExternalCommand>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    finished: AtomicUsize,
    finished_before_aggregate: Mutex<Option<usize>>,
}

impl FakeInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_when(mut self, pattern: &str, code: i32, stderr: &str) -> Self {
        self.rules
            .push((pattern.to_string(), Behavior::Exit(code, stderr.to_string())));
        self
    }

    pub fn panic_when(mut self, pattern: &str) -> Self {
        self.rules.push((pattern.to_string(), Behavior::Panic));
        self
    }

    pub fn unlaunchable_when(mut self, pattern: &str) -> Self {
        self.rules.push((pattern.to_string(), Behavior::Unlaunchable));
        self
    }

    /// All commands invoked so far, in call order.
    pub fn calls(&self) -> Vec<ExternalCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// The largest number of commands that ran at the same time.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// How many commands had finished when `multiqc` was invoked.
    pub fn finished_before_aggregate(&self) -> Option<usize> {
        *self.finished_before_aggregate.lock().unwrap()
    }
}

impl ToolInvoker for FakeInvoker {
    fn invoke(&self, command: &ExternalCommand) -> Result<ToolOutput> {
        let line = command.to_string();
        self.calls.lock().unwrap().push(command.clone());
        if command.program == "multiqc" {
            *self.finished_before_aggregate.lock().unwrap() =
                Some(self.finished.load(Ordering::SeqCst));
        }

        let behavior = self
            .rules
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, b)| b);

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(10));
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);

        match behavior {
            None => Ok(ToolOutput {
                code: Some(0),
                ..Default::default()
            }),
            Some(Behavior::Exit(code, stderr)) => Ok(ToolOutput {
                code: Some(*code),
                stdout: Vec::new(),
                stderr: stderr.clone().into_bytes(),
            }),
            Some(Behavior::Panic) => panic!("fake tool crashed on {line}"),
            Some(Behavior::Unlaunchable) => Err(anyhow!("No such file or directory")),
        }
    }
}
