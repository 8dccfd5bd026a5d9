//! Find the two mates of a sample and check that they hold the same number
//! of reads.

use crate::filenames::{Mate, RawFile};
use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use log::debug;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const GZ_BUF_SIZE: usize = 1 << 20;

/// Number of lines in one FASTQ record.
pub const LINES_PER_RECORD: u64 = 4;

/// Why a sample was left out without being counted as a failure.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("missing mate: no _1 or _2 FASTQ file")]
    NoMates,

    #[error("missing mate: no {mate:?} FASTQ file")]
    MissingMate { mate: Mate },

    #[error("{count} {mate:?} FASTQ files, expected exactly one")]
    DuplicateMate { mate: Mate, count: usize },
}

/// Why a sample failed the pair check.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FailReason {
    #[error(
        "mismatched read counts for paired files: {forward:?} ({forward_reads} reads) and \
         {reverse:?} ({reverse_reads} reads)"
    )]
    MismatchedReadCounts {
        forward: PathBuf,
        reverse: PathBuf,
        forward_reads: u64,
        reverse_reads: u64,
    },

    #[error("error reading {path:?}: {message}")]
    Unreadable { path: PathBuf, message: String },
}

/// A sample whose mates were found and agree.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ValidPair {
    pub forward: RawFile,
    pub reverse: RawFile,
    pub read_pairs: u64,
}

/// Outcome of checking the files of a single sample.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub enum PairCheck {
    Valid(ValidPair),
    Skipped(SkipReason),
    Failed(FailReason),
}

/// Pick the one file with the given mate, if there is exactly one.
fn single_mate(files: &[RawFile], mate: Mate) -> Result<Option<&RawFile>, SkipReason> {
    let mut iter = files.iter().filter(|f| f.mate == mate);
    let first = iter.next();
    let rest = iter.count();
    if rest > 0 {
        return Err(SkipReason::DuplicateMate {
            mate,
            count: rest + 1,
        });
    }
    Ok(first)
}

/// Check the files of a sample. Files that are neither mate are ignored.
/// Every problem is reported through the returned `PairCheck`; nothing here
/// is fatal to the run.
pub fn check_pair(files: &[RawFile]) -> PairCheck {
    let mates = single_mate(files, Mate::Forward)
        .and_then(|fwd| Ok((fwd, single_mate(files, Mate::Reverse)?)));

    let (forward, reverse) = match mates {
        Err(reason) => return PairCheck::Skipped(reason),
        Ok((None, None)) => return PairCheck::Skipped(SkipReason::NoMates),
        Ok((None, Some(_))) => {
            return PairCheck::Skipped(SkipReason::MissingMate {
                mate: Mate::Forward,
            })
        }
        Ok((Some(_), None)) => {
            return PairCheck::Skipped(SkipReason::MissingMate {
                mate: Mate::Reverse,
            })
        }
        Ok((Some(f), Some(r))) => (f, r),
    };

    let count = |file: &RawFile| {
        count_records(&file.path).map_err(|err| FailReason::Unreadable {
            path: file.path.clone(),
            message: format!("{err:#}"),
        })
    };
    let (forward_reads, reverse_reads) = match (count(forward), count(reverse)) {
        (Ok(f), Ok(r)) => (f, r),
        (Err(e), _) | (_, Err(e)) => return PairCheck::Failed(e),
    };

    if forward_reads != reverse_reads {
        return PairCheck::Failed(FailReason::MismatchedReadCounts {
            forward: forward.path.clone(),
            reverse: reverse.path.clone(),
            forward_reads,
            reverse_reads,
        });
    }

    PairCheck::Valid(ValidPair {
        forward: forward.clone(),
        reverse: reverse.clone(),
        read_pairs: forward_reads,
    })
}

/// Count the lines readable from `reader`. A final line without a trailing
/// newline still counts.
fn count_lines(mut reader: impl BufRead) -> std::io::Result<u64> {
    let mut lines = 0;
    let mut last = None;
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        lines += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        last = buf.last().copied();
        let n = buf.len();
        reader.consume(n);
    }
    if matches!(last, Some(b) if b != b'\n') {
        lines += 1;
    }
    Ok(lines)
}

/// Count the FASTQ records of a gzipped file by streaming through it.
/// Multi-member gzip files (e.g. BGZF) are read to the end.
pub fn count_records(path: &Path) -> Result<u64> {
    let file = File::open(path).with_context(|| path.display().to_string())?;
    let reader = BufReader::with_capacity(GZ_BUF_SIZE, MultiGzDecoder::new(file));
    let lines = count_lines(reader).with_context(|| format!("Decompressing {}", path.display()))?;
    debug!("{}: {lines} lines", path.display());
    Ok(lines / LINES_PER_RECORD)
}
