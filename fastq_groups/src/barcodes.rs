//! Resolve the set of barcodes (samples) present in a run.

use crate::errors::FastqGroupError;
use crate::filenames::RawFile;
use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Where the barcodes of a run come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BarcodeSource<'a> {
    /// A newline-delimited sample list, processed in the given order
    SampleList(&'a Path),
    /// The third field of every non-undecoded FASTQ filename
    Inferred(&'a [RawFile]),
}

impl BarcodeSource<'_> {
    /// Resolve the barcodes. An empty result is an error.
    pub fn resolve(&self) -> Result<Vec<String>> {
        let barcodes = match self {
            BarcodeSource::SampleList(path) => {
                let barcodes = read_barcodes(path)?;
                info!(
                    "read {} barcode(s) from sample list {}",
                    barcodes.len(),
                    path.display()
                );
                barcodes
            }
            BarcodeSource::Inferred(files) => {
                let barcodes = infer_barcodes(files);
                info!(
                    "inferred {} barcode(s) from {} FASTQ file name(s)",
                    barcodes.len(),
                    files.len()
                );
                barcodes
            }
        };
        if barcodes.is_empty() {
            return Err(FastqGroupError::NoBarcodes.into());
        }
        Ok(barcodes)
    }
}

/// Read a sample list file, see [`parse_barcodes`].
pub fn read_barcodes(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Reading sample list {}", path.display()))?;
    parse_barcodes(file).with_context(|| format!("Reading sample list {}", path.display()))
}

/// Parse one barcode per line. Whitespace is trimmed and blank lines are
/// dropped. Order is kept and repeated barcodes keep their first position.
pub fn parse_barcodes(reader: impl Read) -> Result<Vec<String>> {
    let lines: Vec<String> = BufReader::new(reader).lines().try_collect()?;
    Ok(lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .unique()
        .map(String::from)
        .collect())
}

/// Collect the distinct barcode fields of `files`, skipping undecoded files
/// and names too short to carry a barcode. The result is sorted.
pub fn infer_barcodes(files: &[RawFile]) -> Vec<String> {
    files
        .iter()
        .filter(|f| !f.undecoded)
        .filter_map(|f| f.barcode.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
