//! Group the FASTQ files of a run into samples.

use crate::errors::FastqGroupError;
use crate::filenames::RawFile;
use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Identifies one sample of a run.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct SampleKey {
    pub flowcell: String,
    pub lane: String,
    pub barcode: String,
}

impl SampleKey {
    pub fn new(flowcell: &str, lane: &str, barcode: &str) -> Self {
        SampleKey {
            flowcell: flowcell.to_string(),
            lane: lane.to_string(),
            barcode: barcode.to_string(),
        }
    }
}

/// Formats as `<flowcell>_<lane>_<barcode>`, which is also the sample name
/// used for output files.
impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.flowcell, self.lane, self.barcode)
    }
}

/// The files of one sample, in the order they were found.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct SampleGroup {
    pub key: SampleKey,
    pub files: Vec<RawFile>,
}

/// All the samples of a run. Iteration order is the order in which each
/// sample was first seen.
#[derive(Default, Clone, Debug)]
pub struct SampleGroups {
    groups: Vec<SampleGroup>,
    index: HashMap<SampleKey, usize>,
}

impl SampleGroups {
    fn push(&mut self, key: SampleKey, file: RawFile) {
        match self.index.get(&key) {
            Some(&i) => self.groups[i].files.push(file),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push(SampleGroup {
                    key,
                    files: vec![file],
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &SampleKey) -> Option<&SampleGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleGroup> {
        self.groups.iter()
    }

    pub fn into_groups(self) -> Vec<SampleGroup> {
        self.groups
    }
}

/// The flowcell ID of a run is the name of its input folder.
pub fn flowcell_id(input_dir: &Path) -> Result<String> {
    let named = match input_dir.file_name() {
        Some(_) => input_dir.to_path_buf(),
        // Handle paths like `.` or `..`
        None => input_dir.canonicalize()?,
    };
    named
        .file_name()
        .and_then(|name| name.to_str())
        .map(String::from)
        .ok_or_else(|| {
            FastqGroupError::NoFlowcellId {
                path: input_dir.to_path_buf(),
            }
            .into()
        })
}

/// Assign each file to the sample of the first barcode (in `barcodes` order)
/// that appears as a whole `_`-delimited field of its name. The lane is the
/// second field of the name. Files with fewer than three fields and
/// undecoded files are never assigned.
pub fn group_samples(flowcell: &str, files: &[RawFile], barcodes: &[String]) -> SampleGroups {
    let mut groups = SampleGroups::default();

    for file in files {
        if file.undecoded {
            debug!("ignoring undecoded FASTQ {}", file.path.display());
            continue;
        }
        let Some(lane) = &file.lane else {
            debug!("ignoring FASTQ with too few fields {}", file.path.display());
            continue;
        };
        match barcodes.iter().find(|&bc| file.has_token(bc)) {
            Some(barcode) => {
                groups.push(SampleKey::new(flowcell, lane, barcode), file.clone());
            }
            None => debug!("no barcode matches {}", file.path.display()),
        }
    }

    if groups.is_empty() && !files.is_empty() {
        warn!(
            "none of {} FASTQ files matched the {} barcode(s)",
            files.len(),
            barcodes.len()
        );
    }
    groups
}
