//! Parse the `<flowcell>_<lane>_<barcode>..._<mate>.fq.gz` naming convention.

pub mod fastq_dir;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix of every FASTQ file considered part of a run.
pub const FASTQ_SUFFIX: &str = ".fq.gz";

/// Files whose name contains this marker hold reads that could not be
/// assigned to any sample.
pub const UNDECODED_MARKER: &str = "undecoded";

/// Separator between the fields of a FASTQ filename.
pub const FIELD_DELIMITER: char = '_';

/// Which read of a pair a file holds, taken from the `_1` / `_2` suffix.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub enum Mate {
    Forward,
    Reverse,
    Unknown,
}

impl Mate {
    /// Infer the mate from a bare file name.
    pub fn from_filename(filename: &str) -> Mate {
        if filename.ends_with(&format!("_1{FASTQ_SUFFIX}")) {
            Mate::Forward
        } else if filename.ends_with(&format!("_2{FASTQ_SUFFIX}")) {
            Mate::Reverse
        } else {
            Mate::Unknown
        }
    }
}

/// A FASTQ file found under the input folder, along with the sample
/// information encoded in its name.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct RawFile {
    pub path: PathBuf,
    pub filename: String,
    pub lane: Option<String>,
    pub barcode: Option<String>,
    pub mate: Mate,
    pub undecoded: bool,
}

impl RawFile {
    /// Describe the FASTQ file at `path`. Returns `None` if the path has no
    /// file name. A name that is not valid UTF-8 is parsed lossily; `path`
    /// keeps the exact name.
    pub fn new(path: impl AsRef<Path>) -> Option<RawFile> {
        let path = path.as_ref();
        let filename = path.file_name()?.to_string_lossy().into_owned();
        let fields = filename_fields(&filename);

        // The lane and barcode fields must be followed by another field.
        let interior = |idx: usize| {
            (idx + 1 < fields.len()).then(|| fields[idx].to_string())
        };

        Some(RawFile {
            lane: interior(1),
            barcode: interior(2),
            mate: Mate::from_filename(&filename),
            undecoded: filename.contains(UNDECODED_MARKER),
            path: path.to_path_buf(),
            filename,
        })
    }

    /// True if `token` is one of the interior fields of the file name, i.e.
    /// it is bounded by the field delimiter on both sides. This keeps `BC1`
    /// from matching a file of barcode `BC10`.
    pub fn has_token(&self, token: &str) -> bool {
        let fields = filename_fields(&self.filename);
        if fields.len() < 3 {
            return false;
        }
        fields[1..fields.len() - 1].iter().any(|&f| f == token)
    }
}

/// Split a file name into its `_`-delimited fields.
pub fn filename_fields(filename: &str) -> Vec<&str> {
    filename.split(FIELD_DELIMITER).collect()
}
