//! Errors that stop a run before any sample is processed.
use std::path::PathBuf;

/// Configuration problems detected while locating and grouping FASTQ files.
/// None of these can be skipped on a per-sample basis.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FastqGroupError {
    #[error("Input folder {path:?} does not exist.")]
    InputDirMissing { path: PathBuf },

    #[error("Input path {path:?} is not a directory.")]
    InputNotDir { path: PathBuf },

    #[error("Could not determine a flowcell ID from the input folder name {path:?}.")]
    NoFlowcellId { path: PathBuf },

    #[error(
        "No valid barcodes found. Barcodes are read from the sample list, or taken from the \
         third '_'-separated field of FASTQ names like FC001_L01_BC01_1.fq.gz \
         (files containing 'undecoded' are ignored)."
    )]
    NoBarcodes,

    #[error(
        "None of the {n_files} FASTQ file(s) under {path:?} matched any of the {n_barcodes} \
         barcode(s)."
    )]
    NoSamples {
        path: PathBuf,
        n_files: usize,
        n_barcodes: usize,
    },
}
