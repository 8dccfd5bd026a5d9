//! Tools for turning a directory of paired, gzipped FASTQ files into samples.
//! Major functionality includes:
//! * Find `*.fq.gz` files under a sequencing run folder
//! * Resolve the barcodes of a run, either from a sample list or from filenames
//! * Group files into samples keyed by flowcell, lane and barcode
//! * Check that the two mates of a sample hold the same number of reads

pub mod barcodes;
pub mod errors;
pub mod filenames;
pub mod pair_check;
pub mod sample_groups;

pub use barcodes::{infer_barcodes, read_barcodes, BarcodeSource};
pub use errors::FastqGroupError;
pub use filenames::fastq_dir::find_fastq_files;
pub use filenames::{Mate, RawFile};
pub use pair_check::{check_pair, FailReason, PairCheck, SkipReason, ValidPair};
pub use sample_groups::{flowcell_id, group_samples, SampleGroup, SampleGroups, SampleKey};
