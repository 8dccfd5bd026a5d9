//! Layout of the output folder.
//!
//! ```text
//! <root>/
//!   fastp/<sample>.html, <sample>.json   per-sample fastp reports
//!   <lane>/<sample>_fp_1.fq.gz, _2.fq.gz  cleaned reads
//!   run_summary.json
//! ```

use anyhow::{Context, Result};
use fastq_groups::SampleKey;
use serde::Serialize;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

const REPORT_DIR: &str = "fastp";
const SUMMARY_FILE: &str = "run_summary.json";

/// Files written by the fastp run of one sample.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub forward: PathBuf,
    pub reverse: PathBuf,
    pub html: PathBuf,
    pub json: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

/// Create `dir` and its parents. Succeeds if the folder already exists,
/// including when another worker created it concurrently.
fn ensure_dir(dir: &Path) -> Result<()> {
    create_dir_all(dir).with_context(|| format!("Creating output folder {}", dir.display()))
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OutputLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn report_dir(&self) -> PathBuf {
        self.root.join(REPORT_DIR)
    }

    pub fn lane_dir(&self, lane: &str) -> PathBuf {
        self.root.join(lane)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE)
    }

    /// Create the output root and the report folder.
    pub fn create(&self) -> Result<()> {
        ensure_dir(&self.root)?;
        ensure_dir(&self.report_dir())
    }

    /// Create the folder holding the cleaned reads of `lane`.
    pub fn create_lane_dir(&self, lane: &str) -> Result<PathBuf> {
        let dir = self.lane_dir(lane);
        ensure_dir(&dir)?;
        Ok(dir)
    }

    /// The output files of `sample`; no folder is created.
    pub fn sample_outputs(&self, sample: &SampleKey) -> OutputPaths {
        let lane_dir = self.lane_dir(&sample.lane);
        let report_dir = self.report_dir();
        OutputPaths {
            forward: lane_dir.join(format!("{sample}_fp_1.fq.gz")),
            reverse: lane_dir.join(format!("{sample}_fp_2.fq.gz")),
            html: report_dir.join(format!("{sample}.html")),
            json: report_dir.join(format!("{sample}.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_outputs() {
        let layout = OutputLayout::new("/out/FC001_fp");
        let key = SampleKey::new("FC001", "L01", "BC01");
        assert_eq!(
            layout.sample_outputs(&key),
            OutputPaths {
                forward: "/out/FC001_fp/L01/FC001_L01_BC01_fp_1.fq.gz".into(),
                reverse: "/out/FC001_fp/L01/FC001_L01_BC01_fp_2.fq.gz".into(),
                html: "/out/FC001_fp/fastp/FC001_L01_BC01.html".into(),
                json: "/out/FC001_fp/fastp/FC001_L01_BC01.json".into(),
            }
        );
    }

    #[test]
    fn test_create_is_idempotent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let layout = OutputLayout::new(dir.path().join("a/b/FC001_fp"));
        layout.create()?;
        layout.create()?;
        assert!(layout.report_dir().is_dir());

        // Many workers racing to create the same lane folder.
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| layout.create_lane_dir("L01").unwrap());
            }
        });
        assert!(layout.lane_dir("L01").is_dir());
        Ok(())
    }

    #[test]
    fn test_create_fails_under_a_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("not_a_dir");
        std::fs::write(&file, "")?;
        let layout = OutputLayout::new(file.join("out"));
        let err = layout.create().unwrap_err();
        assert!(err.to_string().starts_with("Creating output folder"), "{err}");
        Ok(())
    }
}
