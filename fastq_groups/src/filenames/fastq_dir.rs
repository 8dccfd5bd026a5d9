//! Scan a run folder for FASTQ files.

use crate::errors::FastqGroupError;
use crate::filenames::{RawFile, FASTQ_SUFFIX};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Check that `path` is an existing directory.
pub fn check_input_dir(path: &Path) -> Result<(), FastqGroupError> {
    if !path.exists() {
        return Err(FastqGroupError::InputDirMissing {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(FastqGroupError::InputNotDir {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// The subfolders and the FASTQ files directly inside `dir`. Symlinked
/// folders are not followed.
fn scan_dir(dir: &Path) -> Result<(Vec<PathBuf>, Vec<RawFile>)> {
    let entries: Vec<(bool, PathBuf)> = std::fs::read_dir(dir)
        .with_context(|| format!("Scanning {}", dir.display()))?
        .map(|entry| -> std::io::Result<(bool, PathBuf)> {
            let entry = entry?;
            Ok((entry.file_type()?.is_dir(), entry.path()))
        })
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("Scanning {}", dir.display()))?;

    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for (is_dir, path) in entries {
        if is_dir {
            subdirs.push(path);
            continue;
        }
        let Some(file) = RawFile::new(&path) else {
            continue;
        };
        if !file.filename.ends_with(FASTQ_SUFFIX) || !path.is_file() {
            continue;
        }
        if path.file_name().and_then(OsStr::to_str).is_none() {
            warn!(
                "FASTQ name is not valid UTF-8, matching it as {}: {}",
                file.filename,
                path.display()
            );
        }
        files.push(file);
    }
    Ok((subdirs, files))
}

/// Find every `*.fq.gz` file at any depth underneath `root`, including files
/// whose names are not valid UTF-8. The result is sorted by path, so
/// repeated calls on an unchanged folder return the same list.
pub fn find_fastq_files(root: impl AsRef<Path>) -> Result<Vec<RawFile>> {
    let root = root.as_ref();
    check_input_dir(root)?;

    let mut pending = vec![root.to_path_buf()];
    let mut files = Vec::new();
    while let Some(dir) = pending.pop() {
        let (subdirs, found) = scan_dir(&dir)?;
        pending.extend(subdirs);
        files.extend(found);
    }
    files.sort();

    debug!("found {} FASTQ files under {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::{create_dir_all, File};

    fn touch(path: &Path) {
        create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    #[test]
    fn test_find_recursive() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("FC001");
        touch(&root.join("FC001_L01_BC01_1.fq.gz"));
        touch(&root.join("L02/FC001_L02_BC01_2.fq.gz"));
        touch(&root.join("L02/deeper/FC001_L02_BC02_1.fq.gz"));
        touch(&root.join("FC001_L01_BC01_1.fastq.gz"));
        touch(&root.join("notes.txt"));

        let found: Vec<_> = find_fastq_files(&root)?
            .into_iter()
            .map(|f| f.filename)
            .collect();
        assert_eq!(
            found,
            vec![
                "FC001_L01_BC01_1.fq.gz",
                "FC001_L02_BC01_2.fq.gz",
                "FC001_L02_BC02_1.fq.gz",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_find_is_repeatable() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["b/X_L1_B_2.fq.gz", "a/X_L1_B_1.fq.gz", "X_L2_A_1.fq.gz"] {
            touch(&dir.path().join(name));
        }
        assert_eq!(find_fastq_files(dir.path())?, find_fastq_files(dir.path())?);
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_find_non_utf8_name() -> Result<()> {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir()?;
        let odd = dir
            .path()
            .join(OsStr::from_bytes(b"FC001_L01_BC\xff_1.fq.gz"));
        touch(&odd);
        touch(&dir.path().join("FC001_L01_BC01_1.fq.gz"));

        let found = find_fastq_files(dir.path())?;
        assert_eq!(found.len(), 2);
        let f = found.iter().find(|f| f.path == odd).unwrap();
        assert_eq!(f.filename, "FC001_L01_BC\u{FFFD}_1.fq.gz");
        assert_eq!(f.lane.as_deref(), Some("L01"));
        Ok(())
    }

    #[test]
    fn test_dir_named_like_fastq() -> Result<()> {
        let dir = tempfile::tempdir()?;
        touch(&dir.path().join("FC001_L01_BC01_1.fq.gz/FC001_L01_BC01_2.fq.gz"));
        let found: Vec<_> = find_fastq_files(dir.path())?
            .into_iter()
            .map(|f| f.filename)
            .collect();
        assert_eq!(found, vec!["FC001_L01_BC01_2.fq.gz"]);
        Ok(())
    }

    #[test]
    fn test_empty_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(find_fastq_files(dir.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = find_fastq_files(&missing).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FastqGroupError>(),
            Some(&FastqGroupError::InputDirMissing { path: missing })
        );
    }

    #[test]
    fn test_not_a_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("FC001_L01_BC01_1.fq.gz");
        touch(&file);
        let err = find_fastq_files(&file).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FastqGroupError>(),
            Some(&FastqGroupError::InputNotDir { path: file })
        );
    }
}
