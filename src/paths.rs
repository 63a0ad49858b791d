//! Partition discovery: resolve year-month folders in range, then plan the
//! ordered list of data files to read.

use crate::config::YearFolderPolicy;
use crate::date::{PartitionValue, YearMonth};
use crate::error::{ExtractError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A partition folder that passed the range check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionFolder {
    pub name: String,
    pub value: PartitionValue,
    pub path: PathBuf,
}

/// One data file scheduled for reading. `seq` is its position in the run and
/// fixes where its rows land in the merged table.
#[derive(Clone, Debug)]
pub struct FileJob {
    pub seq: usize,
    pub folder: String,
    pub path: PathBuf,
}

/// Validate both bounds and their order. Touches no storage.
pub fn validate_range(start: &str, end: &str) -> Result<(YearMonth, YearMonth)> {
    let s = YearMonth::parse_strict(start)
        .ok_or_else(|| ExtractError::InvalidDateFormat { value: start.to_string() })?;
    let e = YearMonth::parse_strict(end)
        .ok_or_else(|| ExtractError::InvalidDateFormat { value: end.to_string() })?;
    if e < s {
        return Err(ExtractError::InvalidDateRange { start: start.to_string(), end: end.to_string() });
    }
    Ok((s, e))
}

/// Whether a partition value falls inside `[lo, hi]` under `policy`.
pub fn in_range(value: PartitionValue, lo: YearMonth, hi: YearMonth, policy: YearFolderPolicy) -> bool {
    match value {
        PartitionValue::Month(ym) => lo <= ym && ym <= hi,
        PartitionValue::Year(y) => match policy {
            YearFolderPolicy::Skip => false,
            YearFolderPolicy::WholeYear => {
                YearMonth::first_of_year(y) <= hi && lo <= YearMonth::last_of_year(y)
            }
        },
    }
}

fn list_dir(dir: &Path) -> Result<Vec<walkdir::DirEntry>> {
    // Surface a missing or unreadable root as its own error kind before walking.
    fs::metadata(dir).map_err(|e| ExtractError::from_io(dir, e))?;
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        match entry {
            Ok(ent) => out.push(ent),
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                let io = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
                return Err(ExtractError::from_io(&path, io));
            }
        }
    }
    Ok(out)
}

/// List the immediate partition folders of `base_dir` whose calendar value lies
/// in `[start, end]`, ordered by calendar value.
pub fn resolve_folders_with(
    base_dir: &Path,
    start: &str,
    end: &str,
    policy: YearFolderPolicy,
) -> Result<Vec<PartitionFolder>> {
    let (lo, hi) = validate_range(start, end)?;

    let mut folders = Vec::new();
    for ent in list_dir(base_dir)? {
        if !ent.file_type().is_dir() {
            continue;
        }
        let Some(name) = ent.file_name().to_str() else { continue };
        let Some(value) = PartitionValue::parse(name) else { continue };
        if let PartitionValue::Year(_) = value {
            if policy == YearFolderPolicy::Skip {
                tracing::warn!("skipping year-only partition folder {}", ent.path().display());
                continue;
            }
        }
        if in_range(value, lo, hi, policy) {
            folders.push(PartitionFolder { name: name.to_string(), value, path: ent.path().to_path_buf() });
        }
    }
    folders.sort_by(|a, b| a.value.cmp(&b.value).then_with(|| a.name.cmp(&b.name)));
    Ok(folders)
}

/// Folder names in range, using the default year-folder policy.
pub fn resolve_folders(base_dir: &Path, start: &str, end: &str) -> Result<Vec<String>> {
    Ok(resolve_folders_with(base_dir, start, end, YearFolderPolicy::default())?
        .into_iter()
        .map(|f| f.name)
        .collect())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Data files directly inside `folder` with extension `ext`, sorted by file name.
pub fn list_data_files(folder: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = list_dir(folder)?
        .into_iter()
        .filter(|ent| !ent.file_type().is_dir() && has_extension(ent.path(), ext))
        .map(|ent| ent.path().to_path_buf())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Materialize every file of every folder once, so the total is known before
/// the first read and no directory is listed twice.
pub fn plan_files(folders: &[PartitionFolder], ext: &str) -> Result<Vec<FileJob>> {
    let mut jobs = Vec::new();
    for folder in folders {
        for path in list_data_files(&folder.path, ext)? {
            jobs.push(FileJob { seq: jobs.len(), folder: folder.name.clone(), path });
        }
    }
    Ok(jobs)
}
