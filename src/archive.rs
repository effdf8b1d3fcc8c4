//! Zip export of a dated root.
//!
//! Entries are stored relative to the root with `/` separators. Directory
//! entries are written too, so client folders that are still empty
//! survive a round trip through the archive.

use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::dated_root::DatedRoot;
use crate::error::{KycError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub files: usize,
    pub directories: usize,
    /// Uncompressed bytes of all archived files.
    pub bytes: u64,
}

/// Fail unless the root exists and has at least one entry.
fn require_contents(root: &DatedRoot) -> Result<&Path> {
    let path = root.require()?;
    let mut entries = fs::read_dir(path).map_err(|e| KycError::io(path, e))?;
    if entries.next().is_none() {
        return Err(KycError::RootEmpty(path.to_path_buf()));
    }
    Ok(path)
}

/// Zip the whole dated root into `writer`.
pub fn write_archive<W: Write + Seek>(root: &DatedRoot, writer: W) -> Result<ArchiveSummary> {
    let root_path = require_contents(root)?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);
    let mut summary = ArchiveSummary::default();

    for entry in WalkDir::new(root_path).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root_path).to_path_buf();
            KycError::io(path, e.into())
        })?;
        let relative = entry.path().strip_prefix(root_path).unwrap_or(entry.path());
        let name = archive_name(relative);

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
            summary.directories += 1;
        } else if entry.file_type().is_file() {
            let mut file = File::open(entry.path()).map_err(|e| KycError::io(entry.path(), e))?;
            zip.start_file(name, options)?;
            summary.bytes +=
                std::io::copy(&mut file, &mut zip).map_err(|e| KycError::io(entry.path(), e))?;
            summary.files += 1;
        }
    }

    zip.finish()?;
    Ok(summary)
}

/// Write the archive for `root` to `dest`.
///
/// Nothing is created when the root is missing or empty, or when `dest`
/// lies inside the root. A partially written archive is removed on
/// failure.
pub fn export_archive(root: &DatedRoot, dest: &Path) -> Result<ArchiveSummary> {
    let root_path = require_contents(root)?;
    if resolve(dest).starts_with(resolve(root_path)) {
        return Err(KycError::InvalidDestination(dest.to_path_buf()));
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| KycError::io(parent, e))?;
    }

    let file = File::create(dest).map_err(|e| KycError::io(dest, e))?;
    match write_archive(root, BufWriter::new(file)) {
        Ok(summary) => {
            info!(
                "Archived {} files ({} bytes) from {} to {}",
                summary.files,
                summary.bytes,
                root.path().display(),
                dest.display()
            );
            Ok(summary)
        }
        Err(e) => {
            if let Err(rm) = fs::remove_file(dest) {
                warn!("Could not remove partial archive {}: {}", dest.display(), rm);
            }
            Err(e)
        }
    }
}

/// Canonical form of `path`, resolving its deepest existing ancestor so
/// that a not-yet-created file can be compared against the root.
fn resolve(path: &Path) -> PathBuf {
    for ancestor in path.ancestors() {
        let probe = if ancestor.as_os_str().is_empty() {
            Path::new(".")
        } else {
            ancestor
        };
        if let Ok(real) = fs::canonicalize(probe) {
            let rest = path.strip_prefix(ancestor).unwrap_or(path);
            return real.join(rest);
        }
    }
    path.to_path_buf()
}

fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
