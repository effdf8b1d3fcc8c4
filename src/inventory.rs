//! Folder inventory for the dated root.
//!
//! A client folder is "empty" when it has no entries at all. Nested
//! folders are not inspected, so a client folder containing only an empty
//! subfolder counts as non-empty.

use std::fs;
use std::path::Path;
use tracing::warn;

use kyc_intake_core::FolderEntry;

use crate::dated_root::DatedRoot;
use crate::error::{KycError, Result};

/// Names of the root's immediate subdirectories, in directory-listing order.
pub fn client_folders(root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root).map_err(|e| KycError::io(root, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!("Skipping folder with non UTF-8 name: {:?}", raw),
        }
    }
    Ok(names)
}

/// Sorted names of client folders with zero entries.
///
/// Returns an empty list when the root does not exist yet.
pub fn empty_folders(root: &DatedRoot) -> Vec<String> {
    if !root.exists() {
        return Vec::new();
    }
    let folders = match client_folders(root.path()) {
        Ok(folders) => folders,
        Err(e) => {
            warn!("Cannot list {}: {}", root.path().display(), e);
            return Vec::new();
        }
    };

    let mut empty: Vec<String> = folders
        .into_iter()
        .filter(|name| is_empty_dir(&root.folder(name)))
        .collect();
    empty.sort();
    empty
}

fn is_empty_dir(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(e) => {
            warn!("Cannot read {}: {}", path.display(), e);
            false
        }
    }
}

/// Regular files directly inside `folder`, with sizes where readable.
///
/// Names that are not valid UTF-8 are rendered lossily, never dropped.
pub fn folder_files(folder: &Path) -> Result<Vec<FolderEntry>> {
    let entries = fs::read_dir(folder).map_err(|e| KycError::io(folder, e))?;
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        // Same rendering as source file names, so a copied file is
        // recognised as an exact duplicate on the next sweep.
        let name = entry.file_name().to_string_lossy().into_owned();
        let size = match fs::metadata(&path) {
            Ok(meta) => Some(meta.len()),
            Err(e) => {
                warn!("Cannot read size of {}: {}", path.display(), e);
                None
            }
        };
        files.push(FolderEntry::new(name, size));
    }
    Ok(files)
}

/// Sorted file names directly inside `folder`.
pub fn document_names(folder: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = folder_files(folder)?.into_iter().map(|f| f.name).collect();
    names.sort();
    Ok(names)
}
