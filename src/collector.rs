//! Document collector.
//!
//! Walks a source directory tree and copies every file that belongs to a
//! client into that client's folder under the dated root, skipping
//! excluded, duplicate, and near-duplicate files.
//!
//! # Pipeline
//!
//! 1. Walk the source tree once into a [`SourceIndex`] (walk order kept).
//! 2. For each client folder, decode its name into search patterns and
//!    seed a [`MatchContext`] from the folder's current files.
//! 3. Probe every indexed file: match filter, then duplicate classifier,
//!    then copy. Each copy is recorded in the context before the next
//!    file is classified.
//!
//! Client contexts are independent, so probing one shared index in walk
//! order gives the same result as walking the tree again per client.
//!
//! Failures local to one file (unreadable, vanished, copy refused) or to
//! one folder (undecodable name, unreadable folder) are logged and
//! skipped; only a missing root or an invalid source aborts the run.

use globset::GlobSet;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use kyc_intake_core::folder_name::decode;
use kyc_intake_core::{CandidateName, Classification, MatchContext, MatchFilter, MatchOutcome};

use crate::config::Config;
use crate::dated_root::DatedRoot;
use crate::error::{KycError, Result};
use crate::inventory;
use crate::progress::{CollectProgressEvent, CollectProgressReporter, NoProgress};

/// Number of document names listed per client in a [`ClientSummary`].
const SUMMARY_DOCUMENTS: usize = 5;

/// A file discovered in the source tree.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: OsString,
    /// Lossy UTF-8 rendering of `file_name`, used for matching and logs.
    pub name: String,
    candidate: CandidateName,
}

/// Every candidate file under a source directory, in walk order.
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    files: Vec<SourceFile>,
}

impl SourceIndex {
    /// Walk `source`, skipping entries matched by `exclude` (relative to
    /// `source`) and anything under `prune`.
    pub fn build(
        source: &Path,
        prune: Option<&Path>,
        follow_symlinks: bool,
        exclude: &GlobSet,
    ) -> Self {
        let walker = WalkDir::new(source)
            .follow_links(follow_symlinks)
            .into_iter()
            .filter_entry(|entry| prune.map_or(true, |p| !entry.path().starts_with(p)));

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable path during walk: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(source).unwrap_or(path);
            if exclude.is_match(relative) {
                continue;
            }

            let file_name = entry.file_name().to_os_string();
            let name = file_name.to_string_lossy().into_owned();
            let parent = path
                .parent()
                .and_then(Path::file_name)
                .map(|p| p.to_string_lossy().into_owned());
            files.push(SourceFile {
                path: path.to_path_buf(),
                candidate: CandidateName::new(&name, parent.as_deref()),
                file_name,
                name,
            });
        }
        Self { files }
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Files copied into one client folder during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientOutcome {
    pub files_copied: u64,
    pub bytes_copied: u64,
}

/// Per-client line of a sweep report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSummary {
    pub folder_name: String,
    pub client_name: String,
    pub identifier: String,
    /// Files copied for this client in this run.
    pub files_found: u64,
    /// Files now in the folder.
    pub total_files: usize,
    pub is_empty: bool,
    /// Up to five file names now in the folder, sorted.
    pub documents: Vec<String>,
}

/// Result of a full sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectReport {
    pub files_copied: u64,
    pub bytes_copied: u64,
    pub folders_processed: usize,
    pub folders_skipped: usize,
    pub clients: Vec<ClientSummary>,
}

impl CollectReport {
    /// Total copied size in KiB, rounded to two decimals.
    pub fn total_size_kb(&self) -> f64 {
        (self.bytes_copied as f64 / 1024.0 * 100.0).round() / 100.0
    }
}

/// Copies matching source files into client folders.
pub struct Collector {
    filter: MatchFilter,
    tolerance: u64,
    follow_symlinks: bool,
    exclude: GlobSet,
    progress: Box<dyn CollectProgressReporter>,
}

impl Collector {
    pub fn new(filter: MatchFilter, tolerance: u64) -> Self {
        Self {
            filter,
            tolerance,
            follow_symlinks: false,
            exclude: GlobSet::empty(),
            progress: Box::new(NoProgress),
        }
    }

    /// Build a collector from configuration. `exclusions_enabled`
    /// overrides `matching.exclusions_enabled` for this run.
    pub fn from_config(config: &Config, exclusions_enabled: Option<bool>) -> Result<Self> {
        let enabled = exclusions_enabled.unwrap_or(config.matching.exclusions_enabled);
        let mut collector = Self::new(
            config.matching.filter(enabled),
            config.matching.near_duplicate_tolerance,
        );
        collector.follow_symlinks = config.collect.follow_symlinks;
        collector.exclude = config.collect.exclude_set()?;
        Ok(collector)
    }

    pub fn with_progress(mut self, progress: Box<dyn CollectProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Sweep every client folder under `root` against `source`.
    pub fn collect_all(&self, root: &DatedRoot, source: &Path) -> Result<CollectReport> {
        let root_path = root.require()?;
        validate_source(source)?;

        let folders = inventory::client_folders(root_path)?;
        let index = self.index(root, source)?;

        let mut report = CollectReport::default();
        let total = folders.len() as u64;
        for (i, folder_name) in folders.iter().enumerate() {
            self.progress.report(CollectProgressEvent::Client {
                folder: folder_name.clone(),
                n: i as u64 + 1,
                total,
            });

            let outcome = match self.process_client(root, folder_name, &index) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Skipping folder '{}': {}", folder_name, e);
                    report.folders_skipped += 1;
                    continue;
                }
            };
            report.files_copied += outcome.files_copied;
            report.bytes_copied += outcome.bytes_copied;
            report.folders_processed += 1;
            match summarize_client(root, folder_name, &outcome) {
                Ok(summary) => report.clients.push(summary),
                Err(e) => warn!("Cannot summarize folder '{}': {}", folder_name, e),
            }
        }

        info!(
            "Sweep of {} complete: {} files ({} bytes) copied, {} folders processed, {} skipped",
            root.path().display(),
            report.files_copied,
            report.bytes_copied,
            report.folders_processed,
            report.folders_skipped
        );
        Ok(report)
    }

    /// Collect documents for one named client folder from `source`.
    pub fn collect_single(
        &self,
        root: &DatedRoot,
        source: &Path,
        folder_name: &str,
    ) -> Result<ClientOutcome> {
        validate_folder_name(folder_name)?;
        validate_source(source)?;
        root.require()?;

        if !root.folder(folder_name).is_dir() {
            return Err(KycError::FolderNotFound(folder_name.to_string()));
        }
        decode(folder_name)?;

        let index = self.index(root, source)?;
        let outcome = self.process_client(root, folder_name, &index)?;
        info!(
            "Single collection for '{}': {} files copied",
            folder_name, outcome.files_copied
        );
        Ok(outcome)
    }

    fn index(&self, root: &DatedRoot, source: &Path) -> Result<SourceIndex> {
        let source = fs::canonicalize(source).map_err(|e| KycError::io(source, e))?;
        let root_path = fs::canonicalize(root.path()).map_err(|e| KycError::io(root.path(), e))?;

        self.progress.report(CollectProgressEvent::Indexing {
            source: source.display().to_string(),
        });
        let index = SourceIndex::build(
            &source,
            Some(&root_path),
            self.follow_symlinks,
            &self.exclude,
        );
        self.progress.report(CollectProgressEvent::Indexed {
            files: index.len() as u64,
        });
        debug!("Indexed {} files under {}", index.len(), source.display());
        Ok(index)
    }

    fn process_client(
        &self,
        root: &DatedRoot,
        folder_name: &str,
        index: &SourceIndex,
    ) -> Result<ClientOutcome> {
        let identity = decode(folder_name)?;
        let folder = root.folder(folder_name);
        let existing = inventory::folder_files(&folder)?;
        let mut ctx = MatchContext::new(identity, existing, self.tolerance);

        info!(
            "Processing client: {} ({})",
            ctx.identity().name,
            ctx.identity().identifier
        );

        let mut outcome = ClientOutcome::default();
        for file in index.files() {
            match self.filter.evaluate(ctx.patterns(), &file.candidate) {
                MatchOutcome::Irrelevant => continue,
                MatchOutcome::Excluded(word) => {
                    debug!("Excluding {} (contains '{}')", file.name, word);
                    continue;
                }
                MatchOutcome::Eligible => {}
            }

            let size = match fs::metadata(&file.path) {
                Ok(meta) if meta.is_file() => meta.len(),
                Ok(_) => continue,
                Err(e) => {
                    warn!("Cannot read size of {}: {}", file.path.display(), e);
                    continue;
                }
            };

            match ctx.classify(&file.name, size) {
                Classification::ExactDuplicate => {
                    debug!("Duplicate found, skipping: {}", file.name);
                    continue;
                }
                Classification::NearDuplicate => {
                    debug!("Near-duplicate by size found, skipping: {}", file.name);
                    continue;
                }
                Classification::Novel => {}
            }

            let dest = folder.join(&file.file_name);
            match fs::copy(&file.path, &dest) {
                Ok(bytes) => {
                    ctx.record_copy(&file.name, bytes);
                    outcome.files_copied += 1;
                    outcome.bytes_copied += bytes;
                    info!("Copied {} to {}", file.name, folder_name);
                }
                Err(e) => warn!(
                    "Error copying {} to {}: {}",
                    file.path.display(),
                    folder.display(),
                    e
                ),
            }
        }
        Ok(outcome)
    }
}

fn validate_source(source: &Path) -> Result<()> {
    if source.is_dir() {
        Ok(())
    } else {
        Err(KycError::InvalidSource(source.to_path_buf()))
    }
}

/// A client folder name must name a direct child of the root.
fn validate_folder_name(folder_name: &str) -> Result<()> {
    let trimmed = folder_name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || folder_name.contains(['/', '\\'])
    {
        return Err(KycError::InvalidFolderName(folder_name.to_string()));
    }
    Ok(())
}

fn summarize_client(
    root: &DatedRoot,
    folder_name: &str,
    outcome: &ClientOutcome,
) -> Result<ClientSummary> {
    let identity = decode(folder_name)?;
    let documents = inventory::document_names(&root.folder(folder_name))?;
    Ok(ClientSummary {
        folder_name: folder_name.to_string(),
        client_name: identity.name,
        identifier: identity.identifier,
        files_found: outcome.files_copied,
        total_files: documents.len(),
        is_empty: documents.is_empty(),
        documents: documents.into_iter().take(SUMMARY_DOCUMENTS).collect(),
    })
}
