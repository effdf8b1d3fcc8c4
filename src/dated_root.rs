//! The per-day root directory holding every client folder.
//!
//! The date is chosen once at the boundary (CLI invocation or HTTP
//! request) and carried through the whole operation, so an operation
//! that runs past midnight keeps targeting the root it started with.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::config::WorkspaceConfig;
use crate::error::{KycError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedRoot {
    date: NaiveDate,
    path: PathBuf,
}

impl DatedRoot {
    pub fn for_date(workspace: &WorkspaceConfig, date: NaiveDate) -> Self {
        let dir_name = format!("{} {}", workspace.root_prefix, date.format("%Y-%m-%d"));
        Self {
            date,
            path: workspace.base_dir.join(dir_name),
        }
    }

    /// Root for the current local calendar day.
    pub fn today(workspace: &WorkspaceConfig) -> Self {
        Self::for_date(workspace, chrono::Local::now().date_naive())
    }

    /// Root for `pinned` when given, otherwise for today.
    pub fn resolve(workspace: &WorkspaceConfig, pinned: Option<NaiveDate>) -> Self {
        match pinned {
            Some(date) => Self::for_date(workspace, date),
            None => Self::today(workspace),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Fail with [`KycError::RootNotFound`] unless the root directory exists.
    pub fn require(&self) -> Result<&Path> {
        if self.exists() {
            Ok(&self.path)
        } else {
            Err(KycError::RootNotFound(self.path.clone()))
        }
    }

    /// Create the root (and its parents) if missing.
    pub fn ensure(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.path).map_err(|e| KycError::io(&self.path, e))?;
        Ok(&self.path)
    }

    pub fn folder(&self, folder_name: &str) -> PathBuf {
        self.path.join(folder_name)
    }
}

/// Parse a `YYYY-MM-DD` date as accepted by `--date`.
pub fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}
