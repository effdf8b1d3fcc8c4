//! Per-client matching state for one collection run.

use std::collections::HashMap;

use crate::duplicate::{classify, Classification};
use crate::folder_name::ClientIdentity;
use crate::matching::SearchPatterns;
use crate::models::FolderEntry;

/// Search patterns and duplicate-detection state for a single client
/// folder, built at the start of processing that folder and dropped at
/// the end.
///
/// `known_sizes` only grows: every successful copy must be recorded with
/// [`record_copy`](Self::record_copy) before the next candidate is
/// classified, so later files in the same run are compared against
/// earlier copies too.
#[derive(Debug, Clone)]
pub struct MatchContext {
    identity: ClientIdentity,
    patterns: SearchPatterns,
    entries: HashMap<String, Option<u64>>,
    known_sizes: Vec<u64>,
    tolerance: u64,
}

impl MatchContext {
    pub fn new<I>(identity: ClientIdentity, existing: I, tolerance: u64) -> Self
    where
        I: IntoIterator<Item = FolderEntry>,
    {
        let mut entries = HashMap::new();
        let mut known_sizes = Vec::new();
        for entry in existing {
            if let Some(size) = entry.size {
                known_sizes.push(size);
            }
            entries.insert(entry.name, entry.size);
        }
        let patterns = SearchPatterns::from(&identity);
        Self {
            identity,
            patterns,
            entries,
            known_sizes,
            tolerance,
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn patterns(&self) -> &SearchPatterns {
        &self.patterns
    }

    pub fn known_sizes(&self) -> &[u64] {
        &self.known_sizes
    }

    pub fn classify(&self, name: &str, size: u64) -> Classification {
        classify(name, size, &self.entries, &self.known_sizes, self.tolerance)
    }

    /// Record a file that was just copied into the folder.
    pub fn record_copy(&mut self, name: &str, size: u64) {
        self.entries.insert(name.to_string(), Some(size));
        self.known_sizes.push(size);
    }
}
