//! Duplicate classification by file name and size.
//!
//! A candidate is an **exact duplicate** when the folder already holds a
//! file with the same name and the same size. Otherwise it is a **near
//! duplicate** when its size lies within a fixed tolerance of any size
//! already known for the folder, which suppresses re-scans and
//! re-renditions of the same document. Anything else is **novel** and may
//! be copied.
//!
//! Classification is a pure function of its inputs. The caller records
//! the size of each file it copies (see [`crate::MatchContext`]) before
//! classifying the next candidate.

use std::collections::HashMap;

/// Default near-duplicate tolerance in bytes (inclusive).
pub const DEFAULT_NEAR_TOLERANCE: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    ExactDuplicate,
    NearDuplicate,
    Novel,
}

impl Classification {
    pub fn is_novel(self) -> bool {
        self == Classification::Novel
    }
}

/// Whether two sizes are within `tolerance` bytes of each other.
pub fn is_near(a: u64, b: u64, tolerance: u64) -> bool {
    a.abs_diff(b) <= tolerance
}

/// Classify a candidate file against a folder's contents.
///
/// * `entries` maps file names present in the folder to their sizes
///   (`None` when unreadable).
/// * `known_sizes` holds every size already present in or copied into the
///   folder during the current run.
pub fn classify(
    name: &str,
    size: u64,
    entries: &HashMap<String, Option<u64>>,
    known_sizes: &[u64],
    tolerance: u64,
) -> Classification {
    if let Some(Some(existing)) = entries.get(name) {
        if *existing == size {
            return Classification::ExactDuplicate;
        }
    }

    if known_sizes
        .iter()
        .any(|&known| is_near(size, known, tolerance))
    {
        return Classification::NearDuplicate;
    }

    Classification::Novel
}
