//! Core data models shared by the intake, matching, and collection stages.

use serde::Serialize;

/// One row of the intake table: a client identifier and display name.
///
/// Both fields are trimmed and guaranteed non-empty. Rows that fail this
/// are skipped by [`ClientRecord::new`] rather than reported as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRecord {
    pub identifier: String,
    pub name: String,
}

impl ClientRecord {
    /// Build a record from raw cells, returning `None` when either cell is
    /// empty or whitespace-only.
    pub fn new(identifier: &str, name: &str) -> Option<Self> {
        let identifier = identifier.trim();
        let name = name.trim();
        if identifier.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            identifier: identifier.to_string(),
            name: name.to_string(),
        })
    }

    /// The folder name this client's documents are collected into.
    pub fn folder_name(&self) -> String {
        crate::folder_name::encode(&self.name, &self.identifier)
    }
}

/// A file already present in a client folder.
///
/// `size` is `None` when the file's metadata could not be read; such an
/// entry can never be claimed as an exact duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    pub name: String,
    pub size: Option<u64>,
}

impl FolderEntry {
    pub fn new(name: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_trims_cells() {
        let rec = ClientRecord::new("  123 ", " Jane Doe\t").unwrap();
        assert_eq!(rec.identifier, "123");
        assert_eq!(rec.name, "Jane Doe");
        assert_eq!(rec.folder_name(), "Jane Doe 123");
    }

    #[test]
    fn test_record_rejects_blank_cells() {
        assert!(ClientRecord::new("456", "  ").is_none());
        assert!(ClientRecord::new("", "Jane Doe").is_none());
        assert!(ClientRecord::new(" \t", "Jane Doe").is_none());
    }
}
