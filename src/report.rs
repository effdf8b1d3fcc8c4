//! Summary export: one row per client folder listing its documents.

use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

use kyc_intake_core::folder_name::decode;

use crate::dated_root::DatedRoot;
use crate::error::{KycError, Result};
use crate::inventory;

const NO_DOCUMENTS: &str = "No documents";
const UNKNOWN_IDENTIFIER: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub identifier: String,
    pub name: String,
    /// File names in the folder, sorted.
    pub documents: Vec<String>,
}

impl SummaryRow {
    fn documents_cell(&self) -> String {
        if self.documents.is_empty() {
            NO_DOCUMENTS.to_string()
        } else {
            self.documents.join(", ")
        }
    }
}

/// Build summary rows for every client folder, sorted by folder name.
///
/// Folders whose names do not decode are reported with an `N/A`
/// identifier and the whole folder name as the client name.
pub fn build_summary(root: &DatedRoot) -> Result<Vec<SummaryRow>> {
    let root_path = root.require()?;
    let mut folders = inventory::client_folders(root_path)?;
    folders.sort();

    let mut rows = Vec::with_capacity(folders.len());
    for folder_name in folders {
        let documents = inventory::document_names(&root.folder(&folder_name))?;
        let (identifier, name) = match decode(&folder_name) {
            Ok(identity) => (identity.identifier, identity.name),
            Err(_) => (UNKNOWN_IDENTIFIER.to_string(), folder_name.clone()),
        };
        rows.push(SummaryRow {
            identifier,
            name,
            documents,
        });
    }
    Ok(rows)
}

pub fn write_summary<W: Write>(rows: &[SummaryRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["Identifier", "Name", "Documents Found"])?;
    for row in rows {
        csv_writer.write_record([
            row.identifier.as_str(),
            row.name.as_str(),
            row.documents_cell().as_str(),
        ])?;
    }
    csv_writer.flush().map_err(|e| KycError::io("<summary>", e))?;
    Ok(())
}

/// Render the summary for `root` as CSV bytes.
pub fn render_summary(root: &DatedRoot) -> Result<Vec<u8>> {
    let rows = build_summary(root)?;
    let mut buf = Vec::new();
    write_summary(&rows, &mut buf)?;
    Ok(buf)
}

/// Write the summary for `root` to `dest`. Returns the number of rows.
pub fn export_summary(root: &DatedRoot, dest: &Path) -> Result<usize> {
    let rows = build_summary(root)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| KycError::io(parent, e))?;
    }
    let file = File::create(dest).map_err(|e| KycError::io(dest, e))?;
    write_summary(&rows, file)?;
    info!("Wrote summary of {} folders to {}", rows.len(), dest.display());
    Ok(rows.len())
}
