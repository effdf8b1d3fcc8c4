//! Client intake: turn an uploaded client table into client folders.
//!
//! The table is either CSV or an Excel workbook (first sheet). It has no
//! header row. Column 0 is the client identifier and column 1 the client
//! name; further columns are ignored. Rows with a blank identifier or
//! name are skipped, not rejected.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::Serialize;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{info, warn};

use kyc_intake_core::ClientRecord;

use crate::dated_root::DatedRoot;
use crate::error::{KycError, Result};

/// Records parsed from an intake table.
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    pub records: Vec<ClientRecord>,
    pub skipped: usize,
}

/// Outcome of provisioning client folders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntakeReport {
    /// Folders that did not exist and were created.
    pub created: usize,
    /// Folders that were already present.
    pub existing: usize,
    /// Rows skipped because the identifier or name was blank.
    pub skipped: usize,
    /// Folders that could not be created.
    pub failed: usize,
}

/// Encoding of an intake table, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    /// `.xlsx`, `.xlsm`, `.xls`, or `.ods`.
    Workbook,
}

impl TableFormat {
    pub const ACCEPTED: &'static str = ".csv, .xlsx, .xlsm, .xls, .ods";

    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(TableFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Some(TableFormat::Workbook),
            _ => None,
        }
    }
}

/// Folds raw rows into records, enforcing the two-column minimum.
#[derive(Default)]
struct RowCollector {
    parsed: ParsedRows,
    widest: usize,
}

impl RowCollector {
    fn push(&mut self, width: usize, identifier: Option<&str>, name: Option<&str>) {
        self.widest = self.widest.max(width);
        let record = match (identifier, name) {
            (Some(identifier), Some(name)) => ClientRecord::new(identifier, name),
            _ => None,
        };
        match record {
            Some(record) => self.parsed.records.push(record),
            None => self.parsed.skipped += 1,
        }
    }

    fn finish(self) -> Result<ParsedRows> {
        if self.widest < 2 {
            return Err(KycError::InvalidUpload(
                "table should have at least two columns: identifier and name".to_string(),
            ));
        }
        Ok(self.parsed)
    }
}

pub fn parse_client_rows<R: Read>(reader: R) -> Result<ParsedRows> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = RowCollector::default();
    for row in csv_reader.records() {
        let row = row.map_err(|e| KycError::InvalidUpload(format!("cannot read table: {}", e)))?;
        rows.push(row.len(), row.get(0), row.get(1));
    }
    rows.finish()
}

/// Parse the first sheet of an Excel or OpenDocument workbook.
///
/// Columns are absolute: a sheet whose used range starts at column B
/// still reads identifiers from column A (and finds them blank).
pub fn parse_workbook_rows(bytes: &[u8]) -> Result<ParsedRows> {
    let invalid = |e: calamine::Error| KycError::InvalidUpload(format!("cannot read workbook: {}", e));

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(invalid)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| KycError::InvalidUpload("workbook has no sheets".to_string()))?
        .map_err(invalid)?;

    let (_, first_col) = range.start().unwrap_or((0, 0));
    let width = first_col as usize + range.width();
    let cell = |row: &[Data], col: u32| -> Option<String> {
        let i = col.checked_sub(first_col)? as usize;
        row.get(i).map(|value| value.to_string())
    };

    let mut rows = RowCollector::default();
    for row in range.rows() {
        let identifier = cell(row, 0);
        let name = cell(row, 1);
        rows.push(width, identifier.as_deref(), name.as_deref());
    }
    rows.finish()
}

/// Parse an intake table in the given format.
pub fn read_client_table(format: TableFormat, bytes: &[u8]) -> Result<ParsedRows> {
    match format {
        TableFormat::Csv => parse_client_rows(bytes),
        TableFormat::Workbook => parse_workbook_rows(bytes),
    }
}

/// Ensure the dated root and one folder per record exist.
///
/// Only failing to create the root is fatal; a folder that cannot be
/// created is logged and counted in [`IntakeReport::failed`].
pub fn provision_folders(root: &DatedRoot, records: &[ClientRecord]) -> Result<IntakeReport> {
    root.ensure()?;

    let mut report = IntakeReport::default();
    for record in records {
        let path = root.folder(&record.folder_name());
        if path.is_dir() {
            report.existing += 1;
            continue;
        }
        match std::fs::create_dir_all(&path) {
            Ok(()) => {
                info!("Created client folder {}", path.display());
                report.created += 1;
            }
            Err(e) => {
                warn!("Could not create folder {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Parse an intake table and provision its folders.
pub fn run_intake(root: &DatedRoot, format: TableFormat, bytes: &[u8]) -> Result<IntakeReport> {
    let parsed = read_client_table(format, bytes)?;
    let mut report = provision_folders(root, &parsed.records)?;
    report.skipped = parsed.skipped;
    info!(
        "Intake into {}: {} created, {} existing, {} skipped, {} failed",
        root.path().display(),
        report.created,
        report.existing,
        report.skipped,
        report.failed
    );
    Ok(report)
}
