//! Validation report export.

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::domain::TSError;
use crate::list_view::ListView;

/// Renders every record of `view` (not only the filtered ones) as csv, one
/// column per descriptor.
pub fn report_csv(view: &ListView) -> Result<String, TSError> {
    let columns: Vec<Column> = view
        .columns()
        .iter()
        .map(|c| {
            let values: Vec<String> = view.rows().iter().map(|r| r.text(&c.key)).collect();
            Column::new(c.key.as_str().into(), values)
        })
        .collect();
    let mut df = DataFrame::new(columns)?;

    let mut buf: Vec<u8> = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)?;
    String::from_utf8(buf).map_err(|e| TSError::ExportFailed(e.to_string()))
}

pub struct ExportedReport {
    pub path: PathBuf,
    pub csv: String,
}

/// Writes the report to a timestamped file in `dir`.
pub fn export_report(view: &ListView, dir: &Path) -> Result<ExportedReport, TSError> {
    let csv = report_csv(view)?;
    fs::create_dir_all(dir)?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("validation-report-{stamp}.csv"));
    fs::write(&path, &csv)?;
    info!("Exported {} rows to {}", view.rows().len(), path.display());
    Ok(ExportedReport { path, csv })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RowId;
    use crate::views::validation_report;

    #[test]
    fn csv_contains_header_and_all_rows() {
        let mut report = validation_report();
        report.set_search_text("warranty");
        report.delete_row(&RowId::from("4"));
        let csv = report_csv(&report).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "clause,date,status");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "Payment Terms Section 3.1,2025-04-01,Valid");
    }

    #[test]
    fn export_writes_file() {
        let dir = std::env::temp_dir().join(format!("tsdesk-export-{}", std::process::id()));
        let report = export_report(&validation_report(), &dir).unwrap();
        let written = fs::read_to_string(&report.path).unwrap();
        assert_eq!(written, report.csv);
        assert!(written.starts_with("clause,date,status"));
        assert!(written.contains("Warranty Section 5.2,2025-03-28,Invalid"));
        fs::remove_file(report.path).unwrap();
    }
}
