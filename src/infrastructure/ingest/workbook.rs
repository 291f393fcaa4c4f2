// ============================================================
// WORKBOOK SOURCE
// ============================================================
// calamine-backed ingestion of binary spreadsheets, first sheet only

use std::path::PathBuf;

use calamine::{open_workbook_auto, Data, Reader};

use crate::domain::error::{AppError, Result};
use crate::domain::table::{is_blank_row, RawRow};

use super::RowSource;

/// Reads the first sheet of a workbook into the shared header-row-plus-data
/// contract. calamine materializes the sheet on open; typical workbook
/// uploads are small, the 1GB case is delimited text.
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for WorkbookSource {
    fn open_rows(&self) -> Result<Box<dyn Iterator<Item = Result<RawRow>> + Send + '_>> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            AppError::IoError(format!("Failed to open workbook {}: {}", self.path.display(), e))
        })?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::ParseError("No worksheet found in workbook".to_string()))?
            .map_err(|e| AppError::ParseError(format!("Failed to read worksheet: {}", e)))?;

        let rows: Vec<RawRow> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<RawRow>())
            .filter(|row| !is_blank_row(row))
            .collect();

        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}

/// Render a cell to the string form the role resolver and normalizer expect.
/// Serial-date floats keep their numeric form (no trailing `.0`) so the date
/// normalizer can recognize them.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_float(*f),
        Data::DateTime(dt) => format_float(dt.as_f64()),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_dates_render_without_fraction() {
        assert_eq!(cell_text(&Data::Float(46026.0)), "46026");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(format_float(46026.5), "46026.5");
    }

    #[test]
    fn empty_and_error_cells_read_as_empty() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(
            cell_text(&Data::Error(calamine::CellErrorType::Div0)),
            ""
        );
    }

    #[test]
    fn text_cells_pass_through() {
        assert_eq!(
            cell_text(&Data::String("Brazil".to_string())),
            "Brazil"
        );
        assert_eq!(cell_text(&Data::Int(7)), "7");
    }

    #[test]
    fn missing_workbook_is_an_io_error() {
        let source = WorkbookSource::new("/nonexistent/contacts.xlsx");
        assert!(matches!(
            source.open_rows().err(),
            Some(AppError::IoError(_))
        ));
    }
}
