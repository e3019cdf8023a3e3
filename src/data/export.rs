use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};

use super::error::{ColumnError, ExportError};
use super::model::{CellValue, RecordTable};
use crate::rules::ReportRules;

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Keep only `columns`, in the order given.
pub fn project(table: &RecordTable, columns: &[String]) -> Result<RecordTable, ColumnError> {
    let indices = columns
        .iter()
        .map(|name| {
            table.column_index(name).ok_or_else(|| ColumnError {
                column: name.clone(),
                available: table.column_names(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(table.select_columns(&indices))
}

// ---------------------------------------------------------------------------
// Serialisation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Spreadsheet,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Spreadsheet => "xlsx",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// Name shown in the save dialog's file-type filter.
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Spreadsheet => "Excel workbook",
        }
    }
}

/// Header line then one line per row, cells in their [`Display`](std::fmt::Display) form.
pub fn export_csv(table: &RecordTable) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Single-sheet `.xlsx` with a bold header row. Dates are written as real
/// spreadsheet dates, nulls as blank cells.
pub fn export_spreadsheet(table: &RecordTable, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, column) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, &column.name, &header_format)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let xl_row = r as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            let xl_col = col as u16;
            match value {
                CellValue::Text(s) => {
                    worksheet.write_string(xl_row, xl_col, s)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(xl_row, xl_col, *n)?;
                }
                CellValue::DateTime(dt) => {
                    let serial = excel_serial(*dt);
                    worksheet.write_number_with_format(xl_row, xl_col, serial, &date_format)?;
                }
                CellValue::Null => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Days since the 1900 date system epoch (valid from 1900-03-01 on).
pub(crate) fn excel_serial(dt: NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (dt - epoch).num_milliseconds() as f64 / 86_400_000.0
}

// ---------------------------------------------------------------------------
// Download artefacts
// ---------------------------------------------------------------------------

/// `<prefix>_<YYYYMMDD_HHMMSS>.<ext>`, stamped with the export moment.
pub fn export_filename(prefix: &str, format: ExportFormat, at: NaiveDateTime) -> String {
    format!(
        "{prefix}_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// A rendered download, ready to be written wherever the user chooses.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

/// Serialise `table` in `format`, naming the file after `at`.
pub fn render_export(
    table: &RecordTable,
    format: ExportFormat,
    rules: &ReportRules,
    at: NaiveDateTime,
) -> Result<ExportFile, ExportError> {
    let bytes = match format {
        ExportFormat::Csv => export_csv(table)?.into_bytes(),
        ExportFormat::Spreadsheet => export_spreadsheet(table, &rules.export_sheet_name)?,
    };
    let file_name = export_filename(&rules.export_prefix, format, at);
    log::info!("rendered {} ({} bytes, {} rows)", file_name, bytes.len(), table.len());
    Ok(ExportFile {
        file_name,
        format,
        bytes,
    })
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub rows: usize,
    /// Oldest and latest readable date, when the date column is present.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl ExportSummary {
    /// `YYYY-MM-DD to YYYY-MM-DD`.
    pub fn date_range_label(&self) -> Option<String> {
        self.date_range.map(|(oldest, latest)| {
            format!("{} to {}", oldest.format("%Y-%m-%d"), latest.format("%Y-%m-%d"))
        })
    }
}

pub fn summarize(table: &RecordTable, date_column: &str) -> ExportSummary {
    let date_range = table.column_index(date_column).and_then(|index| {
        let mut dates = table
            .column_values(index)
            .filter_map(CellValue::as_datetime)
            .map(|dt| dt.date());
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    });

    ExportSummary {
        rows: table.len(),
        date_range,
    }
}
