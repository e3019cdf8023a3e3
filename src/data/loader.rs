use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::error::LoadError;
use super::model::{parse_datetime, CellValue, RecordTable};
use crate::rules::ReportRules;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse an uploaded sales-by-product export into a [`RecordTable`].
///
/// The workbook format (`.xlsx`, `.xls`, `.xlsb`, `.ods`) is detected from the
/// content. Layout contract with the producing system:
///
/// * the data lives on the sheet named `rules.sheet_name`
/// * row `rules.header_row` (zero-based, absolute) holds the column names
/// * every following non-blank row is a record
pub fn load_report(bytes: Vec<u8>, rules: &ReportRules) -> Result<RecordTable, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| *name == rules.sheet_name) {
        return Err(LoadError::MissingSheet {
            sheet: rules.sheet_name.clone(),
            available,
        });
    }

    let range = workbook.worksheet_range(&rules.sheet_name)?;
    let missing_header = || LoadError::MissingHeader {
        sheet: rules.sheet_name.clone(),
        row: rules.header_row,
    };

    // NOTE: calamine ranges start at the first used cell, not at A1.
    let (start_row, start_col) = range.start().ok_or_else(missing_header)?;
    let skip = rules
        .header_row
        .checked_sub(start_row)
        .ok_or_else(missing_header)? as usize;

    let mut rows = range.rows().skip(skip);
    let header = rows.next().ok_or_else(missing_header)?;
    let names = column_names(header, start_col);

    let records: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_null()))
        .collect();

    log::debug!(
        "sheet `{}`: {} columns, {} records",
        rules.sheet_name,
        names.len(),
        records.len()
    );

    Ok(RecordTable::new(names, records))
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Name each header cell. Blank cells become `Unnamed: <col>`, repeated names
/// get `.1`, `.2`, ... suffixes so every column is addressable.
fn column_names(header: &[Data], start_col: u32) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();

    header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = match convert_cell(cell) {
                CellValue::Null => format!("Unnamed: {}", start_col as usize + i),
                value => value.to_string(),
            };
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            unique
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

fn convert_cell(value: &Data) -> CellValue {
    match value {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::export::excel_serial;
    use crate::data::model::ColumnType;
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;
    use rust_xlsxwriter::{Format, Workbook};

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    /// Workbook in the producer's layout: a title line, then the header row.
    fn report_bytes(sheet: &str) -> Vec<u8> {
        let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        ws.set_name(sheet).unwrap();
        ws.write_string(0, 0, "Sales By Product Report").unwrap();
        for (col, name) in ["Vendor Name", "AR Cost", "Product Name", "Date Created"]
            .iter()
            .enumerate()
        {
            ws.write_string(1, col as u16, *name).unwrap();
        }
        ws.write_string(2, 0, "Ceva Logistics").unwrap();
        ws.write_number(2, 1, 5.0).unwrap();
        ws.write_string(2, 2, "Motorola Edge").unwrap();
        ws.write_number_with_format(2, 3, excel_serial(dt("2024-03-05 14:30:00")), &date_format)
            .unwrap();

        ws.write_string(3, 0, "Other Vendor").unwrap();
        ws.write_number(3, 1, 0.0).unwrap();
        ws.write_string(3, 3, "2024-03-04 09:00:00").unwrap();

        // blank row is skipped
        ws.write_string(5, 0, "UPS").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn loads_header_from_second_row() {
        let table = load_report(report_bytes("Report_Output"), &ReportRules::default()).unwrap();

        assert_eq!(
            table.column_names(),
            vec!["Vendor Name", "AR Cost", "Product Name", "Date Created"]
        );
        assert_eq!(table.len(), 3);

        let first = &table.rows()[0];
        assert_eq!(first[0], CellValue::from("Ceva Logistics"));
        assert_eq!(first[1], CellValue::Number(5.0));
        let created = first[3].as_datetime().unwrap();
        assert_eq!((created - dt("2024-03-05 14:30:00")).num_seconds(), 0);

        let second = &table.rows()[1];
        assert_eq!(second[2], CellValue::Null);
        assert_eq!(second[3], CellValue::from("2024-03-04 09:00:00"));

        assert_eq!(table.rows()[2][0], CellValue::from("UPS"));

        let types: Vec<ColumnType> = table.columns().iter().map(|c| c.ty).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Text,
                ColumnType::Number,
                ColumnType::Text,
                ColumnType::Mixed
            ]
        );
    }

    #[test]
    fn missing_sheet_lists_available_sheets() {
        let err = load_report(report_bytes("Sheet1"), &ReportRules::default()).unwrap_err();
        match err {
            LoadError::MissingSheet { sheet, available } => {
                assert_eq!(sheet, "Report_Output");
                assert_eq!(available, vec!["Sheet1".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sheet_without_header_row_is_rejected() {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        ws.set_name("Report_Output").unwrap();
        ws.write_string(4, 0, "late data").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let err = load_report(bytes, &ReportRules::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader { row: 1, .. }), "{err}");
    }

    #[test]
    fn garbage_bytes_are_a_load_error() {
        let err = load_report(b"definitely not a workbook".to_vec(), &ReportRules::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Spreadsheet(_)), "{err}");
    }

    #[test]
    fn blank_and_repeated_headers_get_unique_names() {
        let header = vec![
            Data::String("Tracking #".into()),
            Data::Empty,
            Data::String("Tracking #".into()),
            Data::Float(2024.0),
        ];
        assert_eq!(
            column_names(&header, 0),
            vec!["Tracking #", "Unnamed: 1", "Tracking #.1", "2024"]
        );
    }
}
