//! Spreadsheet files (`.xlsx`, `.xls`), read with calamine.
//!
//! Only the first sheet is used. For the raw preview the sheet is rendered
//! as `;`-separated text so the start-line picker works the same way as for
//! CSV files.

use super::{split_lines, FilePreview};
use crate::error::AppError;
use crate::file_store::TempFileMeta;
use calamine::{open_workbook_auto, Data, Range, Reader};
use common::model::table::ParsedTable;
use std::collections::HashMap;

pub(super) fn preview(
    meta: &TempFileMeta,
    file_id: &str,
    max_lines: usize,
) -> Result<FilePreview, AppError> {
    let (sheet_names, range) = open_first_sheet(meta, file_id)?;

    // Render like a `;`-separated export, trailing newline included, so the
    // line count matches the text-file code path.
    let mut content = String::new();
    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();
        content.push_str(&cells.join(";"));
        content.push('\n');
    }

    let lines = split_lines(&content);
    let total_lines = lines.len();
    Ok(FilePreview {
        lines: lines.into_iter().take(max_lines).collect(),
        total_lines,
        is_excel: true,
        sheet_names: Some(sheet_names),
    })
}

pub(super) fn parse(
    meta: &TempFileMeta,
    file_id: &str,
    start_line: usize,
) -> Result<ParsedTable, AppError> {
    let (_, range) = open_first_sheet(meta, file_id)?;

    let mut rows_iter = range.rows().skip(start_line);
    let headers: Vec<String> = match rows_iter.next() {
        Some(row) => row
            .iter()
            .map(|cell| cell_to_string(cell).trim().to_string())
            .collect(),
        None => return Ok(ParsedTable::empty(None)),
    };

    let mut rows: Vec<HashMap<String, String>> = Vec::new();
    for row in rows_iter {
        let mut record = HashMap::with_capacity(headers.len());
        for (i, name) in headers.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            record.insert(
                name.clone(),
                row.get(i).map(cell_to_string).unwrap_or_default(),
            );
        }
        rows.push(record);
    }

    // Columns are the keys of the produced rows; a sheet with no data rows
    // reports no columns.
    let columns = if rows.is_empty() {
        Vec::new()
    } else {
        let mut columns = Vec::with_capacity(headers.len());
        for name in headers {
            if !name.is_empty() && !columns.contains(&name) {
                columns.push(name);
            }
        }
        columns
    };

    Ok(ParsedTable {
        columns,
        rows,
        separator: None,
    })
}

fn open_first_sheet(
    meta: &TempFileMeta,
    file_id: &str,
) -> Result<(Vec<String>, Range<Data>), AppError> {
    if !meta.path.exists() {
        return Err(AppError::not_found("File", file_id));
    }

    let mut workbook = open_workbook_auto(&meta.path)
        .map_err(|e| AppError::Internal(format!("Failed to open spreadsheet: {e}")))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| AppError::Validation("Spreadsheet has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| AppError::Internal(format!("Failed to read sheet '{first}': {e}")))?;

    Ok((sheet_names, range))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Integral floats render without the decimal point, like a
            // spreadsheet displays them.
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}
