//! Delimiter-separated text files.
//!
//! The whole file is read into memory, split on line boundaries, and the
//! remainder after the chosen start line is fed to the `csv` reader with the
//! first line as headers. Malformed rows are a diagnostic, not a failure:
//! the parse returns whatever rows the reader produced.

use super::{detect_separator, split_lines, FilePreview, Separator};
use crate::error::AppError;
use crate::file_store::TempFileMeta;
use common::model::table::ParsedTable;
use log::warn;
use std::collections::HashMap;

pub(super) fn preview(
    meta: &TempFileMeta,
    file_id: &str,
    max_lines: usize,
) -> Result<FilePreview, AppError> {
    let lines = read_lines(meta, file_id)?;
    let total_lines = lines.len();
    Ok(FilePreview {
        lines: lines.into_iter().take(max_lines).collect(),
        total_lines,
        is_excel: false,
        sheet_names: None,
    })
}

pub(super) fn parse(
    meta: &TempFileMeta,
    file_id: &str,
    start_line: usize,
    separator: Separator,
) -> Result<ParsedTable, AppError> {
    let lines = read_lines(meta, file_id)?;
    let remaining = lines.get(start_line..).unwrap_or(&[]);

    let delimiter = match separator {
        Separator::Auto => detect_separator(remaining),
        Separator::Char(c) => c,
    };

    let content = remaining.join("\n");
    if content.trim().is_empty() {
        return Ok(ParsedTable::empty(Some(delimiter)));
    }

    Ok(parse_records(&content, delimiter))
}

fn read_lines(meta: &TempFileMeta, file_id: &str) -> Result<Vec<String>, AppError> {
    let bytes = std::fs::read(&meta.path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found("File", file_id)
        } else {
            AppError::from(e)
        }
    })?;
    Ok(split_lines(&String::from_utf8_lossy(&bytes)))
}

fn parse_records(content: &str, delimiter: char) -> ParsedTable {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|name| name.trim().to_string()).collect(),
        Err(e) => {
            warn!("CSV header parse warning: {e}");
            return ParsedTable::empty(Some(delimiter));
        }
    };

    // Duplicate header names keep their first slot in the column list; the
    // later cell wins inside the row map.
    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for name in &headers {
        if columns.contains(name) {
            warn!("Duplicate column '{name}' in parsed file");
        } else {
            columns.push(name.clone());
        }
    }

    let mut rows = Vec::new();
    let mut malformed = 0usize;
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                malformed += 1;
                if malformed <= 5 {
                    warn!("CSV parse warning: {e}");
                }
                continue;
            }
        };

        let mut row = HashMap::with_capacity(columns.len());
        for (i, name) in headers.iter().enumerate() {
            row.insert(name.clone(), record.get(i).unwrap_or("").to_string());
        }
        rows.push(row);
    }
    if malformed > 0 {
        warn!("{malformed} malformed row(s) skipped");
    }

    ParsedTable {
        columns,
        rows,
        separator: Some(delimiter),
    }
}
