//! File Loader Module
//! Detects the upload format and parses CSV (Polars) or XLSX (calamine) bytes
//! into a [`Dataset`].

use super::model::{Cell, Column, Dataset};
use calamine::{Data, Reader, Xlsx};
use log::{debug, info};
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt::Display;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Text values read as missing, matching the usual spreadsheet NA spellings.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoaderError {
    #[error("Unsupported File Type: {0}")]
    UnsupportedFormat(String),
    #[error("Error reading file {file}: {reason}")]
    Parse { file: String, reason: String },
}

impl LoaderError {
    fn parse(file: &str, reason: impl Display) -> Self {
        LoaderError::Parse {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// Pick the format from the file name's extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, LoaderError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("xlsx") => Ok(FileFormat::Xlsx),
            Some(other) => Err(LoaderError::UnsupportedFormat(format!(".{other}"))),
            None => Err(LoaderError::UnsupportedFormat("(no extension)".to_string())),
        }
    }
}

/// Parses uploaded bytes into datasets.
pub struct DataLoader;

impl DataLoader {
    /// Detect the format from `file_name` and parse `bytes` with the matching reader.
    pub fn load(file_name: &str, bytes: &[u8]) -> Result<(FileFormat, Dataset), LoaderError> {
        let format = FileFormat::from_file_name(file_name)?;
        let dataset = match format {
            FileFormat::Csv => Self::load_csv(file_name, bytes)?,
            FileFormat::Xlsx => Self::load_xlsx(file_name, bytes)?,
        };
        info!(
            "Loaded {}: {} rows, {} columns",
            file_name,
            dataset.height(),
            dataset.width()
        );
        Ok((format, dataset))
    }

    /// Load CSV bytes. The first record is the header; column types are inferred
    /// here rather than by Polars so CSV and XLSX share the same cell rules.
    pub fn load_csv(file_name: &str, bytes: &[u8]) -> Result<Dataset, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(false)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()
            .map_err(|e| LoaderError::parse(file_name, e))?;

        if df.width() == 0 || df.height() == 0 {
            return Err(LoaderError::parse(file_name, "No columns to parse from file"));
        }

        let mut raw_columns: Vec<Vec<Option<String>>> = Vec::with_capacity(df.width());
        for col in df.get_columns() {
            let ca = col.str().map_err(|e| LoaderError::parse(file_name, e))?;
            raw_columns.push(ca.into_iter().map(|v| v.map(str::to_string)).collect());
        }

        let headers: Vec<String> = raw_columns
            .iter()
            .map(|col| col.first().cloned().flatten().unwrap_or_default())
            .collect();
        let names = unique_header_names(headers);

        // Blank lines come back as rows with every field null; skip them.
        let kept_rows: Vec<usize> = (1..df.height())
            .filter(|&row| raw_columns.iter().any(|col| col[row].is_some()))
            .collect();
        if kept_rows.len() + 1 < df.height() {
            debug!(
                "{}: skipped {} blank lines",
                file_name,
                df.height() - 1 - kept_rows.len()
            );
        }

        let columns: Vec<Column> = names
            .into_iter()
            .zip(raw_columns.iter())
            .map(|(name, raw)| {
                let fields: Vec<Option<String>> =
                    kept_rows.iter().map(|&row| raw[row].clone()).collect();
                Column::new(name, type_text_column(&fields))
            })
            .collect();

        debug!("{}: parsed {} CSV columns", file_name, columns.len());
        Dataset::with_height(columns, kept_rows.len()).map_err(|e| LoaderError::parse(file_name, e))
    }

    /// Load the first worksheet of an XLSX workbook. Its first used row is the header.
    pub fn load_xlsx(file_name: &str, bytes: &[u8]) -> Result<Dataset, LoaderError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| LoaderError::parse(file_name, e))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LoaderError::parse(file_name, "workbook has no worksheets"))?
            .map_err(|e| LoaderError::parse(file_name, e))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            debug!("{}: first worksheet is empty", file_name);
            return Ok(Dataset::default());
        };

        let headers: Vec<String> = header_row
            .iter()
            .map(|d| excel_cell(d).to_string())
            .collect();
        let names = unique_header_names(headers);

        let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];
        let mut height = 0;
        for row in rows {
            for (idx, column) in cells.iter_mut().enumerate() {
                column.push(row.get(idx).map(excel_cell).unwrap_or(Cell::Missing));
            }
            height += 1;
        }

        let columns = names
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| Column::new(name, cells))
            .collect();

        Dataset::with_height(columns, height).map_err(|e| LoaderError::parse(file_name, e))
    }
}

/// Blank headers become `Unnamed: <idx>`; repeats get `.1`, `.2`, ... suffixes.
pub fn unique_header_names(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());
        names.push(candidate);
    }

    names
}

fn is_na_token(s: &str) -> bool {
    NA_TOKENS.contains(&s)
}

/// Type one CSV column: numeric only if every present field parses as a number.
/// Non-finite parses (`NAN`, `inf`, ...) count as missing.
fn type_text_column(raw: &[Option<String>]) -> Vec<Cell> {
    fn present(v: &Option<String>) -> Option<&str> {
        v.as_deref().filter(|s| !is_na_token(s))
    }

    let numeric = raw
        .iter()
        .filter_map(present)
        .all(|s| s.trim().parse::<f64>().is_ok());

    raw.iter()
        .map(|v| match present(v) {
            None => Cell::Missing,
            Some(s) if numeric => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Cell::Number)
                .unwrap_or(Cell::Missing),
            Some(s) => Cell::Text(s.to_string()),
        })
        .collect()
}

fn excel_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) if !f.is_finite() => Cell::Missing,
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if is_na_token(s) => Cell::Missing,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(when) => Cell::Text(when.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Text(dt.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}
