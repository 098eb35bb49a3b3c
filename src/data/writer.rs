//! Dataset Writer Module
//! Serializes a [`Dataset`] to CSV (Polars) or XLSX (direct ZIP/XML generation).
//!
//! Neither format carries a synthetic row-index column.

use super::model::{Cell, Column, Dataset};
use log::info;
use polars::prelude::{Column as FrameColumn, CsvWriter, DataFrame, PolarsError, SerWriter};
use std::io::{Cursor, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Worksheet name used for XLSX output.
const SHEET_NAME: &str = "Sheet1";

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Failed to write CSV: {0}")]
    Polars(#[from] PolarsError),
    #[error("Failed to build XLSX package: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format chosen for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionTarget {
    #[default]
    Csv,
    Excel,
}

impl ConversionTarget {
    pub const ALL: [ConversionTarget; 2] = [ConversionTarget::Csv, ConversionTarget::Excel];

    pub fn label(self) -> &'static str {
        match self {
            ConversionTarget::Csv => "CSV",
            ConversionTarget::Excel => "Excel",
        }
    }

    /// Canonical extension including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ConversionTarget::Csv => ".csv",
            ConversionTarget::Excel => ".xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ConversionTarget::Csv => CSV_CONTENT_TYPE,
            ConversionTarget::Excel => XLSX_CONTENT_TYPE,
        }
    }

    /// `sales.csv` becomes `sales.xlsx` for [`ConversionTarget::Excel`].
    pub fn output_file_name(self, original: &str) -> String {
        let stem = Path::new(original)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(original);
        format!("{stem}{}", self.extension())
    }
}

/// Serialized output ready to hand to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Writes datasets to in-memory buffers.
pub struct DataWriter;

impl DataWriter {
    /// Serialize `dataset` for `target` and name it after `original_name`.
    pub fn convert(
        original_name: &str,
        dataset: &Dataset,
        target: ConversionTarget,
    ) -> Result<DownloadArtifact, WriterError> {
        let bytes = match target {
            ConversionTarget::Csv => Self::to_csv_bytes(dataset)?,
            ConversionTarget::Excel => Self::to_xlsx_bytes(dataset)?,
        };
        let artifact = DownloadArtifact {
            file_name: target.output_file_name(original_name),
            content_type: target.content_type(),
            bytes,
        };
        info!(
            "Converted {} to {} ({} bytes)",
            original_name,
            artifact.file_name,
            artifact.bytes.len()
        );
        Ok(artifact)
    }

    /// CSV with a header row. A dataset without columns produces an empty buffer.
    pub fn to_csv_bytes(dataset: &Dataset) -> Result<Vec<u8>, WriterError> {
        if dataset.width() == 0 {
            return Ok(Vec::new());
        }

        let columns: Vec<FrameColumn> = dataset.columns().iter().map(Self::frame_column).collect();
        let mut df = DataFrame::new(columns)?;

        let mut buffer = Vec::new();
        CsvWriter::new(&mut buffer)
            .include_header(true)
            .finish(&mut df)?;
        Ok(buffer)
    }

    /// Whole-valued numeric columns become Int64, other numeric columns Float64,
    /// everything else String.
    fn frame_column(column: &Column) -> FrameColumn {
        let name = column.name.as_str().into();
        if column.is_integer_like() {
            let values: Vec<Option<i64>> = column
                .cells
                .iter()
                .map(|c| c.as_f64().map(|v| v as i64))
                .collect();
            FrameColumn::new(name, values)
        } else if column.is_numeric() {
            FrameColumn::new(name, column.values())
        } else {
            let values: Vec<Option<String>> = column
                .cells
                .iter()
                .map(|c| match c {
                    Cell::Missing => None,
                    other => Some(other.to_string()),
                })
                .collect();
            FrameColumn::new(name, values)
        }
    }

    /// Single-sheet XLSX workbook with a bold header row.
    pub fn to_xlsx_bytes(dataset: &Dataset) -> Result<Vec<u8>, WriterError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(Self::content_types_xml().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(Self::rels_xml().as_bytes())?;

        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(Self::core_props_xml().as_bytes())?;
        zip.start_file("docProps/app.xml", options)?;
        zip.write_all(Self::app_props_xml().as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(Self::workbook_xml().as_bytes())?;
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(Self::workbook_rels_xml().as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(Self::styles_xml().as_bytes())?;

        zip.start_file("xl/worksheets/sheet1.xml", options)?;
        zip.write_all(Self::sheet_xml(dataset).as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn sheet_xml(dataset: &Dataset) -> String {
        let mut rows = String::new();

        if dataset.width() > 0 {
            rows.push_str(r#"<row r="1">"#);
            for (col_idx, column) in dataset.columns().iter().enumerate() {
                rows.push_str(&inline_string_cell(
                    &cell_ref(col_idx, 1),
                    &column.name,
                    Some(1),
                ));
            }
            rows.push_str("</row>\n");
        }

        for row_idx in 0..dataset.height() {
            let row_num = row_idx + 2;
            rows.push_str(&format!(r#"<row r="{}">"#, row_num));
            for (col_idx, cell) in dataset.row(row_idx).into_iter().enumerate() {
                let reference = cell_ref(col_idx, row_num);
                match cell {
                    Cell::Number(v) if v.is_finite() => {
                        rows.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, v));
                    }
                    Cell::Number(v) => {
                        rows.push_str(&inline_string_cell(&reference, &v.to_string(), None));
                    }
                    Cell::Text(s) => rows.push_str(&inline_string_cell(&reference, s, None)),
                    Cell::Missing => {}
                }
            }
            rows.push_str("</row>\n");
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheetData>
{}</sheetData>
</worksheet>"#,
            rows
        )
    }

    fn content_types_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#
    }

    fn rels_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#
    }

    fn workbook_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
            SHEET_NAME
        )
    }

    fn workbook_rels_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#
    }

    /// Style 0 is the default cell, style 1 the bold header.
    fn styles_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs>
<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#
    }

    fn core_props_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>Data Sweeper</dc:creator>
<cp:lastModifiedBy>Data Sweeper</cp:lastModifiedBy>
</cp:coreProperties>"#
    }

    fn app_props_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
<Application>Data Sweeper</Application>
</Properties>"#
    }
}

fn inline_string_cell(reference: &str, text: &str, style: Option<u32>) -> String {
    let style_attr = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();
    format!(
        r#"<c r="{}" t="inlineStr"{}><is><t xml:space="preserve">{}</t></is></c>"#,
        reference,
        style_attr,
        escape_xml(text)
    )
}

/// `A1`-style reference for a zero-based column and one-based row.
fn cell_ref(col_idx: usize, row_num: usize) -> String {
    format!("{}{}", column_letters(col_idx), row_num)
}

/// Zero-based column index to spreadsheet letters: 0 → A, 25 → Z, 26 → AA.
fn column_letters(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Not representable in XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "city",
                vec![
                    Cell::Text("Lahore".into()),
                    Cell::Text("a<b & \"c\"".into()),
                    Cell::Missing,
                ],
            ),
            Column::new(
                "sales",
                vec![Cell::Number(10.0), Cell::Number(2.5), Cell::Missing],
            ),
            Column::new(
                "units",
                vec![Cell::Number(1.0), Cell::Number(2.0), Cell::Number(3.0)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn output_names_swap_extension() {
        assert_eq!(
            ConversionTarget::Excel.output_file_name("sales.csv"),
            "sales.xlsx"
        );
        assert_eq!(
            ConversionTarget::Csv.output_file_name("report.2024.xlsx"),
            "report.2024.csv"
        );
        assert_eq!(ConversionTarget::Csv.output_file_name("data.CSV"), "data.csv");
    }

    #[test]
    fn convert_tags_spreadsheet_content_type() {
        let artifact = DataWriter::convert("sales.csv", &sample(), ConversionTarget::Excel).unwrap();
        assert_eq!(artifact.file_name, "sales.xlsx");
        assert_eq!(artifact.content_type, XLSX_CONTENT_TYPE);
        assert_eq!(&artifact.bytes[..2], b"PK");
    }

    #[test]
    fn csv_has_header_and_no_index() {
        let bytes = DataWriter::to_csv_bytes(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("city,sales,units"));
        assert_eq!(lines.next(), Some("Lahore,10.0,1"));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn csv_round_trips_through_loader() {
        let original = sample();
        let bytes = DataWriter::to_csv_bytes(&original).unwrap();
        let reread = DataLoader::load_csv("out.csv", &bytes).unwrap();
        assert_eq!(reread, original);
    }

    #[test]
    fn xlsx_round_trips_through_loader() {
        let original = sample();
        let bytes = DataWriter::to_xlsx_bytes(&original).unwrap();
        let reread = DataLoader::load_xlsx("out.xlsx", &bytes).unwrap();
        assert_eq!(reread.column_names(), original.column_names());
        assert_eq!(reread.height(), original.height());
        assert_eq!(reread.column("city"), original.column("city"));
        assert_eq!(
            reread.column("sales").unwrap().values(),
            vec![Some(10.0), Some(2.5), None]
        );
    }

    #[test]
    fn empty_projection_writes_empty_csv() {
        let mut ds = sample();
        crate::data::DataProcessor::select_columns(&mut ds, &[]);
        assert!(DataWriter::to_csv_bytes(&ds).unwrap().is_empty());
        assert!(DataWriter::to_xlsx_bytes(&ds).is_ok());
    }

    #[test]
    fn column_letters_roll_over() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
        assert_eq!(escape_xml("bell\u{7}"), "bell");
    }
}
