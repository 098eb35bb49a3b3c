//! File Processing Pipeline
//! Per-file flow: detect format → parse → preview → clean → select columns →
//! visualize → convert. Every file is handled on its own; a failure in one
//! never stops the next.

use crate::charts::Visualization;
use crate::config::SweeperConfig;
use crate::data::{
    CleaningOptions, ConversionTarget, DataLoader, DataProcessor, DataWriter, Dataset,
    DownloadArtifact, FileFormat, LoaderError, WriterError,
};
use log::{info, warn};
use std::path::Path;
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Writer(#[from] WriterError),
}

/// An uploaded file: its original name and raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Per-file settings supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOptions {
    pub cleaning: CleaningOptions,
    /// Columns to keep; `None` keeps all of them.
    pub selected_columns: Option<Vec<String>>,
    pub visualize: bool,
    /// Serialize to this format; `None` until the user asks for a conversion.
    pub convert_to: Option<ConversionTarget>,
}

/// A successfully parsed upload. The parsed dataset is never mutated; every
/// settings change is applied to a fresh copy.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub format: FileFormat,
    pub dataset: Dataset,
}

/// Dataset after cleaning and projection, plus the optional chart.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub dataset: Dataset,
    pub visualization: Option<Visualization>,
}

impl LoadedFile {
    pub fn load(upload: &UploadedFile) -> Result<Self, PipelineError> {
        let (format, dataset) = DataLoader::load(&upload.name, &upload.bytes)?;
        Ok(Self {
            name: upload.name.clone(),
            format,
            dataset,
        })
    }

    pub fn preview(&self, rows: usize) -> Dataset {
        self.dataset.head(rows)
    }

    /// Clean, project, and optionally chart a copy of the parsed dataset.
    pub fn apply(&self, options: &ProcessOptions, config: &SweeperConfig) -> ProcessedFile {
        let mut dataset = self.dataset.clone();
        DataProcessor::clean(&mut dataset, options.cleaning);
        if let Some(selected) = &options.selected_columns {
            DataProcessor::select_columns(&mut dataset, selected);
        }

        let visualization = options
            .visualize
            .then(|| Visualization::from_dataset(&dataset, config.chart_series));

        ProcessedFile {
            dataset,
            visualization,
        }
    }

    pub fn convert(
        &self,
        processed: &ProcessedFile,
        target: ConversionTarget,
    ) -> Result<DownloadArtifact, PipelineError> {
        Ok(DataWriter::convert(&self.name, &processed.dataset, target)?)
    }
}

/// Result record for one file.
#[derive(Debug)]
pub struct FileReport {
    pub file_name: String,
    pub preview: Option<Dataset>,
    pub visualization: Option<Visualization>,
    pub output: Option<DownloadArtifact>,
    pub error: Option<PipelineError>,
}

impl FileReport {
    fn failed(file_name: &str, error: PipelineError) -> Self {
        Self {
            file_name: file_name.to_string(),
            preview: None,
            visualization: None,
            output: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run the whole pipeline for one upload.
pub fn process_file(
    upload: &UploadedFile,
    options: &ProcessOptions,
    config: &SweeperConfig,
) -> FileReport {
    let loaded = match LoadedFile::load(upload) {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!("Skipping {}: {}", upload.name, e);
            return FileReport::failed(&upload.name, e);
        }
    };

    let preview = loaded.preview(config.preview_rows);
    let processed = loaded.apply(options, config);

    let (output, error) = match options.convert_to {
        Some(target) => match loaded.convert(&processed, target) {
            Ok(artifact) => (Some(artifact), None),
            Err(e) => {
                warn!("Conversion of {} failed: {}", upload.name, e);
                (None, Some(e))
            }
        },
        None => (None, None),
    };

    FileReport {
        file_name: upload.name.clone(),
        preview: Some(preview),
        visualization: processed.visualization,
        output,
        error,
    }
}

/// Progress after each file of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub file_name: String,
}

impl BatchProgress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

/// Parse uploads one at a time, in order, handing each result to `on_file`.
/// `pacing` is a cosmetic pause between files.
pub fn load_each<F>(files: &[UploadedFile], pacing: Duration, mut on_file: F)
where
    F: FnMut(BatchProgress, Result<LoadedFile, PipelineError>),
{
    let total = files.len();
    for (idx, upload) in files.iter().enumerate() {
        let result = LoadedFile::load(upload);
        if let Err(e) = &result {
            warn!("Skipping {}: {}", upload.name, e);
        }

        on_file(
            BatchProgress {
                completed: idx + 1,
                total,
                file_name: upload.name.clone(),
            },
            result,
        );

        if !pacing.is_zero() && idx + 1 < total {
            thread::sleep(pacing);
        }
    }
}

/// Run [`process_file`] over a batch in upload order.
pub fn process_batch<O, P>(
    files: &[UploadedFile],
    options_for: O,
    config: &SweeperConfig,
    mut on_progress: P,
) -> Vec<FileReport>
where
    O: Fn(&UploadedFile) -> ProcessOptions,
    P: FnMut(&BatchProgress),
{
    let total = files.len();
    let mut reports = Vec::with_capacity(total);

    for (idx, upload) in files.iter().enumerate() {
        reports.push(process_file(upload, &options_for(upload), config));
        on_progress(&BatchProgress {
            completed: idx + 1,
            total,
            file_name: upload.name.clone(),
        });

        if !config.pacing.is_zero() && idx + 1 < total {
            thread::sleep(config.pacing);
        }
    }

    let ok = reports.iter().filter(|r| r.is_ok()).count();
    info!("Processed {} of {} files", ok, total);
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, XLSX_CONTENT_TYPE};

    const SCENARIO_CSV: &[u8] = b"a,b,c\n1,,3\n1,,3\n4,5,6\n";

    fn config() -> SweeperConfig {
        SweeperConfig::unpaced()
    }

    #[test]
    fn unsupported_file_does_not_block_the_batch() {
        let files = vec![
            UploadedFile::new("data.txt", b"a,b\n1,2\n".to_vec()),
            UploadedFile::new("data.csv", b"a,b\n1,2\n".to_vec()),
        ];
        let mut seen = Vec::new();
        let reports = process_batch(
            &files,
            |_| ProcessOptions::default(),
            &config(),
            |p| seen.push(p.completed),
        );

        assert_eq!(seen, vec![1, 2]);
        assert!(matches!(
            reports[0].error,
            Some(PipelineError::Loader(LoaderError::UnsupportedFormat(ref ext))) if ext == ".txt"
        ));
        assert!(reports[0].preview.is_none());

        assert!(reports[1].is_ok());
        let preview = reports[1].preview.as_ref().unwrap();
        assert_eq!(preview.column_names(), vec!["a", "b"]);
        assert_eq!(preview.height(), 1);
    }

    #[test]
    fn parse_error_names_file_and_cause() {
        let upload = UploadedFile::new("bad.xlsx", b"not a workbook".to_vec());
        let report = process_file(&upload, &ProcessOptions::default(), &config());
        let message = report.error.unwrap().to_string();
        assert!(message.starts_with("Error reading file bad.xlsx:"));
    }

    #[test]
    fn preview_shows_first_five_rows() {
        let mut csv = String::from("n\n");
        for i in 0..12 {
            csv.push_str(&format!("{i}\n"));
        }
        let upload = UploadedFile::new("many.csv", csv.into_bytes());
        let report = process_file(&upload, &ProcessOptions::default(), &config());
        let preview = report.preview.unwrap();
        assert_eq!(preview.height(), 5);
        assert_eq!(preview.row(4), vec![&Cell::Number(4.0)]);
    }

    #[test]
    fn cleaning_scenario_dedups_then_fills() {
        let upload = UploadedFile::new("scenario.csv", SCENARIO_CSV.to_vec());
        let loaded = LoadedFile::load(&upload).unwrap();

        let dedup_only = ProcessOptions {
            cleaning: CleaningOptions {
                remove_duplicates: true,
                fill_missing: false,
            },
            ..Default::default()
        };
        let processed = loaded.apply(&dedup_only, &config());
        assert_eq!(processed.dataset.height(), 2);
        assert_eq!(processed.dataset.column("b").unwrap().missing_count(), 1);

        let both = ProcessOptions {
            cleaning: CleaningOptions {
                remove_duplicates: true,
                fill_missing: true,
            },
            ..Default::default()
        };
        let processed = loaded.apply(&both, &config());
        assert_eq!(
            processed.dataset.column("b").unwrap().values(),
            vec![Some(5.0), Some(5.0)]
        );

        // Re-stating the same settings has no further effect.
        assert_eq!(loaded.apply(&both, &config()).dataset, processed.dataset);
        assert_eq!(loaded.dataset.height(), 3);
    }

    #[test]
    fn converting_sales_csv_to_excel() {
        let upload = UploadedFile::new("sales.csv", b"region,amount\nnorth,10\nsouth,20\n".to_vec());
        let options = ProcessOptions {
            convert_to: Some(ConversionTarget::Excel),
            ..Default::default()
        };
        let report = process_file(&upload, &options, &config());
        let output = report.output.unwrap();
        assert_eq!(output.file_name, "sales.xlsx");
        assert_eq!(output.content_type, XLSX_CONTENT_TYPE);

        let reread = DataLoader::load_xlsx(&output.file_name, &output.bytes).unwrap();
        assert_eq!(reread.column_names(), vec!["region", "amount"]);
        assert_eq!(
            reread.column("amount").unwrap().values(),
            vec![Some(10.0), Some(20.0)]
        );
    }

    #[test]
    fn conversion_respects_column_selection() {
        let upload = UploadedFile::new("scenario.csv", SCENARIO_CSV.to_vec());
        let options = ProcessOptions {
            selected_columns: Some(vec!["c".into(), "a".into()]),
            convert_to: Some(ConversionTarget::Csv),
            ..Default::default()
        };
        let output = process_file(&upload, &options, &config()).output.unwrap();
        assert_eq!(output.file_name, "scenario.csv");
        assert_eq!(
            String::from_utf8(output.bytes).unwrap(),
            "a,c\n1,3\n1,3\n4,6\n"
        );
    }

    #[test]
    fn no_conversion_without_a_request() {
        let upload = UploadedFile::new("scenario.csv", SCENARIO_CSV.to_vec());
        let report = process_file(&upload, &ProcessOptions::default(), &config());
        assert!(report.output.is_none());
        assert!(report.visualization.is_none());
    }

    #[test]
    fn text_only_file_shows_no_data_notice() {
        let upload = UploadedFile::new("names.csv", b"first,last\nada,lovelace\n".to_vec());
        let options = ProcessOptions {
            visualize: true,
            ..Default::default()
        };
        let report = process_file(&upload, &options, &config());
        assert_eq!(report.visualization, Some(Visualization::NoNumericData));
    }

    #[test]
    fn header_only_file_shows_no_data_notice() {
        let upload = UploadedFile::new("blank.csv", b"a,b\n".to_vec());
        let options = ProcessOptions {
            visualize: true,
            ..Default::default()
        };
        let report = process_file(&upload, &options, &config());
        assert!(report.is_ok());
        assert_eq!(report.visualization, Some(Visualization::NoNumericData));
    }

    #[test]
    fn blank_lines_do_not_become_rows() {
        let upload = UploadedFile::new("gaps.csv", b"a,b\n1,2\n\n1,2\n\n".to_vec());
        let options = ProcessOptions {
            cleaning: CleaningOptions {
                remove_duplicates: true,
                fill_missing: false,
            },
            convert_to: Some(ConversionTarget::Csv),
            ..Default::default()
        };
        let output = process_file(&upload, &options, &config()).output.unwrap();
        assert_eq!(String::from_utf8(output.bytes).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn empty_selection_does_not_crash() {
        let upload = UploadedFile::new("scenario.csv", SCENARIO_CSV.to_vec());
        let options = ProcessOptions {
            selected_columns: Some(Vec::new()),
            visualize: true,
            convert_to: Some(ConversionTarget::Excel),
            ..Default::default()
        };
        let report = process_file(&upload, &options, &config());
        assert!(report.is_ok());
        assert_eq!(report.visualization, Some(Visualization::NoNumericData));
    }

    #[test]
    fn load_each_reports_every_file_in_order() {
        let files = vec![
            UploadedFile::new("one.csv", b"x\n1\n".to_vec()),
            UploadedFile::new("two.json", b"{}".to_vec()),
            UploadedFile::new("three.csv", b"y\n2\n".to_vec()),
        ];
        let mut results = Vec::new();
        load_each(&files, Duration::ZERO, |progress, result| {
            results.push((progress.file_name, progress.completed, result.is_ok()));
        });
        assert_eq!(
            results,
            vec![
                ("one.csv".to_string(), 1, true),
                ("two.json".to_string(), 2, false),
                ("three.csv".to_string(), 3, true),
            ]
        );
    }
}
