//! Data module - tabular model, file loading, cleaning, and export

mod loader;
mod model;
mod processor;
mod writer;

pub use loader::{unique_header_names, DataLoader, FileFormat, LoaderError};
pub use model::{Cell, Column, Dataset, DatasetError};
pub use processor::{CleaningOptions, DataProcessor};
pub use writer::{
    ConversionTarget, DataWriter, DownloadArtifact, WriterError, CSV_CONTENT_TYPE,
    XLSX_CONTENT_TYPE,
};
